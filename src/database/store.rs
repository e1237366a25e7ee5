use crate::error::Result;
use crate::models::{ActiveProxyFilters, Candidate, PoolStats, Proxy, ProxyProtocol, Verdict};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};

/// Internal ceiling on `iter_active`'s `limit`, independent of whatever
/// cap a caller (such as the API's query-string limit) applies on top.
const MAX_ACTIVE_LIMIT: i64 = 500;

/// Durable store for discovered proxies: candidate intake, validation
/// verdicts, and the filtered reads the API exposes.
#[derive(Clone)]
pub struct ProxyStore {
    pool: PgPool,
}

impl ProxyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Batch-insert freshly discovered candidates from one source.
    /// Conflicting (ip, port, protocol) tuples are left untouched: an
    /// existing row's validation history is never reset by rediscovery.
    pub async fn upsert_candidates(&self, source: &str, candidates: &[Candidate]) -> Result<u64> {
        let valid: Vec<&Candidate> = candidates.iter().filter(|c| c.is_valid()).collect();
        if valid.is_empty() {
            return Ok(0);
        }
        if valid.len() != candidates.len() {
            warn!(
                source = source,
                dropped = candidates.len() - valid.len(),
                "dropped invalid candidates"
            );
        }

        let ips: Vec<String> = valid.iter().map(|c| c.ip.clone()).collect();
        let ports: Vec<i32> = valid.iter().map(|c| c.port as i32).collect();
        let protocols: Vec<String> = valid.iter().map(|c| c.protocol.as_str().to_string()).collect();
        let countries: Vec<Option<String>> = valid.iter().map(|c| c.country.clone()).collect();
        let sources: Vec<&str> = valid.iter().map(|_| source).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO proxies (ip, port, protocol, country, source)
            SELECT * FROM UNNEST(
                $1::text[], $2::int[], $3::text[], $4::text[], $5::text[]
            ) AS t(ip, port, protocol, country, source)
            ON CONFLICT (ip, port, protocol) DO NOTHING
            "#,
        )
        .bind(&ips)
        .bind(&ports)
        .bind(&protocols)
        .bind(&countries)
        .bind(&sources)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected();
        info!(source = source, submitted = valid.len(), inserted, "upserted candidates");
        Ok(inserted)
    }

    /// Apply a validation verdict. Success resets the failure streak and
    /// promotes the proxy; failure only increments the streak. Eviction
    /// once the streak crosses the configured threshold happens in
    /// `cleanup_failed`, not here.
    pub async fn record_verdict(&self, verdict: &Verdict) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE proxies
            SET success_count = CASE WHEN $2 THEN success_count + 1 ELSE success_count END,
                fail_count = CASE WHEN $2 THEN 0 ELSE fail_count + 1 END,
                status = CASE WHEN $2 THEN 1 ELSE 2 END,
                speed = CASE WHEN $2 THEN $3 ELSE speed END,
                anonymity = CASE WHEN $2 THEN COALESCE($4, anonymity) ELSE anonymity END,
                last_checked = NOW(),
                last_success = CASE WHEN $2 THEN NOW() ELSE last_success END
            WHERE id = $1
            "#,
        )
        .bind(verdict.proxy_id)
        .bind(verdict.success)
        .bind(verdict.speed)
        .bind(verdict.anonymity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Proxies due for (re)validation: never checked, or failed but still
    /// under the failure threshold.
    pub async fn iter_pending(&self, limit: i64, max_fail_count: i32) -> Result<Vec<Proxy>> {
        let proxies = sqlx::query_as::<_, Proxy>(
            r#"
            SELECT * FROM proxies
            WHERE status = 0
               OR (status = 2 AND fail_count < $2)
            ORDER BY last_checked ASC NULLS FIRST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(max_fail_count)
        .fetch_all(&self.pool)
        .await?;

        Ok(proxies)
    }

    /// Proxies currently marked successful, ordered for re-check by
    /// staleness (oldest `last_checked` first).
    pub async fn iter_successful(&self, limit: i64) -> Result<Vec<Proxy>> {
        let proxies = sqlx::query_as::<_, Proxy>(
            r#"
            SELECT * FROM proxies
            WHERE status = 1
            ORDER BY last_checked ASC NULLS FIRST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(proxies)
    }

    /// Filtered read of currently-active (status = success) proxies for
    /// the public API.
    pub async fn iter_active(&self, filters: &ActiveProxyFilters, limit: i64) -> Result<Vec<Proxy>> {
        let limit = limit.clamp(1, MAX_ACTIVE_LIMIT);
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM proxies WHERE status = 1");

        if let Some(protocol) = filters.protocol.as_deref().filter(|s| !s.is_empty()) {
            if let Some(p) = ProxyProtocol::from_str(protocol) {
                query.push(" AND protocol = ").push_bind(p.as_str());
            }
        }
        if let Some(country) = filters.country.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND country = ").push_bind(country.to_uppercase());
        }
        if let Some(anonymity) = filters.anonymity.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND anonymity = ").push_bind(anonymity.to_lowercase());
        }

        query
            .push(" ORDER BY success_count DESC, speed ASC NULLS LAST LIMIT ")
            .push_bind(limit);

        let proxies: Vec<Proxy> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(proxies)
    }

    /// Evict proxies whose failure streak has crossed the threshold.
    pub async fn cleanup_failed(&self, max_fail_count: i32) -> Result<u64> {
        let result = sqlx::query("DELETE FROM proxies WHERE status = 2 AND fail_count >= $1")
            .bind(max_fail_count)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, "evicted proxies over the failure threshold");
        }
        Ok(deleted)
    }

    /// Evict proxies that have never succeeded and have sat idle for
    /// longer than `stale_days`.
    pub async fn cleanup_stale(&self, stale_days: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM proxies
            WHERE last_success IS NULL
              AND created_at < NOW() - ($1 || ' days')::interval
            "#,
        )
        .bind(stale_days.to_string())
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, "evicted stale proxies");
        }
        Ok(deleted)
    }

    /// Proxies missing a country label, for the country-lookup task.
    pub async fn proxies_without_country(&self, limit: i64) -> Result<Vec<(i64, String)>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, ip FROM proxies WHERE country IS NULL LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Bulk-assign resolved countries in a single round trip.
    pub async fn batch_set_country(&self, pairs: &[(i64, String)]) -> Result<u64> {
        if pairs.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = pairs.iter().map(|(id, _)| *id).collect();
        let countries: Vec<String> = pairs.iter().map(|(_, c)| c.clone()).collect();

        let result = sqlx::query(
            r#"
            UPDATE proxies AS p
            SET country = t.country
            FROM UNNEST($1::bigint[], $2::text[]) AS t(id, country)
            WHERE p.id = t.id
            "#,
        )
        .bind(&ids)
        .bind(&countries)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Aggregate counts for `GET /api/stats`.
    pub async fn stats(&self) -> Result<PoolStats> {
        let row: (i64, i64, i64, i64, i64, i64, Option<f64>, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 1),
                COUNT(*) FILTER (WHERE status = 2),
                COUNT(*) FILTER (WHERE status = 0),
                COUNT(DISTINCT protocol),
                COUNT(DISTINCT country),
                AVG(speed) FILTER (WHERE status = 1),
                COUNT(*) FILTER (WHERE anonymity = 'transparent'),
                COUNT(*) FILTER (WHERE anonymity = 'anonymous'),
                COUNT(*) FILTER (WHERE anonymity = 'elite')
            FROM proxies
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PoolStats {
            total: row.0,
            active: row.1,
            inactive: row.2,
            pending: row.3,
            protocols: row.4,
            countries: row.5,
            avg_speed: row.6,
            transparent: row.7,
            anonymous: row.8,
            elite: row.9,
        })
    }
}

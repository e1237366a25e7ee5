use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proxy protocol type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks4" => Some(ProxyProtocol::Socks4),
            "socks5" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }

    /// Scheme used to build the `scheme://ip:port` proxy URL reqwest
    /// expects, mirroring how the teacher built `Proxy::url()`.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http | ProxyProtocol::Https => "http",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

impl std::fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Proxy lifecycle status: PENDING → SUCCESS ↔ FAILED → evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "smallint")]
#[repr(i16)]
pub enum ProxyStatus {
    #[default]
    Pending = 0,
    Success = 1,
    Failed = 2,
}

impl ProxyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyStatus::Pending => "pending",
            ProxyStatus::Success => "success",
            ProxyStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anonymity classification, from most to least revealing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Anonymity {
    Transparent,
    Anonymous,
    Elite,
}

impl Anonymity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Anonymity::Transparent => "transparent",
            Anonymity::Anonymous => "anonymous",
            Anonymity::Elite => "elite",
        }
    }
}

impl std::fmt::Display for Anonymity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single persistent entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proxy {
    pub id: i64,
    pub ip: String,
    pub port: i32,
    pub protocol: ProxyProtocol,
    pub country: Option<String>,
    pub anonymity: Option<Anonymity>,
    pub source: String,
    pub speed: Option<f64>,
    pub success_count: i32,
    pub fail_count: i32,
    pub status: ProxyStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proxy {
    /// `scheme://ip:port` form used to route outbound requests through
    /// this proxy (sourced proxies are unauthenticated public proxies,
    /// so there are no embedded credentials).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.ip, self.port)
    }

    /// Success rate in [0, 1], derived at read time (not stored).
    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.fail_count;
        if total == 0 {
            0.0
        } else {
            self.success_count as f64 / total as f64
        }
    }

    /// Ranking derived from success rate, speed, and observation volume.
    /// Read-time only: the store does not order rows by this score.
    pub fn quality_score(&self, weights: &crate::config::ScoreWeights) -> f64 {
        let success_component = self.success_rate();

        let speed_component = match self.speed {
            Some(s) if s > 0.0 => (1.0 / (1.0 + s)).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        };

        let stability_component = {
            let total = self.success_count + self.fail_count;
            (total as f64 / (total as f64 + 10.0)).clamp(0.0, 1.0)
        };

        weights.success_rate * success_component
            + weights.speed * speed_component
            + weights.stability * stability_component
    }
}

/// A candidate proxy discovered by a source adapter, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub ip: String,
    pub port: u16,
    pub protocol: ProxyProtocol,
    pub country: Option<String>,
}

impl Candidate {
    /// Candidates that fail IP/port validation are dropped with a
    /// warning; they do not fail the adapter.
    pub fn is_valid(&self) -> bool {
        if self.ip.trim().is_empty() {
            return false;
        }
        if self.ip.parse::<std::net::IpAddr>().is_err() {
            return false;
        }
        if self.port == 0 {
            return false;
        }
        true
    }
}

/// One verdict produced by the validator for a single input proxy.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub proxy_id: i64,
    pub success: bool,
    pub speed: Option<f64>,
    pub anonymity: Option<Anonymity>,
}

/// Aggregate result of a validator batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchVerdict {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<Verdict>,
}

/// Filters accepted by `iter_active` / `GET /api/proxies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveProxyFilters {
    pub protocol: Option<String>,
    pub country: Option<String>,
    pub anonymity: Option<String>,
}

/// Aggregate counts returned by `stats()` / `GET /api/stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub pending: i64,
    pub protocols: i64,
    pub countries: i64,
    pub avg_speed: Option<f64>,
    pub transparent: i64,
    pub anonymous: i64,
    pub elite: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreWeights;

    fn base_proxy() -> Proxy {
        Proxy {
            id: 1,
            ip: "203.0.113.5".to_string(),
            port: 8080,
            protocol: ProxyProtocol::Http,
            country: Some("US".to_string()),
            anonymity: None,
            source: "src-a".to_string(),
            speed: None,
            success_count: 0,
            fail_count: 0,
            status: ProxyStatus::Pending,
            last_checked: None,
            last_success: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_protocol_parsing_and_scheme() {
        assert_eq!(ProxyProtocol::from_str("HTTP"), Some(ProxyProtocol::Http));
        assert_eq!(ProxyProtocol::from_str("socks5"), Some(ProxyProtocol::Socks5));
        assert_eq!(ProxyProtocol::from_str("bogus"), None);

        assert_eq!(ProxyProtocol::Https.scheme(), "http");
        assert_eq!(ProxyProtocol::Socks5.scheme(), "socks5");
    }

    #[test]
    fn test_proxy_url() {
        let p = base_proxy();
        assert_eq!(p.url(), "http://203.0.113.5:8080");
    }

    #[test]
    fn test_success_rate() {
        let mut p = base_proxy();
        assert_eq!(p.success_rate(), 0.0);

        p.success_count = 7;
        p.fail_count = 3;
        assert!((p.success_rate() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_quality_score_in_bounds() {
        let weights = ScoreWeights {
            success_rate: 0.5,
            speed: 0.3,
            stability: 0.2,
        };
        let mut p = base_proxy();
        p.success_count = 20;
        p.fail_count = 2;
        p.speed = Some(0.3);

        let score = p.quality_score(&weights);
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn test_candidate_validation() {
        let good = Candidate {
            ip: "198.51.100.2".into(),
            port: 3128,
            protocol: ProxyProtocol::Http,
            country: None,
        };
        assert!(good.is_valid());

        let bad_ip = Candidate {
            ip: "not-an-ip".into(),
            port: 3128,
            protocol: ProxyProtocol::Http,
            country: None,
        };
        assert!(!bad_ip.is_valid());

        let bad_port = Candidate {
            ip: "198.51.100.2".into(),
            port: 0,
            protocol: ProxyProtocol::Http,
            country: None,
        };
        assert!(!bad_port.is_valid());
    }
}

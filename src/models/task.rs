use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-task execution state, persisted in the coordination cache as a
/// hash (`task:stats:{name}`, TTL ~24h). Never given a `sqlx::FromRow`
/// impl: this is cache-only bookkeeping, not durable state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskState {
    pub name: String,
    pub execution_count: u64,
    pub failure_count: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub execution_time_ms: Option<u64>,
}

impl TaskState {
    pub fn new(name: impl Into<String>) -> Self {
        TaskState {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record a run outcome and advance the bookkeeping counters.
    pub fn record_run(&mut self, success: bool, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) {
        self.execution_count += 1;
        if !success {
            self.failure_count += 1;
        }
        self.last_run = Some(started_at);
        self.execution_time_ms = Some((finished_at - started_at).num_milliseconds().max(0) as u64);
    }

    /// Serialize into the flat `field -> value` pairs a Redis hash stores.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name".to_string(), self.name.clone()),
            ("execution_count".to_string(), self.execution_count.to_string()),
            ("failure_count".to_string(), self.failure_count.to_string()),
        ];
        if let Some(last_run) = self.last_run {
            fields.push(("last_run".to_string(), last_run.to_rfc3339()));
        }
        if let Some(next_run) = self.next_run {
            fields.push(("next_run".to_string(), next_run.to_rfc3339()));
        }
        if let Some(ms) = self.execution_time_ms {
            fields.push(("execution_time_ms".to_string(), ms.to_string()));
        }
        fields
    }

    /// Reconstruct from a Redis hash's `field -> value` pairs. Missing or
    /// unparseable fields fall back to defaults rather than failing the
    /// whole read: cache bookkeeping is best-effort.
    pub fn from_fields(name: &str, fields: &std::collections::HashMap<String, String>) -> Self {
        TaskState {
            name: name.to_string(),
            execution_count: fields
                .get("execution_count")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            failure_count: fields
                .get("failure_count")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            last_run: fields
                .get("last_run")
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            next_run: fields
                .get("next_run")
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            execution_time_ms: fields.get("execution_time_ms").and_then(|v| v.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_run_updates_counters() {
        let mut state = TaskState::new("crawl");
        let start = Utc::now();
        let end = start + Duration::milliseconds(250);

        state.record_run(true, start, end);
        assert_eq!(state.execution_count, 1);
        assert_eq!(state.failure_count, 0);
        assert_eq!(state.execution_time_ms, Some(250));

        state.record_run(false, start, end);
        assert_eq!(state.execution_count, 2);
        assert_eq!(state.failure_count, 1);
    }

    #[test]
    fn test_fields_roundtrip() {
        let mut state = TaskState::new("validate_pending");
        let start = Utc::now();
        state.record_run(true, start, start + Duration::milliseconds(40));
        state.next_run = Some(start + Duration::seconds(300));

        let fields: std::collections::HashMap<String, String> =
            state.to_fields().into_iter().collect();
        let restored = TaskState::from_fields("validate_pending", &fields);

        assert_eq!(restored.execution_count, state.execution_count);
        assert_eq!(restored.failure_count, state.failure_count);
        assert_eq!(restored.execution_time_ms, state.execution_time_ms);
        assert!(restored.last_run.is_some());
        assert!(restored.next_run.is_some());
    }

    #[test]
    fn test_from_fields_missing_data_defaults() {
        let empty = std::collections::HashMap::new();
        let state = TaskState::from_fields("unknown_task", &empty);
        assert_eq!(state.execution_count, 0);
        assert_eq!(state.failure_count, 0);
        assert!(state.last_run.is_none());
    }
}

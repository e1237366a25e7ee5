//! Scheduled task status endpoint

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::server::AppState;
use crate::models::TaskState;
use crate::scheduler::JOB_NAMES;

/// `GET /api/tasks` — last-run bookkeeping for every registered
/// scheduled job, read straight from the coordination cache.
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    let mut tasks = Vec::with_capacity(JOB_NAMES.len());

    for name in JOB_NAMES {
        let key = format!("task:stats:{name}");
        let fields = state.cache.read_hash(&key).await;
        tasks.push(TaskState::from_fields(name, &fields));
    }

    Json(serde_json::json!({
        "success": true,
        "data": tasks,
    }))
}

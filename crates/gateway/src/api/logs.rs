//! Execution log inspection: `/v1/logs`.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct LogsQuery {
    limit: Option<usize>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<LogsQuery>) -> impl IntoResponse {
    let logs = state.store.logs();
    match query.limit {
        Some(limit) if limit < logs.len() => {
            Json(logs[logs.len() - limit..].to_vec())
        }
        _ => Json(logs),
    }
}

pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    state.store.clear_logs();
    Json(serde_json::json!({ "cleared": true }))
}

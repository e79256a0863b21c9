//! Structural summary of the rule table: `/v1/stats`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use scenariod_domain::RuleStats;

use crate::state::AppState;

pub async fn get(State(state): State<AppState>) -> impl IntoResponse {
    Json(RuleStats::compute(&state.store.rules.list()))
}

//! Unmatched-trigger inspection and suggestion derivation:
//! `/v1/unmatched`, `/v1/suggestions`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use scenariod_protocol::SuggestionsResponse;

use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.unmatched())
}

pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    state.store.clear_unmatched();
    Json(serde_json::json!({ "cleared": true }))
}

pub async fn suggestions(State(state): State<AppState>) -> impl IntoResponse {
    Json(SuggestionsResponse {
        suggestions: state.store.suggestions(),
    })
}

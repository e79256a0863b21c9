//! Rule-engine configuration: `/v1/config`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use scenariod_domain::Config;

use crate::errors::ApiResult;
use crate::state::AppState;

pub async fn get(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.config())
}

pub async fn update(
    State(state): State<AppState>,
    Json(config): Json<Config>,
) -> ApiResult<impl IntoResponse> {
    state.store.set_config(config.clone())?;
    Ok(Json(config))
}

#[derive(serde::Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub error: Option<String>,
}

/// Validates a config without applying it. Never touches the store.
pub async fn validate(Json(config): Json<Config>) -> impl IntoResponse {
    match config.validate() {
        Ok(()) => Json(ValidateResponse { valid: true, error: None }),
        Err(e) => Json(ValidateResponse { valid: false, error: Some(e.to_string()) }),
    }
}

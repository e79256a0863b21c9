//! Rule CRUD: `/v1/scenarios`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use scenariod_domain::{Error, Rule};
use scenariod_protocol::WsEvent;

use crate::errors::ApiResult;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.rules.list())
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let rule = state
        .store
        .rules
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("no rule with id {id}")))?;
    Ok(Json(rule))
}

pub async fn create(
    State(state): State<AppState>,
    Json(rule): Json<Rule>,
) -> ApiResult<impl IntoResponse> {
    state.store.rules.upsert(rule.clone())?;
    state.store.broadcast(WsEvent::RulesUpdate {
        rules: state.store.rules.list(),
    });
    Ok(Json(rule))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut rule): Json<Rule>,
) -> ApiResult<impl IntoResponse> {
    rule.id = id;
    state.store.rules.upsert(rule.clone())?;
    state.store.broadcast(WsEvent::RulesUpdate {
        rules: state.store.rules.list(),
    });
    Ok(Json(rule))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let removed = state.store.rules.remove(&id)?;
    if !removed {
        return Err(Error::NotFound(format!("no rule with id {id}")).into());
    }
    state.store.broadcast(WsEvent::RulesUpdate {
        rules: state.store.rules.list(),
    });
    Ok(Json(serde_json::json!({ "removed": true })))
}

pub async fn bulk_replace(
    State(state): State<AppState>,
    Json(rules): Json<Vec<Rule>>,
) -> ApiResult<impl IntoResponse> {
    state.store.rules.replace_all(rules.clone())?;
    state.store.broadcast(WsEvent::ScenariosBulkUpdate { rules });
    Ok(Json(state.store.rules.list()))
}

pub async fn clear_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.store.rules.clear()?;
    state.store.broadcast(WsEvent::ScenariosCleared);
    Ok(Json(serde_json::json!({ "cleared": true })))
}

#[derive(serde::Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

/// Validates a rule in isolation, without touching the store. Never fails
/// the request on an invalid rule: `valid: false` plus the error is the
/// normal response shape.
pub async fn validate(Json(rule): Json<Rule>) -> impl IntoResponse {
    match rule.validate() {
        Ok(()) => Json(ValidateResponse {
            valid: true,
            error: None,
            warnings: rule.warnings(),
        }),
        Err(e) => Json(ValidateResponse {
            valid: false,
            error: Some(e.to_string()),
            warnings: rule.warnings(),
        }),
    }
}

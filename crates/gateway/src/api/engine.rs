//! Engine status, trigger ingestion and dry-run simulation:
//! `/v1/engine/status`, `/v1/engine/trigger`, `/v1/engine/simulate`,
//! `/v1/engine/reload`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use scenariod_domain::fingerprint::{self, Clock, FingerprintParts};
use scenariod_protocol::{SimulateRequest, SimulateResponse, WsEvent};
use std::collections::HashMap;

use crate::errors::ApiResult;
use crate::ingress::TriggerRequest;
use crate::matcher;
use crate::rulestore::RuleStore;
use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.status())
}

/// Submit a real trigger into the engine's async loop (fire-and-forget,
/// matching the host-callback ingress contract — actions dispatch
/// asynchronously after this handler returns).
#[derive(serde::Deserialize)]
pub struct TriggerBody {
    pub room: String,
    #[serde(default)]
    pub observed_states: HashMap<String, String>,
    #[serde(default)]
    pub interaction_type: String,
}

pub async fn trigger(
    State(state): State<AppState>,
    Json(body): Json<TriggerBody>,
) -> impl IntoResponse {
    state.ingress.submit(TriggerRequest {
        room: body.room,
        observed_states: body.observed_states,
        interaction_type: body.interaction_type,
        at: None,
    });
    Json(serde_json::json!({ "accepted": true }))
}

/// Dry-run a trigger through the matcher without touching the dispatcher
/// or the execution log.
pub async fn simulate(
    State(state): State<AppState>,
    Json(req): Json<SimulateRequest>,
) -> ApiResult<impl IntoResponse> {
    let config = state.store.config();
    let canonical_room = config.canonical_room(&req.room);
    let bucket_minutes = config.system_settings.time_bucket_granularity.minutes();
    let now = req.at.unwrap_or_else(|| state.clock.now());
    let time_bucket = fingerprint::time_bucket(now, bucket_minutes)?;
    let day_type = req
        .day_type
        .unwrap_or_else(|| fingerprint::day_type(now).to_string());

    let mut flags = req.flags;
    flags.sort();

    let parts = FingerprintParts {
        room: canonical_room,
        time_bucket,
        day_type,
        flags,
        interaction_type: req.interaction_type,
    };

    let result = matcher::find_match(&state.store.rules, &parts, config.system_settings.fallback_enabled)?;

    let response = SimulateResponse {
        fingerprint: result.fingerprint.clone(),
        matched_rule: result.rule.clone(),
        fallback_depth: result.fallback_depth,
        candidates_tried: result.candidates_tried,
    };

    state.store.broadcast(WsEvent::ScenarioTest {
        fingerprint: result.fingerprint,
        matched_rule: result.rule,
        fallback_depth: result.fallback_depth,
    });

    Ok(Json(response))
}

/// Re-read `rules.json` and `config.json` from disk, replacing the live
/// in-memory state. Useful after an operator edits either file by hand.
pub async fn reload(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let reloaded_rules = RuleStore::load(state.server_config.rules_path.clone())?;
    state.store.rules.replace_all(reloaded_rules.list())?;

    let reloaded_config =
        crate::shared_store::SharedStore::load_config_from_disk(&state.server_config.config_path)?;
    state.store.set_config(reloaded_config)?;

    state.store.broadcast(WsEvent::EngineReload);
    Ok(Json(serde_json::json!({ "reloaded": true })))
}

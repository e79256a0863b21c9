//! Control-plane wire protocol: the WebSocket event envelope and the REST
//! request/response bodies shared between the gateway and its clients
//! (dashboards, the simulation CLI, external automation).

use scenariod_domain::{Config, EngineStatus, Rule, Suggestion, UnmatchedRecord};
use serde::{Deserialize, Serialize};

/// One entry in the bounded execution log the shared store keeps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub fingerprint: String,
    pub room: String,
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    pub matched: bool,
    pub actions_executed: usize,
    pub error: Option<String>,
}

/// Server → client and client → server events multiplexed over the single
/// `/ws` connection. Tagged on `type` so the envelope self-describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    /// Sent once, immediately after the socket is accepted.
    #[serde(rename = "init")]
    Init { server_version: String },

    /// Full state snapshot, sent on request or right after `init`.
    #[serde(rename = "current_state")]
    CurrentState {
        status: EngineStatus,
        rules: Vec<Rule>,
        config: Config,
    },

    #[serde(rename = "ping")]
    Ping { timestamp: i64 },

    #[serde(rename = "pong")]
    Pong { timestamp: i64 },

    /// Client → server: request a `current_state` push.
    #[serde(rename = "get_current_state")]
    GetCurrentState,

    #[serde(rename = "rules_update")]
    RulesUpdate { rules: Vec<Rule> },

    #[serde(rename = "config_update")]
    ConfigUpdate { config: Config },

    #[serde(rename = "status_update")]
    StatusUpdate { status: EngineStatus },

    #[serde(rename = "log_update")]
    LogUpdate { entry: LogEntry },

    #[serde(rename = "unmatched_scenario")]
    UnmatchedScenario { record: UnmatchedRecord },

    #[serde(rename = "scenarios_bulk_update")]
    ScenariosBulkUpdate { rules: Vec<Rule> },

    #[serde(rename = "scenarios_cleared")]
    ScenariosCleared,

    /// A dry-run match result, pushed in response to a simulated trigger.
    #[serde(rename = "scenario_test")]
    ScenarioTest {
        fingerprint: String,
        matched_rule: Option<Rule>,
        fallback_depth: Option<usize>,
    },

    #[serde(rename = "engine_reload")]
    EngineReload,
}

/// Request body for `POST /engine/simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateRequest {
    pub room: String,
    #[serde(default)]
    pub day_type: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub interaction_type: String,
    #[serde(default)]
    pub at: Option<chrono::NaiveDateTime>,
}

/// Response body for `POST /engine/simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub fingerprint: String,
    pub matched_rule: Option<Rule>,
    pub fallback_depth: Option<usize>,
    pub candidates_tried: Vec<String>,
}

/// Response body for `GET /suggestions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// A generic `{error, detail}` body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

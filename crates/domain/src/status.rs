//! Engine status snapshot, exposed over the control plane as `status_update`
//! events and the `/engine/status` endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineStatus {
    pub running: bool,
    pub simulation_mode: bool,
    pub rule_count: usize,
    pub enabled_rule_count: usize,
    pub triggers_processed: u64,
    pub matches_found: u64,
    pub unmatched_count: u64,
    pub dispatch_errors: u64,
    pub started_at: Option<String>,
    pub last_trigger_at: Option<String>,
}

impl Default for EngineStatus {
    fn default() -> Self {
        EngineStatus {
            running: false,
            simulation_mode: false,
            rule_count: 0,
            enabled_rule_count: 0,
            triggers_processed: 0,
            matches_found: 0,
            unmatched_count: 0,
            dispatch_errors: 0,
            started_at: None,
            last_trigger_at: None,
        }
    }
}

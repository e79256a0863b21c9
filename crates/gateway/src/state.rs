//! Shared application state passed to every API handler.

use std::sync::Arc;

use scenariod_domain::fingerprint::Clock;

use crate::config::ServerConfig;
use crate::ingress::TriggerIngress;
use crate::shared_store::SharedStore;

#[derive(Clone)]
pub struct AppState {
    pub server_config: Arc<ServerConfig>,
    pub store: Arc<SharedStore>,
    pub ingress: TriggerIngress,
    pub clock: Arc<dyn Clock>,
}

//! AppState construction and background-task spawning, extracted from
//! `main.rs` so the `serve` and `simulate` CLI commands can share it
//! without both needing to bind an HTTP listener.

use std::sync::Arc;

use anyhow::Context;

use scenariod_domain::fingerprint::SystemClock;
use scenariod_domain::Config;

use crate::config::ServerConfig;
use crate::dispatcher::{Dispatcher, NoopBridge};
use crate::ingress::TriggerIngress;
use crate::rulestore::RuleStore;
use crate::shared_store::SharedStore;
use crate::state::AppState;

/// Validate config, load the persisted rule table and rule-engine config,
/// and wire up a fully-formed [`AppState`]. Does not start the engine
/// loop or bind a listener — call [`spawn_engine_loop`] and the HTTP
/// server separately.
pub fn build_app_state(
    server_config: Arc<ServerConfig>,
) -> anyhow::Result<(AppState, tokio::sync::mpsc::UnboundedReceiver<crate::ingress::TriggerRequest>)> {
    let rules = Arc::new(
        RuleStore::load(server_config.rules_path.clone())
            .context("loading rules.json")?,
    );
    tracing::info!(count = rules.count(), "rule store ready");

    let rule_config = SharedStore::load_config_from_disk(&server_config.config_path)
        .context("loading config.json")?;
    tracing::info!(
        room_mappings = rule_config.room_mappings.len(),
        conditional_entities = rule_config.conditional_entities.len(),
        "rule-engine config ready"
    );

    let store = Arc::new(SharedStore::new(
        rules,
        rule_config,
        server_config.config_path.clone(),
    ));

    let (ingress, rx) = TriggerIngress::new();

    let state = AppState {
        server_config,
        store,
        ingress,
        clock: Arc::new(SystemClock),
    };
    Ok((state, rx))
}

/// Spawn the engine loop task that drains the trigger ingress channel.
/// Must be called with the receiver [`build_app_state`] returned alongside
/// this `AppState` — `AppState` itself only keeps the sender half.
pub fn spawn_engine_loop(
    rx: tokio::sync::mpsc::UnboundedReceiver<crate::ingress::TriggerRequest>,
    state: &AppState,
) {
    let store = state.store.clone();
    let clock = state.clock.clone();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(NoopBridge)));
    tokio::spawn(async move {
        crate::ingress::run_engine_loop(rx, store, dispatcher, clock).await;
    });
    tracing::info!("engine loop started");
}

/// Seed an empty `config.json` the first time the gateway runs against a
/// fresh data directory, so `GET /config` has something sane to return.
pub fn ensure_default_config(path: &std::path::Path) -> anyhow::Result<()> {
    if !path.exists() {
        crate::persist::write_json_atomic(path, &Config::default())
            .context("writing default config.json")?;
        tracing::info!(path = %path.display(), "seeded default config.json");
    }
    Ok(())
}

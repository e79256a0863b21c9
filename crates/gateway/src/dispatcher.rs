//! Action dispatch: turns a matched rule's actions into host service calls,
//! gated by the configured domain allow-list. A policy violation or a
//! failed host call is logged and skipped; it never aborts the remaining
//! actions in the rule.

use async_trait::async_trait;
use scenariod_domain::{Action, Config, Rule};
use std::sync::Arc;

/// Abstracts the host automation system (e.g. a smart-home hub) the
/// dispatcher calls into. Swappable so the engine can run against a real
/// host or a no-op bridge in simulation mode.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn call_service(&self, action: &Action) -> Result<(), String>;
}

/// Bridge used when `simulation_mode` is on: never actually calls the host,
/// always reports success.
pub struct NoopBridge;

#[async_trait]
impl HostBridge for NoopBridge {
    async fn call_service(&self, _action: &Action) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub actions_executed: usize,
    pub actions_skipped_policy: usize,
    pub errors: Vec<String>,
}

pub struct Dispatcher {
    bridge: Arc<dyn HostBridge>,
}

impl Dispatcher {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        Dispatcher { bridge }
    }

    /// Execute every action in `rule.actions` in order:
    /// 1. In test mode, log intent and never call the host.
    /// 2. Drop (policy violation) an action whose service call or entity id
    ///    fails validation.
    /// 3. Drop an action whose domain is not in `allowed_service_domains`.
    /// 4. Invoke the host bridge; a failure is logged and does not stop the
    ///    remaining actions.
    pub async fn dispatch(&self, rule: &Rule, config: &Config) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let test_mode = config.system_settings.simulation_mode;

        for action in &rule.actions {
            if test_mode {
                tracing::info!(
                    rule_id = %rule.id,
                    service = %action.service_call(),
                    entity_id = %action.entity_id,
                    "test mode: logging intended action, no host call made"
                );
                continue;
            }

            if let Err(e) = action.validate() {
                tracing::warn!(
                    rule_id = %rule.id,
                    error = %e,
                    "dropping action: failed service/entity_id validation"
                );
                outcome.actions_skipped_policy += 1;
                continue;
            }

            if !config
                .system_settings
                .allowed_service_domains
                .iter()
                .any(|d| d == &action.domain)
            {
                tracing::warn!(
                    rule_id = %rule.id,
                    domain = %action.domain,
                    "dropping action: domain not in allow-list"
                );
                outcome.actions_skipped_policy += 1;
                continue;
            }

            match self.bridge.call_service(action).await {
                Ok(()) => {
                    outcome.actions_executed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        service = %action.service_call(),
                        error = %e,
                        "action dispatch failed"
                    );
                    outcome.errors.push(e);
                }
            }
        }

        outcome
    }
}

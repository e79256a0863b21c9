//! Trigger ingress: the one place the host (or the simulation endpoint)
//! hands a raw event to the engine. `submit` is synchronous and
//! non-blocking so it can be called back from arbitrary host threads —
//! it only pushes onto an unbounded channel drained by the engine loop.

use crate::dispatcher::Dispatcher;
use crate::matcher;
use crate::shared_store::SharedStore;
use chrono::NaiveDateTime;
use scenariod_domain::fingerprint::{self, Clock, FingerprintParts};
use scenariod_protocol::LogEntry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A raw trigger as reported by the host: a room, the entity states it
/// observed at the time, and the interaction that occurred.
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub room: String,
    pub observed_states: HashMap<String, String>,
    pub interaction_type: String,
    /// Overrides the engine clock, used by the simulation endpoint to test
    /// a specific point in time without waiting for it.
    pub at: Option<NaiveDateTime>,
}

#[derive(Clone)]
pub struct TriggerIngress {
    tx: UnboundedSender<TriggerRequest>,
}

impl TriggerIngress {
    pub fn new() -> (Self, UnboundedReceiver<TriggerRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TriggerIngress { tx }, rx)
    }

    /// Enqueue a trigger for processing. Synchronous and infallible from the
    /// caller's point of view (it only fails if the engine loop has already
    /// shut down, which only happens at process exit).
    pub fn submit(&self, request: TriggerRequest) {
        if self.tx.send(request).is_err() {
            tracing::error!("trigger ingress channel closed — engine loop not running");
        }
    }
}

/// Drain the ingress channel and process triggers one at a time. Runs for
/// the lifetime of the process as a dedicated tokio task.
pub async fn run_engine_loop(
    mut rx: UnboundedReceiver<TriggerRequest>,
    store: Arc<SharedStore>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
) {
    while let Some(request) = rx.recv().await {
        process_trigger(&store, &dispatcher, clock.as_ref(), request).await;
    }
    tracing::warn!("engine loop exiting — trigger ingress channel closed");
}

async fn process_trigger(
    store: &SharedStore,
    dispatcher: &Dispatcher,
    clock: &dyn Clock,
    request: TriggerRequest,
) {
    store.note_trigger();
    let config = store.config();

    let now = request.at.unwrap_or_else(|| clock.now());
    let canonical_room = config.canonical_room(&request.room);
    let bucket_minutes = config.system_settings.time_bucket_granularity.minutes();

    let time_bucket = match fingerprint::time_bucket(now, bucket_minutes) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to compute time bucket; dropping trigger");
            return;
        }
    };

    let mut flags = config.active_flags(&request.observed_states);
    flags.sort();

    let parts = FingerprintParts {
        room: canonical_room.clone(),
        time_bucket,
        day_type: fingerprint::day_type(now).to_string(),
        flags,
        interaction_type: request.interaction_type.clone(),
    };

    let fallback_enabled = config.system_settings.fallback_enabled;
    let result = match matcher::find_match(&store.rules, &parts, fallback_enabled) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to build fingerprint; dropping trigger");
            return;
        }
    };

    let timestamp = chrono::Utc::now().to_rfc3339();

    match result.rule {
        Some(rule) => {
            store.stats.record_match();
            let outcome = dispatcher.dispatch(&rule, &config).await;
            if !outcome.errors.is_empty() {
                for _ in &outcome.errors {
                    store.stats.record_dispatch_error();
                }
            }
            if let Err(e) = store.rules.record_execution(&rule.id, &timestamp) {
                tracing::warn!(error = %e, "failed to persist rule execution count");
            }
            store.push_log(LogEntry {
                timestamp,
                fingerprint: result.fingerprint,
                room: canonical_room,
                rule_id: Some(rule.id.clone()),
                rule_name: Some(rule.name.clone()),
                matched: true,
                actions_executed: outcome.actions_executed,
                error: outcome.errors.first().cloned(),
            });
        }
        None => {
            store.push_unmatched(scenariod_domain::UnmatchedRecord {
                fingerprint: result.fingerprint.clone(),
                room: canonical_room.clone(),
                timestamp: timestamp.clone(),
            });
            store.push_log(LogEntry {
                timestamp,
                fingerprint: result.fingerprint,
                room: canonical_room,
                rule_id: None,
                rule_name: None,
                matched: false,
                actions_executed: 0,
                error: None,
            });
        }
    }

    store.broadcast(scenariod_protocol::WsEvent::StatusUpdate {
        status: store.status(),
    });
}

//! The coordination point every API handler and the engine loop reads
//! from and writes to: current config, bounded execution/unmatched logs,
//! running counters, and the WebSocket fan-out channel.

use crate::rulestore::RuleStore;
use chrono::Utc;
use parking_lot::RwLock;
use scenariod_domain::{Config, Error, Result, Stats, Suggestion, UnmatchedRecord};
use scenariod_protocol::LogEntry;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use scenariod_protocol::WsEvent;

pub struct SharedStore {
    pub rules: Arc<RuleStore>,
    config: RwLock<Config>,
    config_path: PathBuf,
    pub stats: Stats,
    logs: RwLock<VecDeque<LogEntry>>,
    unmatched: RwLock<VecDeque<UnmatchedRecord>>,
    started_at: String,
    last_trigger_at: RwLock<Option<String>>,
    events_tx: broadcast::Sender<WsEvent>,
}

impl SharedStore {
    pub fn new(rules: Arc<RuleStore>, config: Config, config_path: PathBuf) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        SharedStore {
            rules,
            config: RwLock::new(config),
            config_path,
            stats: Stats::default(),
            logs: RwLock::new(VecDeque::new()),
            unmatched: RwLock::new(VecDeque::new()),
            started_at: Utc::now().to_rfc3339(),
            last_trigger_at: RwLock::new(None),
            events_tx,
        }
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: Config) -> Result<()> {
        config.validate()?;
        crate::persist::write_json_atomic(&self.config_path, &config)?;
        *self.config.write() = config.clone();
        self.broadcast(WsEvent::ConfigUpdate { config });
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.events_tx.subscribe()
    }

    pub fn broadcast(&self, event: WsEvent) {
        // No subscribers is not an error; the event is simply dropped.
        let _ = self.events_tx.send(event);
    }

    pub fn status(&self) -> scenariod_domain::EngineStatus {
        self.stats.snapshot(
            true,
            self.rules.count(),
            self.rules.enabled_count(),
            Some(self.started_at.clone()),
            self.last_trigger_at.read().clone(),
        )
    }

    pub fn note_trigger(&self) {
        self.stats.record_trigger();
        *self.last_trigger_at.write() = Some(Utc::now().to_rfc3339());
    }

    /// Push a log entry, evicting the oldest if the bounded cap is exceeded.
    pub fn push_log(&self, entry: LogEntry) {
        let cap = self.config.read().system_settings.max_log_entries;
        {
            let mut logs = self.logs.write();
            logs.push_back(entry.clone());
            while logs.len() > cap {
                logs.pop_front();
            }
        }
        self.broadcast(WsEvent::LogUpdate { entry });
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.read().iter().cloned().collect()
    }

    pub fn clear_logs(&self) {
        self.logs.write().clear();
    }

    /// Record an unmatched trigger, evicting the oldest past the cap.
    pub fn push_unmatched(&self, record: UnmatchedRecord) {
        self.stats.record_unmatched();
        let cap = self.config.read().system_settings.max_unmatched_entries;
        {
            let mut unmatched = self.unmatched.write();
            unmatched.push_back(record.clone());
            while unmatched.len() > cap {
                unmatched.pop_front();
            }
        }
        self.broadcast(WsEvent::UnmatchedScenario { record });
    }

    pub fn unmatched(&self) -> Vec<UnmatchedRecord> {
        self.unmatched.read().iter().cloned().collect()
    }

    pub fn clear_unmatched(&self) {
        self.unmatched.write().clear();
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        let limit = self.config.read().system_settings.suggestion_count;
        let records: Vec<UnmatchedRecord> = self.unmatched.read().iter().cloned().collect();
        scenariod_domain::unmatched::derive_suggestions(&records, limit)
    }

    pub fn load_config_from_disk(config_path: &std::path::Path) -> Result<Config> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            Error::PersistenceFailure(format!("parsing {}: {e}", config_path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SharedStore) {
        let dir = tempfile::tempdir().unwrap();
        let rules = Arc::new(RuleStore::load(dir.path().join("rules.json")).unwrap());
        let store = SharedStore::new(rules, Config::default(), dir.path().join("config.json"));
        (dir, store)
    }

    #[test]
    fn log_ring_evicts_oldest_past_cap() {
        let (_dir, store) = store();
        store.set_config(Config {
            system_settings: scenariod_domain::SystemSettings {
                max_log_entries: 2,
                ..Default::default()
            },
            ..Config::default()
        }).unwrap();

        for i in 0..5 {
            store.push_log(LogEntry {
                timestamp: format!("t{i}"),
                fingerprint: "kitchen|08-09".into(),
                room: "kitchen".into(),
                rule_id: None,
                rule_name: None,
                matched: false,
                actions_executed: 0,
                error: None,
            });
        }
        let logs = store.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].timestamp, "t3");
        assert_eq!(logs[1].timestamp, "t4");
    }

    #[test]
    fn clear_logs_empties_the_ring() {
        let (_dir, store) = store();
        store.push_log(LogEntry {
            timestamp: "t0".into(),
            fingerprint: "kitchen|08-09".into(),
            room: "kitchen".into(),
            rule_id: None,
            rule_name: None,
            matched: false,
            actions_executed: 0,
            error: None,
        });
        assert_eq!(store.logs().len(), 1);
        store.clear_logs();
        assert!(store.logs().is_empty());
    }

    #[test]
    fn set_config_persists_and_is_visible_on_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let rules = Arc::new(RuleStore::load(dir.path().join("rules.json")).unwrap());
        let store = SharedStore::new(rules, Config::default(), config_path.clone());

        let mut new_config = Config::default();
        new_config.system_settings.simulation_mode = true;
        store.set_config(new_config).unwrap();

        let reloaded = SharedStore::load_config_from_disk(&config_path).unwrap();
        assert!(reloaded.system_settings.simulation_mode);
    }
}

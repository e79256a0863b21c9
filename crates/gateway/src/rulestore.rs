//! Persisted rule table: the fingerprint-to-actions mapping the matcher
//! consults. Writes are atomic (write-temp-then-rename) so a crash mid-save
//! never leaves a truncated rules file behind.

use parking_lot::RwLock;
use scenariod_domain::{Result, Rule};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct RuleStore {
    path: PathBuf,
    rules: RwLock<HashMap<String, Rule>>,
}

impl RuleStore {
    /// Load rules from `path` if it exists, otherwise start empty. The file
    /// is created on first save.
    pub fn load(path: PathBuf) -> Result<Self> {
        let rules = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let list: Vec<Rule> = serde_json::from_str(&raw)?;
            for rule in &list {
                rule.validate()?;
            }
            list.into_iter().map(|r| (r.id.clone(), r)).collect()
        } else {
            HashMap::new()
        };

        Ok(RuleStore {
            path,
            rules: RwLock::new(rules),
        })
    }

    pub fn list(&self) -> Vec<Rule> {
        self.rules.read().values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Rule> {
        self.rules.read().get(id).cloned()
    }

    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Option<Rule> {
        self.rules
            .read()
            .values()
            .find(|r| r.enabled && r.fingerprint == fingerprint)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.rules.read().len()
    }

    pub fn enabled_count(&self) -> usize {
        self.rules.read().values().filter(|r| r.enabled).count()
    }

    /// Insert or replace a rule by id, then persist.
    pub fn upsert(&self, rule: Rule) -> Result<()> {
        rule.validate()?;
        {
            let mut rules = self.rules.write();
            rules.insert(rule.id.clone(), rule);
        }
        self.persist()
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = {
            let mut rules = self.rules.write();
            rules.remove(id).is_some()
        };
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Replace the whole rule table at once (bulk import).
    pub fn replace_all(&self, rules: Vec<Rule>) -> Result<()> {
        for rule in &rules {
            rule.validate()?;
        }
        {
            let mut store = self.rules.write();
            *store = rules.into_iter().map(|r| (r.id.clone(), r)).collect();
        }
        self.persist()
    }

    pub fn clear(&self) -> Result<()> {
        {
            let mut rules = self.rules.write();
            rules.clear();
        }
        self.persist()
    }

    /// Bump `execution_count` and `last_executed` for a rule after a
    /// successful dispatch. No-op outside simulation when the rule
    /// disappeared mid-flight (e.g. deleted concurrently).
    pub fn record_execution(&self, id: &str, at: &str) -> Result<()> {
        {
            let mut rules = self.rules.write();
            if let Some(rule) = rules.get_mut(id) {
                rule.execution_count += 1;
                rule.last_executed = Some(at.to_string());
            }
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let rules: Vec<Rule> = self.rules.read().values().cloned().collect();
        crate::persist::write_json_atomic(&self.path, &rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenariod_domain::Action;

    fn sample_rule(id: &str, fingerprint: &str) -> Rule {
        Rule {
            id: id.to_string(),
            fingerprint: fingerprint.to_string(),
            name: "test rule".into(),
            description: String::new(),
            actions: vec![Action {
                domain: "light".into(),
                service: "turn_on".into(),
                entity_id: "light.kitchen_main".into(),
                data: serde_json::Map::new(),
            }],
            enabled: true,
            execution_count: 0,
            last_executed: None,
        }
    }

    #[test]
    fn upsert_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let store = RuleStore::load(path.clone()).unwrap();
        store.upsert(sample_rule("r1", "kitchen|08-09")).unwrap();

        let reloaded = RuleStore::load(path).unwrap();
        assert_eq!(reloaded.count(), 1);
        assert_eq!(
            reloaded.find_by_fingerprint("kitchen|08-09").unwrap().id,
            "r1"
        );
    }

    #[test]
    fn disabled_rule_is_not_returned_by_fingerprint_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::load(dir.path().join("rules.json")).unwrap();
        let mut rule = sample_rule("r1", "kitchen|08-09");
        rule.enabled = false;
        store.upsert(rule).unwrap();
        assert!(store.find_by_fingerprint("kitchen|08-09").is_none());
    }

    #[test]
    fn remove_missing_rule_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::load(dir.path().join("rules.json")).unwrap();
        assert!(!store.remove("missing").unwrap());
    }
}

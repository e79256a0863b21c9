//! Running counters accumulated by the shared coordination store over the
//! life of the process; `EngineStatus` is the point-in-time snapshot taken
//! from these.

use crate::rule::Rule;
use crate::status::EngineStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Structural summary of the rule table, recomputed whenever the table
/// changes. Distinct from the running counters below: this describes what
/// the rules *are*, not what the engine has *done*.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RuleStats {
    pub total_scenarios: usize,
    pub total_actions: usize,
    pub rooms: Vec<String>,
    pub time_buckets: Vec<String>,
    pub interaction_types: Vec<String>,
}

impl RuleStats {
    pub fn compute(rules: &[Rule]) -> Self {
        let mut rooms = BTreeSet::new();
        let mut time_buckets = BTreeSet::new();
        let mut interaction_types = BTreeSet::new();
        let mut total_actions = 0;

        for rule in rules {
            total_actions += rule.actions.len();
            let parts = crate::fingerprint::parse(&rule.fingerprint);
            if !parts.room.is_empty() {
                rooms.insert(parts.room);
            }
            if !parts.time_bucket.is_empty() {
                time_buckets.insert(parts.time_bucket);
            }
            if !parts.interaction_type.is_empty() {
                interaction_types.insert(parts.interaction_type);
            }
        }

        RuleStats {
            total_scenarios: rules.len(),
            total_actions,
            rooms: rooms.into_iter().collect(),
            time_buckets: time_buckets.into_iter().collect(),
            interaction_types: interaction_types.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub triggers_processed: AtomicU64,
    pub matches_found: AtomicU64,
    pub unmatched_count: AtomicU64,
    pub dispatch_errors: AtomicU64,
    pub simulation_mode: AtomicBool,
}

impl Stats {
    pub fn record_trigger(&self) {
        self.triggers_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmatched(&self) {
        self.unmatched_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_error(&self) {
        self.dispatch_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(
        &self,
        running: bool,
        rule_count: usize,
        enabled_rule_count: usize,
        started_at: Option<String>,
        last_trigger_at: Option<String>,
    ) -> EngineStatus {
        EngineStatus {
            running,
            simulation_mode: self.simulation_mode.load(Ordering::Relaxed),
            rule_count,
            enabled_rule_count,
            triggers_processed: self.triggers_processed.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            unmatched_count: self.unmatched_count.load(Ordering::Relaxed),
            dispatch_errors: self.dispatch_errors.load(Ordering::Relaxed),
            started_at,
            last_trigger_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_counters() {
        let stats = Stats::default();
        stats.record_trigger();
        stats.record_trigger();
        stats.record_match();
        stats.record_unmatched();
        stats.record_dispatch_error();

        let snap = stats.snapshot(true, 3, 2, Some("t0".into()), Some("t1".into()));
        assert_eq!(snap.triggers_processed, 2);
        assert_eq!(snap.matches_found, 1);
        assert_eq!(snap.unmatched_count, 1);
        assert_eq!(snap.dispatch_errors, 1);
        assert_eq!(snap.rule_count, 3);
        assert_eq!(snap.enabled_rule_count, 2);
    }

    fn rule(fingerprint: &str) -> Rule {
        Rule {
            id: fingerprint.replace('|', "-"),
            fingerprint: fingerprint.into(),
            name: "x".into(),
            description: String::new(),
            actions: vec![crate::rule::Action {
                domain: "light".into(),
                service: "turn_on".into(),
                entity_id: "light.x".into(),
                data: serde_json::Map::new(),
            }],
            enabled: true,
            execution_count: 0,
            last_executed: None,
        }
    }

    #[test]
    fn rule_stats_are_sorted_and_deduped() {
        let rules = vec![rule("kitchen|08-09|weekday||single_press"), rule("bedroom|08-09")];
        let stats = RuleStats::compute(&rules);
        assert_eq!(stats.total_scenarios, 2);
        assert_eq!(stats.total_actions, 2);
        assert_eq!(stats.rooms, vec!["bedroom", "kitchen"]);
        assert_eq!(stats.interaction_types, vec!["single_press"]);
    }
}

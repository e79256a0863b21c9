//! Hierarchical fingerprint matching: try the exact fingerprint, then widen
//! by dropping trailing components (interaction, then flags, then day type)
//! until a rule is found or only the room remains.

use crate::rulestore::RuleStore;
use scenariod_domain::fingerprint::{self, FingerprintParts};
use scenariod_domain::Rule;

pub struct MatchResult {
    pub fingerprint: String,
    pub rule: Option<Rule>,
    /// 0 = exact match, 1 = dropped interaction, 2 = also dropped flags,
    /// 3 = also dropped day type. `None` if nothing matched.
    pub fallback_depth: Option<usize>,
    pub candidates_tried: Vec<String>,
}

/// Run the fallback hierarchy for `parts` against `store`. When
/// `fallback_enabled` is false, only the exact fingerprint (depth 0) is
/// tried — a miss there is a miss, full stop.
pub fn find_match(
    store: &RuleStore,
    parts: &FingerprintParts,
    fallback_enabled: bool,
) -> Result<MatchResult, scenariod_domain::Error> {
    let exact = fingerprint::build(parts)?;
    let mut candidates_tried = Vec::new();

    let max_depth = if fallback_enabled { 4 } else { 1 };
    let mut widened = parts.clone();
    for depth in 0..max_depth {
        if depth == 1 {
            if widened.interaction_type.is_empty() {
                continue;
            }
            widened.interaction_type.clear();
        } else if depth == 2 {
            if widened.flags.is_empty() {
                continue;
            }
            widened.flags.clear();
        } else if depth == 3 {
            if widened.day_type.is_empty() {
                continue;
            }
            widened.day_type.clear();
        }

        let candidate = fingerprint::build(&widened)?;
        if candidates_tried.last().map(|c| c == &candidate).unwrap_or(false) {
            continue;
        }
        candidates_tried.push(candidate.clone());

        if let Some(rule) = store.find_by_fingerprint(&candidate) {
            return Ok(MatchResult {
                fingerprint: exact,
                rule: Some(rule),
                fallback_depth: Some(depth),
                candidates_tried,
            });
        }
    }

    Ok(MatchResult {
        fingerprint: exact,
        rule: None,
        fallback_depth: None,
        candidates_tried,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenariod_domain::Action;

    fn rule(fingerprint: &str) -> Rule {
        Rule {
            id: fingerprint.to_string(),
            fingerprint: fingerprint.to_string(),
            name: "x".into(),
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
    fn exact_match_wins_over_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::load(dir.path().join("rules.json")).unwrap();
        store
            .upsert(rule("kitchen|08-09|weekday|guest_mode|single_press"))
            .unwrap();
        store.upsert(rule("kitchen|08-09")).unwrap();

        let parts = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            day_type: "weekday".into(),
            flags: vec!["guest_mode".into()],
            interaction_type: "single_press".into(),
        };
        let result = find_match(&store, &parts, true).unwrap();
        assert_eq!(result.fallback_depth, Some(0));
        assert_eq!(
            result.rule.unwrap().fingerprint,
            "kitchen|08-09|weekday|guest_mode|single_press"
        );
    }

    #[test]
    fn falls_back_to_room_and_bucket_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::load(dir.path().join("rules.json")).unwrap();
        store.upsert(rule("kitchen|08-09")).unwrap();

        let parts = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            day_type: "weekday".into(),
            flags: vec!["guest_mode".into()],
            interaction_type: "single_press".into(),
        };
        let result = find_match(&store, &parts, true).unwrap();
        assert_eq!(result.fallback_depth, Some(3));
        assert_eq!(result.rule.unwrap().fingerprint, "kitchen|08-09");
    }

    #[test]
    fn no_match_returns_none_with_candidates_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::load(dir.path().join("rules.json")).unwrap();
        let parts = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            ..Default::default()
        };
        let result = find_match(&store, &parts, true).unwrap();
        assert!(result.rule.is_none());
        assert!(result.fallback_depth.is_none());
    }

    #[test]
    fn fallback_disabled_never_widens_past_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::load(dir.path().join("rules.json")).unwrap();
        store.upsert(rule("kitchen|08-09")).unwrap();

        let parts = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            day_type: "weekday".into(),
            flags: vec!["guest_mode".into()],
            interaction_type: "single_press".into(),
        };
        let result = find_match(&store, &parts, false).unwrap();
        assert!(result.rule.is_none());
        assert!(result.fallback_depth.is_none());
        assert_eq!(result.candidates_tried.len(), 1);
    }
}

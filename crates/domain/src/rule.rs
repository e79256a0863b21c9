//! Rule and action types: the persisted match table the matcher consults
//! and the dispatcher executes against.

use crate::error::{Error, Result};
use crate::fingerprint;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// `domain`/`verb` halves of a service call: lowercase identifiers only.
fn service_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap())
}

/// Characters an `entity_id` may contain once sanitized.
fn entity_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]+$").unwrap())
}

/// A single host service call, e.g. turning on a light at some brightness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub domain: String,
    pub service: String,
    pub entity_id: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Action {
    /// Validates the service-call grammar (`domain.verb`, both lowercase
    /// identifiers) and sanitizes `entity_id` (only `[A-Za-z0-9_.]`, must
    /// contain a dot).
    pub fn validate(&self) -> Result<()> {
        if !service_part_re().is_match(&self.domain) {
            return Err(Error::InvalidInput(format!(
                "action domain {:?} must match [a-z_][a-z0-9_]*",
                self.domain
            )));
        }
        if !service_part_re().is_match(&self.service) {
            return Err(Error::InvalidInput(format!(
                "action service {:?} must match [a-z_][a-z0-9_]*",
                self.service
            )));
        }
        self.sanitized_entity_id()?;
        Ok(())
    }

    /// `domain.service`, the form the host's service-call API expects.
    pub fn service_call(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// The entity id to pass to the host, or an error if it contains any
    /// character outside `[A-Za-z0-9_.]` or has no domain/name separator.
    pub fn sanitized_entity_id(&self) -> Result<String> {
        if !self.entity_id.contains('.') {
            return Err(Error::InvalidInput(format!(
                "entity_id {:?} has no domain.name separator",
                self.entity_id
            )));
        }
        if !entity_id_re().is_match(&self.entity_id) {
            return Err(Error::InvalidInput(format!(
                "entity_id {:?} contains characters outside [A-Za-z0-9_.]",
                self.entity_id
            )));
        }
        Ok(self.entity_id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    pub fingerprint: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub actions: Vec<Action>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub last_executed: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidInput("rule id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("rule name must not be empty".into()));
        }
        // An empty action list is tolerated: dispatch becomes a no-op. The
        // caller is expected to surface `warnings()` to the operator.
        // Round-trip the fingerprint through parse/build so a malformed or
        // denormalized string can never enter the store.
        let parsed = fingerprint::parse(&self.fingerprint);
        let rebuilt = fingerprint::build(&parsed)?;
        if rebuilt != self.fingerprint {
            return Err(Error::InvalidInput(format!(
                "fingerprint {:?} is not in canonical form, expected {:?}",
                self.fingerprint, rebuilt
            )));
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    /// Non-fatal issues worth surfacing to an operator: an empty action
    /// list is valid (dispatch becomes a logged no-op) but almost always
    /// a mistake.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.actions.is_empty() {
            warnings.push(format!("rule {} has no actions and will never do anything", self.id));
        }
        warnings
    }
}

/// Finds rules whose action sequences are byte-identical, a configuration
/// smell worth warning about even though it is not invalid.
pub fn duplicate_action_rule_ids(rules: &[Rule]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            if rules[i].actions == rules[j].actions && !rules[i].actions.is_empty() {
                pairs.push((rules[i].id.clone(), rules[j].id.clone()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_action() -> Action {
        Action {
            domain: "light".into(),
            service: "turn_on".into(),
            entity_id: "light.kitchen_main".into(),
            data: serde_json::Map::new(),
        }
    }

    #[test]
    fn valid_rule_passes() {
        let rule = Rule {
            id: "r1".into(),
            fingerprint: "kitchen|08-09|weekday".into(),
            name: "Morning kitchen lights".into(),
            description: String::new(),
            actions: vec![sample_action()],
            enabled: true,
            execution_count: 0,
            last_executed: None,
        };
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn non_canonical_fingerprint_is_rejected() {
        let rule = Rule {
            id: "r1".into(),
            fingerprint: "kitchen|08-09||".into(),
            name: "x".into(),
            description: String::new(),
            actions: vec![sample_action()],
            enabled: true,
            execution_count: 0,
            last_executed: None,
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn rule_without_actions_is_valid_but_warns() {
        let rule = Rule {
            id: "r1".into(),
            fingerprint: "kitchen|08-09".into(),
            name: "x".into(),
            description: String::new(),
            actions: vec![],
            enabled: true,
            execution_count: 0,
            last_executed: None,
        };
        assert!(rule.validate().is_ok());
        assert_eq!(rule.warnings().len(), 1);
    }

    #[test]
    fn duplicate_action_sequences_are_reported() {
        let a = Rule {
            id: "r1".into(),
            fingerprint: "kitchen|08-09".into(),
            name: "x".into(),
            description: String::new(),
            actions: vec![sample_action()],
            enabled: true,
            execution_count: 0,
            last_executed: None,
        };
        let mut b = a.clone();
        b.id = "r2".into();
        b.fingerprint = "bedroom|08-09".into();
        assert_eq!(duplicate_action_rule_ids(&[a, b]).len(), 1);
    }

    #[test]
    fn service_call_formats_domain_and_service() {
        assert_eq!(sample_action().service_call(), "light.turn_on");
    }

    #[test]
    fn rejects_uppercase_domain() {
        let mut action = sample_action();
        action.domain = "Light".into();
        assert!(action.validate().is_err());
    }

    #[test]
    fn rejects_service_with_embedded_dot() {
        let mut action = sample_action();
        action.service = "turn.on".into();
        assert!(action.validate().is_err());
    }

    #[test]
    fn rejects_entity_id_without_dot() {
        let mut action = sample_action();
        action.entity_id = "kitchen_main".into();
        assert!(action.validate().is_err());
    }

    #[test]
    fn rejects_entity_id_with_illegal_characters() {
        let mut action = sample_action();
        action.entity_id = "light.kitchen main!".into();
        assert!(action.validate().is_err());
    }

    #[test]
    fn accepts_sanitized_entity_id() {
        assert_eq!(
            sample_action().sanitized_entity_id().unwrap(),
            "light.kitchen_main"
        );
    }
}

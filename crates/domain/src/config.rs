//! Rule-engine configuration: room aliasing, conditional-flag derivation and
//! the system-wide settings that parameterize fingerprint composition and
//! bookkeeping limits. Distinct from the gateway's own startup configuration
//! (host/port/file paths), which lives with the binary, not the engine.

use crate::error::{Error, Result};
use crate::fingerprint::is_valid_room;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps a physical/alias room identifier used by incoming triggers onto the
/// canonical room identifier used in fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomMapping {
    pub canonical_room: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

impl RoomMapping {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_room(&self.canonical_room) {
            return Err(Error::InvalidInput(format!(
                "room mapping has invalid canonical_room: {:?}",
                self.canonical_room
            )));
        }
        Ok(())
    }
}

/// A condition under which an entity's state contributes an optional flag
/// to the fingerprint (e.g. `input_boolean.guest_mode == "on"` contributes
/// `guest_mode`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConditionalEntity {
    pub entity_id: String,
    pub expected_state: String,
    pub flag: String,
}

impl ConditionalEntity {
    pub fn validate(&self) -> Result<()> {
        if self.entity_id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "conditional entity has empty entity_id".into(),
            ));
        }
        if !crate::fingerprint::is_valid_flag(&self.flag) {
            return Err(Error::InvalidInput(format!(
                "conditional entity has invalid flag: {:?}",
                self.flag
            )));
        }
        Ok(())
    }

    /// Does this entity's current state (as reported by the host) activate the flag?
    pub fn is_active(&self, observed_state: Option<&str>) -> bool {
        observed_state == Some(self.expected_state.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucketGranularity {
    Hourly,
    HalfHourly,
    QuarterHourly,
    Custom(u32),
}

impl TimeBucketGranularity {
    pub fn minutes(&self) -> u32 {
        match self {
            TimeBucketGranularity::Hourly => 60,
            TimeBucketGranularity::HalfHourly => 30,
            TimeBucketGranularity::QuarterHourly => 15,
            TimeBucketGranularity::Custom(n) => *n,
        }
    }
}

impl Default for TimeBucketGranularity {
    fn default() -> Self {
        TimeBucketGranularity::Hourly
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemSettings {
    #[serde(default)]
    pub time_bucket_granularity: TimeBucketGranularity,
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
    #[serde(default = "default_max_unmatched_entries")]
    pub max_unmatched_entries: usize,
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,
    /// Service-call domains the dispatcher is allowed to reach (e.g. `light`,
    /// `switch`, `scene`). A dispatched action outside this list is a policy
    /// violation and is dropped, not executed.
    #[serde(default = "default_allowed_domains")]
    pub allowed_service_domains: Vec<String>,
    #[serde(default)]
    pub simulation_mode: bool,
    /// When false, only an exact fingerprint match is tried — the matcher
    /// never walks the hierarchical fallback chain, so a miss stays a miss.
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
}

fn default_max_log_entries() -> usize {
    1000
}

fn default_max_unmatched_entries() -> usize {
    500
}

fn default_suggestion_count() -> usize {
    5
}

fn default_allowed_domains() -> Vec<String> {
    vec![
        "light".into(),
        "switch".into(),
        "scene".into(),
        "script".into(),
        "automation".into(),
        "media_player".into(),
        "climate".into(),
        "cover".into(),
        "fan".into(),
        "vacuum".into(),
    ]
}

fn default_fallback_enabled() -> bool {
    true
}

impl Default for SystemSettings {
    fn default() -> Self {
        SystemSettings {
            time_bucket_granularity: TimeBucketGranularity::default(),
            max_log_entries: default_max_log_entries(),
            max_unmatched_entries: default_max_unmatched_entries(),
            suggestion_count: default_suggestion_count(),
            allowed_service_domains: default_allowed_domains(),
            simulation_mode: false,
            fallback_enabled: default_fallback_enabled(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigMetadata {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub last_modified: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub room_mappings: Vec<RoomMapping>,
    #[serde(default)]
    pub conditional_entities: Vec<ConditionalEntity>,
    #[serde(default)]
    pub system_settings: SystemSettings,
    #[serde(rename = "_metadata", default)]
    pub metadata: ConfigMetadata,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            room_mappings: Vec::new(),
            conditional_entities: Vec::new(),
            system_settings: SystemSettings::default(),
            metadata: ConfigMetadata::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        for mapping in &self.room_mappings {
            mapping.validate()?;
        }
        for entity in &self.conditional_entities {
            entity.validate()?;
        }
        if self.system_settings.suggestion_count == 0 {
            return Err(Error::InvalidInput(
                "suggestion_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolve an incoming room alias to its canonical fingerprint room id,
    /// falling back to the alias itself when no mapping claims it.
    pub fn canonical_room(&self, incoming: &str) -> String {
        for mapping in &self.room_mappings {
            if mapping.canonical_room == incoming || mapping.aliases.iter().any(|a| a == incoming)
            {
                return mapping.canonical_room.clone();
            }
        }
        incoming.to_string()
    }

    /// Active optional flags for the given observed entity states, sorted
    /// for determinism (callers should not rely on this though —
    /// `fingerprint::build` sorts again).
    pub fn active_flags(&self, observed_states: &HashMap<String, String>) -> Vec<String> {
        self.conditional_entities
            .iter()
            .filter(|ce| ce.is_active(observed_states.get(&ce.entity_id).map(String::as_str)))
            .map(|ce| ce.flag.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn canonical_room_resolves_alias() {
        let config = Config {
            room_mappings: vec![RoomMapping {
                canonical_room: "kitchen".into(),
                aliases: vec!["kitchen_main".into()],
                entities: vec![],
            }],
            ..Config::default()
        };
        assert_eq!(config.canonical_room("kitchen_main"), "kitchen");
        assert_eq!(config.canonical_room("unknown_room"), "unknown_room");
    }

    #[test]
    fn active_flags_only_includes_matching_state() {
        let config = Config {
            conditional_entities: vec![ConditionalEntity {
                entity_id: "input_boolean.guest_mode".into(),
                expected_state: "on".into(),
                flag: "guest_mode".into(),
            }],
            ..Config::default()
        };
        let mut states = HashMap::new();
        states.insert("input_boolean.guest_mode".to_string(), "on".to_string());
        assert_eq!(config.active_flags(&states), vec!["guest_mode".to_string()]);

        states.insert("input_boolean.guest_mode".to_string(), "off".to_string());
        assert!(config.active_flags(&states).is_empty());
    }

    #[test]
    fn rejects_invalid_room_mapping() {
        let config = Config {
            room_mappings: vec![RoomMapping {
                canonical_room: "2bad".into(),
                aliases: vec![],
                entities: vec![],
            }],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}

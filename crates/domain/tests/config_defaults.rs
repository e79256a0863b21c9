use scenariod_domain::config::{Config, TimeBucketGranularity};

#[test]
fn default_config_has_hourly_buckets_and_standard_limits() {
    let config = Config::default();
    assert_eq!(
        config.system_settings.time_bucket_granularity,
        TimeBucketGranularity::Hourly
    );
    assert_eq!(config.system_settings.max_log_entries, 1000);
    assert_eq!(config.system_settings.max_unmatched_entries, 500);
    assert!(!config.system_settings.simulation_mode);
    assert!(config.system_settings.fallback_enabled);
    assert_eq!(
        config.system_settings.allowed_service_domains,
        vec!["light", "switch", "scene", "script", "automation", "media_player", "climate", "cover", "fan", "vacuum"]
    );
    assert!(config.validate().is_ok());
}

#[test]
fn deserializes_from_json_with_partial_system_settings() {
    let json = r#"{
        "room_mappings": [
            {"canonical_room": "kitchen", "aliases": ["kitchen_main"], "entities": ["light.kitchen_main"]}
        ],
        "conditional_entities": [],
        "system_settings": {"simulation_mode": true}
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.system_settings.simulation_mode);
    assert_eq!(config.system_settings.max_log_entries, 1000);
    assert_eq!(config.canonical_room("kitchen_main"), "kitchen");
}

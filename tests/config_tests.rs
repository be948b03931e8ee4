use std::io::Write;

use nudge::kernel::coordinator::RoutingPolicy;
use nudge::{AppConfig, ConfigError, Difficulty};

#[test]
fn test_empty_file_yields_defaults() {
    let config = AppConfig::from_toml_str("").unwrap();
    assert_eq!(config, AppConfig::default());

    let avatar = config.surface("avatar").expect("avatar surface");
    assert_eq!(avatar.tick_interval_ms, 12_000);
    assert_eq!(avatar.minimum_cooldown_ms, 20_000);
    assert_eq!(avatar.show_probability, 0.7);

    let chat = config.surface("chat").expect("chat surface");
    assert_eq!(chat.tick_interval_ms, 30_000);
    assert_eq!(chat.minimum_cooldown_ms, 120_000);
    assert_eq!(chat.show_probability, 0.3);
    assert!(chat.defer_first_delivery);

    assert_eq!(config.coordinator.routing, RoutingPolicy::Originating);
    assert_eq!(config.session.difficulty, Difficulty::Medium);
    assert_eq!(config.catalog.encouragements.len(), 5);
}

#[test]
fn test_partial_surface_gets_field_defaults() {
    let config = AppConfig::from_toml_str(
        r#"
        [[surfaces]]
        id = "sidebar"
        show_probability = 0.5
        "#,
    )
    .unwrap();

    assert_eq!(config.surfaces.len(), 1);
    let sidebar = &config.surfaces[0];
    assert_eq!(sidebar.show_probability, 0.5);
    assert_eq!(sidebar.display_duration_ms, 10_000);
    assert_eq!(sidebar.immediate_display_duration_ms, 6_000);

    let scheduler = sidebar.scheduler_config();
    assert_eq!(scheduler.minimum_cooldown.num_milliseconds(), 20_000);
}

#[test]
fn test_pinned_routing_and_global_cooldown() {
    let config = AppConfig::from_toml_str(
        r#"
        [coordinator]
        global_cooldown_ms = 15000
        routing = { pinned = "chat" }

        [session]
        course = "Physics"
        lesson = "Momentum"
        difficulty = "hard"
        "#,
    )
    .unwrap();

    let coordinator = config.coordinator.coordinator_config();
    assert_eq!(coordinator.routing, RoutingPolicy::Pinned("chat".into()));
    assert_eq!(coordinator.global_cooldown.num_milliseconds(), 15_000);
    assert_eq!(config.session.difficulty, Difficulty::Hard);
}

#[test]
fn test_rejects_out_of_range_probability() {
    let err = AppConfig::from_toml_str(
        r#"
        [[surfaces]]
        id = "avatar"
        show_probability = 1.5
        "#,
    )
    .unwrap_err();

    match err {
        ConfigError::InvalidValue { key, .. } => assert_eq!(key, "surfaces.avatar.show_probability"),
        other => panic!("Expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_rejects_unknown_pinned_surface() {
    let err = AppConfig::from_toml_str(
        r#"
        [coordinator]
        routing = { pinned = "hologram" }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "coordinator.routing"));
}

#[test]
fn test_rejects_duplicate_and_zero_intervals() {
    let duplicate = AppConfig::from_toml_str(
        r#"
        [[surfaces]]
        id = "chat"
        [[surfaces]]
        id = "chat"
        "#,
    );
    assert!(matches!(duplicate, Err(ConfigError::InvalidValue { .. })));

    let zero = AppConfig::from_toml_str(
        r#"
        [[surfaces]]
        id = "chat"
        tick_interval_ms = 0
        "#,
    );
    assert!(matches!(zero, Err(ConfigError::InvalidValue { ref key, .. }) if key == "surfaces.chat.tick_interval_ms"));
}

#[test]
fn test_unknown_difficulty_is_parse_error() {
    let err = AppConfig::from_toml_str(
        r#"
        [session]
        difficulty = "impossible"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed(_)));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sampler]\nenabled = false\nseed = 42").unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert!(!config.sampler.enabled);
    assert_eq!(config.sampler.seed, Some(42));
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::LoadFailed { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

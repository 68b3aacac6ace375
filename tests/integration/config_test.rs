//! Configuration integration tests

use deal_signals::config::Config;
use deal_signals::signal::DealPolicy;

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.source.lookback_days, 35);
    assert_eq!(config.window.capacity, 30);
    assert_eq!(config.window.min_periods, 5);
    assert!(!config.notify.enabled);
    assert_eq!(config.notify.token_env, "SLACK_BOT_TOKEN");
    assert!(config.window.validate().is_ok());
}

#[test]
fn test_example_matches_defaults() {
    let example: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    let defaults = Config::default();
    assert_eq!(example.window, defaults.window);
    assert_eq!(example.signal, defaults.signal);
    assert_eq!(DealPolicy::from(&example.signal), DealPolicy::default());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
            [signal]
            discount_ratio = 0.8

            [notify]
            enabled = true
            channel = "#alt-assets"
        "##,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.signal.discount_ratio, 0.8);
    assert_eq!(config.signal.z_score_threshold, -2.0);
    assert_eq!(config.notify.channel, "#alt-assets");
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.window, config.window);
    assert_eq!(parsed.store.database_path, config.store.database_path);
}

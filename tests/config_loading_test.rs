use std::path::PathBuf;
use std::time::Duration;
use telemetry_flow::config::ConfigManager;

fn repo_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn test_repository_base_config_matches_defaults() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "development").unwrap();
    assert_eq!(manager.config(), &telemetry_flow::FlowConfig::default());
}

#[test]
fn test_repository_test_overrides_are_layered() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "test").unwrap();
    let config = manager.config();

    assert_eq!(config.health.throttle_interval(), Duration::from_millis(100));
    assert_eq!(config.metrics.window_interval(), Duration::from_millis(50));
    assert_eq!(config.alerts.debounce_interval(), Duration::from_millis(200));
    // Untouched keys fall through to the base file
    assert_eq!(config.metrics.buffer_max_size, 10);
    assert_eq!(config.alerts.cache_max_size, 50);
}

#[test]
fn test_repository_production_overrides_capacity() {
    let mut vars = config::Map::new();
    vars.insert(
        "TELEMETRY_FLOW_HEALTH__STALENESS_CEILING_MS".to_string(),
        "60000".to_string(),
    );
    let manager =
        ConfigManager::load_with_env_vars(Some(repo_config_dir()), "production", vars).unwrap();
    let config = manager.config();

    assert_eq!(config.alerts.cache_max_size, 200);
    assert_eq!(config.bus.channel_capacity, 256);
    assert_eq!(config.health.staleness_ceiling_ms, 60_000);
    assert_eq!(manager.environment(), "production");
}

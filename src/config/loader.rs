//! Configuration Loader
//!
//! Environment-aware loading of [`FlowConfig`]. Sources are layered, later ones
//! winning:
//!
//! 1. built-in defaults
//! 2. `<config_dir>/telemetry-flow.toml`
//! 3. `<config_dir>/telemetry-flow.<environment>.toml`
//! 4. `TELEMETRY_FLOW_<SECTION>__<KEY>` environment variables
//!    (e.g. `TELEMETRY_FLOW_ALERTS__CACHE_MAX_SIZE=100`)
//!
//! Missing files are skipped; a present but malformed file is an error.

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::FlowConfig;

const CONFIG_FILE_STEM: &str = "telemetry-flow";
const ENV_PREFIX: &str = "TELEMETRY_FLOW";

/// Loaded, validated configuration plus the context it was loaded from
#[derive(Debug)]
pub struct ConfigManager {
    config: FlowConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_sources(config_dir, environment, None)
    }

    /// Load configuration with an explicit variable map standing in for the process
    /// environment, so tests need not mutate global state
    pub fn load_with_env_vars(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_vars: config::Map<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_sources(config_dir, environment, Some(env_vars))
    }

    fn load_with_sources(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_vars: Option<config::Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading flow configuration"
        );

        let base_file = Self::config_file(&config_directory, None);
        let env_file = Self::config_file(&config_directory, Some(environment));

        let defaults = Config::try_from(&FlowConfig::default())
            .map_err(|e| ConfigurationError::load_error("<defaults>", e))?;

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_file.clone()).required(false))
            .add_source(File::from(env_file.clone()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(&config_directory, e))?;

        let config: FlowConfig = merged
            .try_deserialize()
            .map_err(ConfigurationError::deserialize_error)?;

        config.validate()?;

        info!(
            environment = %environment,
            base_file_present = base_file.exists(),
            env_file_present = env_file.exists(),
            health_throttle_ms = config.health.throttle_interval_ms,
            metrics_window_ms = config.metrics.window_interval_ms,
            alert_debounce_ms = config.alerts.debounce_interval_ms,
            "Flow configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Effective configuration as JSON, for diagnostics output
    pub fn debug_config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }

    /// Current environment from `TELEMETRY_FLOW_ENV`, then `APP_ENV`, else development
    pub fn detect_environment() -> String {
        env::var("TELEMETRY_FLOW_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn config_file(dir: &Path, environment: Option<&str>) -> PathBuf {
        match environment {
            Some(env) => dir.join(format!("{CONFIG_FILE_STEM}.{env}.toml")),
            None => dir.join(format!("{CONFIG_FILE_STEM}.toml")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load_with_env_vars(
            Some(dir.path().join("absent")),
            "test",
            config::Map::new(),
        )
        .unwrap();
        assert_eq!(manager.config(), &FlowConfig::default());
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("telemetry-flow.toml"),
            "[alerts]\ncache_max_size = 20\ndebounce_interval_ms = 1000\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("telemetry-flow.production.toml"),
            "[alerts]\ncache_max_size = 200\n",
        )
        .unwrap();

        let manager = ConfigManager::load_with_env_vars(
            Some(dir.path().to_path_buf()),
            "production",
            config::Map::new(),
        )
        .unwrap();

        assert_eq!(manager.config().alerts.cache_max_size, 200);
        assert_eq!(manager.config().alerts.debounce_interval_ms, 1000);
        assert_eq!(manager.config().metrics.buffer_max_size, 10);
    }

    #[test]
    fn test_env_vars_override_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("telemetry-flow.toml"),
            "[health]\nthrottle_interval_ms = 500\n",
        )
        .unwrap();

        let mut vars = config::Map::new();
        vars.insert(
            "TELEMETRY_FLOW_HEALTH__THROTTLE_INTERVAL_MS".to_string(),
            "750".to_string(),
        );
        let manager =
            ConfigManager::load_with_env_vars(Some(dir.path().to_path_buf()), "test", vars)
                .unwrap();

        assert_eq!(manager.config().health.throttle_interval_ms, 750);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("telemetry-flow.toml"),
            "[metrics]\nbuffer_max_size = 0\n",
        )
        .unwrap();

        let result = ConfigManager::load_with_env_vars(
            Some(dir.path().to_path_buf()),
            "test",
            config::Map::new(),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "metrics.buffer_max_size"
        ));
    }
}

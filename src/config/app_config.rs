use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::services::RunnerOptions;
use crate::infrastructure::storage::StorageConfig;

/// Application configuration
///
/// Sources, later ones overriding earlier: `config/default`, `config/local`,
/// an optional explicit file, then `APP__*` environment variables
/// (e.g. `APP__RUNNER__MAX_CONCURRENCY=8`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where tests are persisted
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `json`
    pub backend: String,
    /// Root directory for the JSON backend
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub evaluation_timeout_ms: u64,
    pub max_concurrency: usize,
    pub min_observations_per_variant: usize,
    pub default_sample_size: usize,
    /// Seed for the built-in random evaluator; entropy when unset
    pub random_seed: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            path: PathBuf::from("./ab_testing_data"),
        }
    }
}

impl StorageSettings {
    pub fn storage_config(&self) -> Result<StorageConfig, DomainError> {
        StorageConfig::from_backend(&self.backend, &self.path)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            evaluation_timeout_ms: 30_000,
            max_concurrency: 4,
            min_observations_per_variant: 2,
            default_sample_size: 100,
            random_seed: None,
        }
    }
}

impl RunnerConfig {
    pub fn options(&self) -> RunnerOptions {
        RunnerOptions::default()
            .with_evaluation_timeout(Duration::from_millis(self.evaluation_timeout_ms))
            .with_max_concurrency(self.max_concurrency)
            .with_min_observations(self.min_observations_per_variant)
            .with_default_sample_size(self.default_sample_size)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `file` above the standard config files
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.storage.backend, "memory");

        let options = config.runner.options();
        assert_eq!(options.evaluation_timeout, Duration::from_secs(30));
        assert_eq!(options.max_concurrency, 4);
        assert_eq!(options.min_observations_per_variant, 2);
        assert_eq!(options.default_sample_size, 100);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "[logging]\nformat = \"json\"\n\n[runner]\nmax_concurrency = 8\nrandom_seed = 42\n"
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.runner.max_concurrency, 8);
        assert_eq!(config.runner.random_seed, Some(42));
        assert_eq!(config.runner.default_sample_size, 100);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/ab-config.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_settings() {
        let settings = StorageSettings {
            backend: "json".to_string(),
            path: PathBuf::from("/tmp/ab"),
        };
        assert!(settings.storage_config().is_ok());

        let settings = StorageSettings {
            backend: "redis".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            settings.storage_config(),
            Err(DomainError::Configuration { .. })
        ));
    }
}

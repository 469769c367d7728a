//! Agent configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use geolink_core::ReporterConfig;
use geolink_types::FixRequest;

/// Agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Link settings.
    pub link: LinkConfig,
    /// Reporter settings.
    pub reporter: ReporterSettings,
    /// Agent settings.
    pub agent: AgentConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Link endpoint is a `ws://` or `wss://` URL
    /// - Retry interval is non-zero
    /// - Accuracy threshold is positive and finite
    /// - Each cadence's minimum update interval does not exceed its interval
    /// - Device identifier, when present, is not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.link.validate());
        errors.extend(self.reporter.validate());
        errors.extend(self.agent.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Build the core reporter configuration from the agent settings.
    pub fn to_reporter_config(&self) -> ReporterConfig {
        let mut config = ReporterConfig::new(&self.link.endpoint)
            .retry_interval(Duration::from_secs(self.link.retry_interval_secs))
            .accuracy_threshold_m(self.reporter.accuracy_threshold_m);
        config.high_accuracy = self.reporter.high_accuracy.to_request();
        config.balanced_power = self.reporter.balanced_power.to_request();
        config
    }
}

/// WebSocket link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// WebSocket endpoint URL (e.g., "wss://tracker.example.com/report").
    pub endpoint: String,
    /// Seconds between reconnect attempts.
    pub retry_interval_secs: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:9001".to_string(),
            retry_interval_secs: 15,
        }
    }
}

impl LinkConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            errors.push(ValidationError {
                field: "link.endpoint".to_string(),
                message: format!(
                    "invalid endpoint '{}': expected a ws:// or wss:// URL",
                    self.endpoint
                ),
            });
        }
        if self.retry_interval_secs == 0 {
            errors.push(ValidationError {
                field: "link.retry_interval_secs".to_string(),
                message: "retry interval cannot be 0".to_string(),
            });
        }

        errors
    }
}

/// Accuracy feedback and fix cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterSettings {
    /// Accuracy threshold in meters for switching power profiles.
    pub accuracy_threshold_m: f32,
    /// Cadence requested while fixes are accurate.
    pub high_accuracy: Cadence,
    /// Cadence requested while fixes are poor.
    pub balanced_power: Cadence,
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            accuracy_threshold_m: 50.0,
            high_accuracy: Cadence {
                interval_secs: 10,
                min_update_interval_secs: 5,
            },
            balanced_power: Cadence {
                interval_secs: 30,
                min_update_interval_secs: 15,
            },
        }
    }
}

impl ReporterSettings {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.accuracy_threshold_m.is_finite() || self.accuracy_threshold_m <= 0.0 {
            errors.push(ValidationError {
                field: "reporter.accuracy_threshold_m".to_string(),
                message: format!(
                    "accuracy threshold {} must be positive and finite",
                    self.accuracy_threshold_m
                ),
            });
        }
        errors.extend(self.high_accuracy.validate("reporter.high_accuracy"));
        errors.extend(self.balanced_power.validate("reporter.balanced_power"));

        errors
    }
}

/// Fix request cadence in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    /// Desired seconds between fixes.
    pub interval_secs: u64,
    /// Minimum seconds the provider may deliver updates at.
    pub min_update_interval_secs: u64,
}

impl Cadence {
    fn to_request(self) -> FixRequest {
        FixRequest::new(
            Duration::from_secs(self.interval_secs),
            Duration::from_secs(self.min_update_interval_secs),
        )
    }

    fn validate(&self, prefix: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.interval_secs == 0 {
            errors.push(ValidationError {
                field: format!("{}.interval_secs", prefix),
                message: "interval cannot be 0".to_string(),
            });
        }
        if self.min_update_interval_secs > self.interval_secs {
            errors.push(ValidationError {
                field: format!("{}.min_update_interval_secs", prefix),
                message: format!(
                    "minimum update interval {} exceeds the interval {}",
                    self.min_update_interval_secs, self.interval_secs
                ),
            });
        }

        errors
    }
}

/// Agent-local settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Device identifier reported to the server.
    ///
    /// When omitted, the agent resolves one from the environment or
    /// the machine id, falling back to the `"unknown"` sentinel.
    pub device_id: Option<String>,
}

impl AgentConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(id) = &self.device_id
            && id.is_empty()
        {
            errors.push(ValidationError {
                field: "agent.device_id".to_string(),
                message: "device id cannot be empty string (use null/omit instead)".to_string(),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `link.endpoint`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("geolink")
        .join("agent.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.link.endpoint, "ws://127.0.0.1:9001");
        assert_eq!(config.link.retry_interval_secs, 15);
        assert_eq!(config.reporter.accuracy_threshold_m, 50.0);
        assert_eq!(config.agent.device_id, None);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_to_reporter_config() {
        let config = Config::default();
        let reporter = config.to_reporter_config();
        assert_eq!(reporter.endpoint, "ws://127.0.0.1:9001");
        assert_eq!(reporter.retry_interval, Duration::from_secs(15));
        assert_eq!(
            reporter.high_accuracy,
            FixRequest::new(Duration::from_secs(10), Duration::from_secs(5))
        );
        assert_eq!(
            reporter.balanced_power,
            FixRequest::new(Duration::from_secs(30), Duration::from_secs(15))
        );
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("agent.toml");

        let mut config = Config::default();
        config.link.endpoint = "wss://tracker.example.com/report".to_string();
        config.agent.device_id = Some("355420071234567".to_string());

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(loaded.link.endpoint, "wss://tracker.example.com/report");
        assert_eq!(loaded.agent.device_id, Some("355420071234567".to_string()));
        assert_eq!(loaded.link.retry_interval_secs, 15);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/agent.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "this is not valid { toml").unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_config_full_toml() {
        let toml = r#"
            [link]
            endpoint = "wss://tracker.example.com/report"
            retry_interval_secs = 30

            [reporter]
            accuracy_threshold_m = 75.0

            [reporter.high_accuracy]
            interval_secs = 5
            min_update_interval_secs = 2

            [reporter.balanced_power]
            interval_secs = 60
            min_update_interval_secs = 30

            [agent]
            device_id = "355420071234567"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.link.endpoint, "wss://tracker.example.com/report");
        assert_eq!(config.link.retry_interval_secs, 30);
        assert_eq!(config.reporter.accuracy_threshold_m, 75.0);
        assert_eq!(config.reporter.high_accuracy.interval_secs, 5);
        assert_eq!(config.reporter.balanced_power.min_update_interval_secs, 30);
        assert_eq!(config.agent.device_id, Some("355420071234567".to_string()));
    }

    #[test]
    fn test_endpoint_validation() {
        let mut config = Config::default();
        config.link.endpoint = "http://tracker.example.com".to_string();

        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "link.endpoint");
        }
    }

    #[test]
    fn test_retry_interval_validation() {
        let mut config = Config::default();
        config.link.retry_interval_secs = 0;

        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.field == "link.retry_interval_secs"));
        }
    }

    #[test]
    fn test_cadence_validation() {
        let mut config = Config::default();
        config.reporter.high_accuracy = Cadence {
            interval_secs: 5,
            min_update_interval_secs: 10,
        };

        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors[0].message.contains("exceeds"));
        }
    }

    #[test]
    fn test_empty_device_id_validation() {
        let mut config = Config::default();
        config.agent.device_id = Some(String::new());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("geolink/agent.toml"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError {
            field: "link.endpoint".to_string(),
            message: "invalid URL".to_string(),
        };
        assert_eq!(format!("{}", error), "link.endpoint: invalid URL");
    }
}

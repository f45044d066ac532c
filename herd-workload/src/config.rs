//! Configuration management for the herd workload controller
//!
//! Settings are resolved from, in increasing priority:
//! 1. Default values
//! 2. Configuration file (TOML format)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HerdConfig {
    /// Controller configuration
    pub controller: ControllerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Namespace to watch, empty for all namespaces
    pub namespace: String,
    /// Name the workload handler logs under
    pub handler_name: String,
    /// Requeue every workload once the watchers are running
    pub requeue_on_start: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Enable file logging
    pub file_logging_enabled: bool,
    /// Write console output as JSON
    pub json_format: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            handler_name: "workload-services".to_string(),
            requeue_on_start: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("/var/log/herd"),
            file_logging_enabled: false,
            json_format: false,
        }
    }
}

impl HerdConfig {
    /// Load configuration from environment variables and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(config_path) => Self::load_from_file(&config_path)?,
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.clone(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("HERD_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/herd/config.toml")),
            Some(PathBuf::from("./herd.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Controller
        if let Some(namespace) = var("HERD_NAMESPACE") {
            self.controller.namespace = namespace;
        }
        if let Some(name) = var("HERD_HANDLER_NAME") {
            self.controller.handler_name = name;
        }
        if let Some(requeue) = var("HERD_REQUEUE_ON_START") {
            self.controller.requeue_on_start = parse_bool("HERD_REQUEUE_ON_START", &requeue)?;
        }

        // Logging
        if let Some(level) = var("HERD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(path) = var("HERD_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(path);
        }
        if let Some(enabled) = var("HERD_FILE_LOGGING") {
            self.logging.file_logging_enabled = parse_bool("HERD_FILE_LOGGING", &enabled)?;
        }
        if let Some(json) = var("HERD_LOG_JSON") {
            self.logging.json_format = parse_bool("HERD_LOG_JSON", &json)?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.handler_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Handler name cannot be empty".to_string(),
            ));
        }

        if self.controller.namespace.contains('/') {
            return Err(ConfigError::Validation(format!(
                "Namespace '{}' cannot contain '/'",
                self.controller.namespace
            )));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        if self.logging.file_logging_enabled && self.logging.log_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Log directory required when file logging is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

impl LoggingConfig {
    /// Subscriber settings for this configuration
    pub fn to_logging(&self) -> crate::logging::LoggingConfig {
        crate::logging::LoggingConfig {
            level: self.level.clone(),
            file_path: self
                .file_logging_enabled
                .then(|| self.log_dir.display().to_string()),
            json_format: self.json_format,
            ..Default::default()
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("{} must be true or false, got '{}'", key, value))
    })
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    FileRead(PathBuf, String),
    /// Failed to parse configuration
    Parse(String),
    /// Configuration validation failed
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, err) => {
                write!(f, "Failed to read config file {:?}: {}", path, err)
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {}", err),
            ConfigError::Validation(err) => write!(f, "Config validation failed: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HerdConfig::default();
        assert_eq!(config.controller.namespace, "");
        assert_eq!(config.controller.handler_name, "workload-services");
        assert!(!config.controller.requeue_on_start);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[controller]
namespace = "apps"
requeue_on_start = true

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = HerdConfig::load_from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.controller.namespace, "apps");
        assert!(config.controller.requeue_on_start);
        // Unset keys keep their defaults
        assert_eq!(config.controller.handler_name, "workload-services");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_load_missing_file() {
        let err = HerdConfig::load_from_file(&PathBuf::from("/nonexistent/herd.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_, _)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[controller\nnamespace = ").unwrap();

        let err = HerdConfig::load_from_file(&file.path().to_path_buf()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HERD_NAMESPACE", "kube-system"),
            ("HERD_REQUEUE_ON_START", "true"),
            ("HERD_LOG_LEVEL", "warn"),
            ("HERD_LOG_JSON", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = HerdConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.controller.namespace, "kube-system");
        assert!(config.controller.requeue_on_start);
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json_format);
        assert!(!config.logging.file_logging_enabled);
    }

    #[test]
    fn test_log_dir_override_reaches_subscriber() {
        let vars: HashMap<&str, &str> = [
            ("HERD_LOG_DIR", "/tmp/herd-logs"),
            ("HERD_FILE_LOGGING", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = HerdConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(
            config.logging.to_logging().file_path.as_deref(),
            Some("/tmp/herd-logs")
        );
    }

    #[test]
    fn test_env_override_rejects_bad_bool() {
        let mut config = HerdConfig::default();
        config.controller.requeue_on_start = true;

        let err = config
            .apply_overrides(|key| (key == "HERD_REQUEUE_ON_START").then(|| "yes".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("HERD_REQUEUE_ON_START")));

        let err = HerdConfig::default()
            .apply_overrides(|key| (key == "HERD_LOG_JSON").then(|| "1".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_env_override_bool_trims_whitespace() {
        let mut config = HerdConfig::default();
        config
            .apply_overrides(|key| (key == "HERD_FILE_LOGGING").then(|| " true\n".to_string()))
            .unwrap();
        assert!(config.logging.file_logging_enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HerdConfig::default();
        config.controller.handler_name = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = HerdConfig::default();
        config.controller.namespace = "a/b".to_string();
        assert!(config.validate().is_err());

        let mut config = HerdConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = HerdConfig::default();
        config.logging.file_logging_enabled = true;
        config.logging.log_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_logging() {
        let mut config = LoggingConfig::default();
        assert!(config.to_logging().file_path.is_none());

        config.file_logging_enabled = true;
        config.json_format = true;
        let logging = config.to_logging();
        assert_eq!(logging.file_path.as_deref(), Some("/var/log/herd"));
        assert!(logging.json_format);
    }
}

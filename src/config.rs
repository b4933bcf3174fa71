use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, io, path::Path};

/// Default config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "Config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings. The tracked keys are fixed and not part of this.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_show_status")]
    pub show_status: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_show_status() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_shutdown_grace_ms() -> u64 {
    500
}

const MIN_SHUTDOWN_GRACE_MS: u64 = 50;
const MAX_SHUTDOWN_GRACE_MS: u64 = 5000;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            show_status: default_show_status(),
            log_level: default_log_level(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl AppConfig {
    /// Loads config from `path`, or returns defaults if the file is absent.
    ///
    /// The file is never created or written.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(content)?;

        config.shutdown_grace_ms = config
            .shutdown_grace_ms
            .clamp(MIN_SHUTDOWN_GRACE_MS, MAX_SHUTDOWN_GRACE_MS);
        if config.log_level.trim().is_empty() {
            config.log_level = default_log_level();
        }

        Ok(config)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.show_status);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.shutdown_grace(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml_str("show_status = false\nlog_level = \"debug\"").unwrap();
        assert!(!config.show_status);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.shutdown_grace_ms, 500);
    }

    #[test]
    fn test_grace_is_clamped() {
        let low = AppConfig::from_toml_str("shutdown_grace_ms = 0").unwrap();
        assert_eq!(low.shutdown_grace_ms, 50);

        let high = AppConfig::from_toml_str("shutdown_grace_ms = 60000").unwrap();
        assert_eq!(high.shutdown_grace_ms, 5000);
    }

    #[test]
    fn test_blank_log_level_falls_back() {
        let config = AppConfig::from_toml_str("log_level = \"  \"").unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_key_bindings_are_rejected() {
        let result = AppConfig::from_toml_str("left_key = \"J\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(AppConfig::from_toml_str("show_status = ").is_err());
        assert!(AppConfig::from_toml_str("show_status = \"yes\"").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("socd-resolver-missing-config-7f3a.toml");
        let config = AppConfig::load_optional(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!path.exists());
    }
}

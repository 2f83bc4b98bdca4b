//! # Application Configuration
//!
//! Optional TOML file passed with `--config`.
//!
//! ```toml
//! [engine]
//! predecessor_window = 10
//! max_nodes = 5000
//!
//! [engine.base_ranges.success]
//! min = 0.8
//! max = 0.95
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! Every key is optional; missing sections fall back to the defaults.
//! Command-line flags take precedence over the file.

use serde::{Deserialize, Serialize};
use signal_core::{EngineConfig, SignalError};
use std::path::Path;

/// Maximum accepted size of a configuration file (1 MiB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Whole-file configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SignalError> {
        let config: AppConfig = toml::from_str(text)
            .map_err(|e| SignalError::InvalidConfig(format!("Parse config: {}", e)))?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SignalError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            SignalError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(SignalError::InvalidConfig(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| SignalError::IoError(format!("Read config: {}", e)))?;
        let config = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let text = r#"
            [engine]
            max_nodes = 100

            [engine.base_ranges.failure]
            min = 0.2
            max = 0.5

            [server]
            port = 9090
        "#;
        let config = AppConfig::from_toml(text).expect("parse");
        assert_eq!(config.engine.max_nodes, Some(100));
        assert_eq!(config.engine.base_ranges.failure.min, 0.2);
        assert_eq!(config.engine.predecessor_window, 10);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn inverted_range_rejected() {
        let text = r#"
            [engine.base_ranges.success]
            min = 0.9
            max = 0.1
        "#;
        assert!(matches!(
            AppConfig::from_toml(text),
            Err(SignalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[engine\nmax_nodes = "),
            Err(SignalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_path_is_default() {
        assert_eq!(AppConfig::load(None).expect("load"), AppConfig::default());
    }
}

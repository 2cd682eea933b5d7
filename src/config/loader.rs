//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    UnsupportedFormat(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Toml(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "Parse error: {}", e),
            ConfigError::UnsupportedFormat(ext) => {
                write!(f, "Unsupported config format '{}' (expected .toml or .json)", ext)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML or JSON file.
///
/// The format follows the file extension; files without one are read as TOML.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml")
        .to_ascii_lowercase();

    let config = parse_config(&content, &extension)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration text in the given format without validating it.
pub fn parse_config(content: &str, format: &str) -> Result<GatewayConfig, ConfigError> {
    match format {
        "toml" => toml::from_str(content).map_err(ConfigError::Toml),
        "json" => serde_json::from_str(content).map_err(ConfigError::Json),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_config() {
        let config = parse_config(
            r#"{
                "server": {
                    "address": "127.0.0.1:9000",
                    "whitelist": { "enable": true, "addresses": ["127.0.0.1"] }
                },
                "clients": { "timeout_secs": 5, "proxy": { "address": "127.0.0.1:1080" } }
            }"#,
            "json",
        )
        .unwrap();
        assert_eq!(config.server.address, "127.0.0.1:9000");
        assert!(config.server.whitelist.enable);
        assert_eq!(config.clients.timeout_secs, 5);
        assert_eq!(config.clients.proxy.address.as_deref(), Some("127.0.0.1:1080"));
        assert_eq!(config.clients.proxy.protocol, "tcp");
    }

    #[test]
    fn test_unsupported_format() {
        let err = parse_config("", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref f) if f == "yaml"));
    }

    #[test]
    fn test_load_rejects_missing_address() {
        let path = std::env::temp_dir().join(format!("gateway-config-{}.toml", std::process::id()));
        fs::write(&path, "[clients]\ntimeout_secs = 10\n").unwrap();

        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.contains(&ValidationError::MissingServerAddress));
            }
            other => panic!("expected validation error, got {}", other),
        }
    }
}

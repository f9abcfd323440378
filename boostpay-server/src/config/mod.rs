//! Configuration module for boostpay-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments and
//! environment variables. The email API key only ever comes from the
//! environment.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{EmailSettings, ServerConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable holding the email API key.
pub const API_KEY_VAR: &str = "RESEND_API_KEY";
/// Environment variable overriding the operator address.
pub const OPERATOR_EMAIL_VAR: &str = "OPERATOR_EMAIL";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid email api base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub email: EmailSettings,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load the configuration from the file and the process environment.
    ///
    /// A missing file is not an error: every setting has a default.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = ?self.config_path, "Config file not found, using defaults");
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        self.build(file_config, |key| std::env::var(key).ok())
    }

    /// Apply overrides and secrets, then validate.
    pub fn build(
        &self,
        mut file_config: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        if let Some(operator) = env(OPERATOR_EMAIL_VAR) {
            file_config.email.operator = operator;
        }

        self.validate(&file_config)?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            email: EmailSettings {
                from: file_config.email.from,
                operator: file_config.email.operator,
                api_base: Url::parse(&file_config.email.api_base)?,
                api_key: env(API_KEY_VAR),
            },
        })
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if !config.email.operator.contains('@') {
            return Err(ConfigError::ValidationError(format!(
                "operator address {} is not an email address",
                config.email.operator
            )));
        }
        if config.email.from.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "email sender must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_build_applies_overrides_and_secrets() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:8080"

            [email]
            operator = "ops@example.com"
            api_base = "http://127.0.0.1:9999"
            "#,
        )
        .unwrap();
        let env = HashMap::from([(API_KEY_VAR, "re_123"), (OPERATOR_EMAIL_VAR, "nick@boost.example")]);
        let listen: SocketAddr = "0.0.0.0:4000".parse().unwrap();

        let loaded = ConfigLoader::new("unused.toml", Some(listen))
            .build(file, |k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(loaded.server.listen, listen);
        assert_eq!(loaded.email.operator, "nick@boost.example");
        assert_eq!(loaded.email.api_key.as_deref(), Some("re_123"));
        assert_eq!(loaded.email.api_base.as_str(), "http://127.0.0.1:9999/");
        assert_eq!(loaded.email.from, "Acme <onboarding@resend.dev>");
    }

    #[test]
    fn test_defaults_and_validation() {
        let loader = ConfigLoader::new("unused.toml", None);
        let loaded = loader.build(FileConfig::default(), |_| None).unwrap();
        assert_eq!(loaded.server.listen.port(), 3000);
        assert!(loaded.email.api_key.is_none());

        let mut bad = FileConfig::default();
        bad.email.operator = "nobody".to_string();
        assert!(matches!(
            loader.build(bad, |_| None),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let loaded = ConfigLoader::new("/nonexistent/boostpay-config.toml", None)
            .load()
            .unwrap();
        assert_eq!(loaded.email.api_base.as_str(), "https://api.resend.com/");
    }
}

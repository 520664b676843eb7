//! Configuration loading from the environment or from disk.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env(envy::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env(e) => write!(f, "Environment error: {}", e),
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

/// Flat view of the environment variables the gateway reads.
///
/// Every field is optional so that validation can report all missing values
/// at once instead of stopping at the first one.
#[derive(Debug, Default, Deserialize)]
struct EnvConfig {
    port: Option<u16>,
    bind_address: Option<String>,
    api_version: Option<String>,
    auth_service: Option<String>,
    words_service: Option<String>,
    secret_key: Option<String>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_name: Option<String>,
    db_max_connections: Option<u32>,
    log_level: Option<String>,
    log_format: Option<String>,
    metrics_enabled: Option<bool>,
    metrics_address: Option<String>,
}

impl EnvConfig {
    fn into_config(self) -> GatewayConfig {
        let mut config = GatewayConfig::default();

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(bind_address) = self.bind_address {
            config.listener.bind_address = bind_address;
        }
        config.api.version = self.api_version.unwrap_or_default();
        config.services.identity_url = self.auth_service.unwrap_or_default();
        config.services.words_url = self.words_service.unwrap_or_default();
        config.auth.secret = self.secret_key.unwrap_or_default();

        config.database.host = self.db_host.unwrap_or_default();
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        config.database.user = self.db_user.unwrap_or_default();
        config.database.password = self.db_password;
        config.database.name = self.db_name.unwrap_or_default();
        if let Some(max) = self.db_max_connections {
            config.database.max_connections = max;
        }

        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(enabled) = self.metrics_enabled {
            config.observability.metrics_enabled = enabled;
        }
        if let Some(address) = self.metrics_address {
            config.observability.metrics_address = address;
        }

        config
    }
}

/// Load and validate configuration from the process environment.
///
/// A `.env` file in the working directory is read first when present;
/// variables already set in the environment win.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
    let env: EnvConfig = envy::from_env().map_err(ConfigError::Env)?;
    finish(env.into_config())
}

/// Load and validate configuration from explicit key/value pairs.
pub fn load_from_iter<I>(vars: I) -> Result<GatewayConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env: EnvConfig = envy::from_iter(vars).map_err(ConfigError::Env)?;
    finish(env.into_config())
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_toml(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_toml(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    finish(config)
}

fn finish(config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_env() -> Vec<(String, String)> {
        vars(&[
            ("PORT", "3000"),
            ("API_VERSION", "v1"),
            ("AUTH_SERVICE", "http://auth.internal:4000"),
            ("WORDS_SERVICE", "http://words.internal:4001"),
            ("SECRET_KEY", "top-secret"),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "gateway"),
            ("DB_PASSWORD", ""),
            ("DB_NAME", "lingo"),
        ])
    }

    #[test]
    fn test_env_maps_onto_schema() {
        let config = load_from_iter(complete_env()).unwrap();

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.api.version, "v1");
        assert_eq!(config.services.identity_url, "http://auth.internal:4000");
        assert_eq!(config.services.words_url, "http://words.internal:4001");
        assert_eq!(config.auth.secret, "top-secret");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.password.as_deref(), Some(""));
        assert_eq!(config.database.idle_timeout_secs, 30);
    }

    #[test]
    fn test_missing_env_reports_all_fields() {
        let err = load_from_iter(vars(&[("PORT", "3000")])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 8),
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_unparsable_env_value() {
        let mut env = complete_env();
        env.push(("DB_PORT".into(), "not-a-port".into()));
        assert!(matches!(load_from_iter(env), Err(ConfigError::Env(_))));
    }

    #[test]
    fn test_toml_config() {
        let content = r#"
            [listener]
            port = 9000

            [api]
            version = "v2"

            [services]
            identity_url = "http://localhost:4000"
            words_url = "http://localhost:4001"

            [database]
            host = "localhost"
            user = "root"
            password = "pw"
            name = "lingo"

            [auth]
            secret = "s3cret"
        "#;

        let config = parse_toml(content).unwrap();
        assert_eq!(config.listen_address(), "0.0.0.0:9000");
        assert_eq!(config.api.version, "v2");
        assert_eq!(config.timeouts.request_secs, 60);
    }

    #[test]
    fn test_toml_syntax_error() {
        assert!(matches!(parse_toml("[listener"), Err(ConfigError::Parse(_))));
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Reject missing required values (version, service URLs, secret, database)
//! - Validate value ranges (port, pool size, retry attempts)
//! - Check that upstream base URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was not supplied.
    Missing(&'static str),
    /// A value was supplied but is not acceptable.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Missing(field) => write!(f, "{} is required", field),
            ValidationError::Invalid { field, reason } => write!(f, "{} is invalid: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    require(&mut errors, "api.version", &config.api.version);
    require(&mut errors, "auth.secret", &config.auth.secret);
    require(&mut errors, "database.host", &config.database.host);
    require(&mut errors, "database.user", &config.database.user);
    require(&mut errors, "database.name", &config.database.name);
    if config.database.password.is_none() {
        errors.push(ValidationError::Missing("database.password"));
    }

    check_url(&mut errors, "services.identity_url", &config.services.identity_url);
    check_url(&mut errors, "services.words_url", &config.services.words_url);

    if config.api.version.contains('/') {
        errors.push(ValidationError::Invalid {
            field: "api.version",
            reason: "must be a single path segment".to_string(),
        });
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::Invalid {
            field: "listener.port",
            reason: "must be greater than 0".to_string(),
        });
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::Invalid {
            field: "database.max_connections",
            reason: "must be greater than 0".to_string(),
        });
    }

    if config.retries.enabled && config.retries.max_attempts == 0 {
        errors.push(ValidationError::Invalid {
            field: "retries.max_attempts",
            reason: "must be at least 1 when retries are enabled".to_string(),
        });
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::Invalid {
            field: "observability.log_format",
            reason: format!("expected \"pretty\" or \"json\", got {:?}", config.observability.log_format),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::Invalid {
            field: "observability.metrics_address",
            reason: format!("not a socket address: {:?}", config.observability.metrics_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Missing(field));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Missing(field));
        return;
    }
    match Url::parse(value) {
        Ok(url) if url.cannot_be_a_base() => errors.push(ValidationError::Invalid {
            field,
            reason: "cannot be used as a base URL".to_string(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::Invalid {
            field,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.api.version = "v1".into();
        config.auth.secret = "secret".into();
        config.services.identity_url = "http://127.0.0.1:4000".into();
        config.services.words_url = "http://127.0.0.1:4001".into();
        config.database.host = "localhost".into();
        config.database.user = "gateway".into();
        config.database.password = Some(String::new());
        config.database.name = "lingo".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_default_config_reports_every_missing_value() {
        let errors = validate_config(&GatewayConfig::default()).unwrap_err();

        for field in [
            "api.version",
            "auth.secret",
            "database.host",
            "database.user",
            "database.name",
            "database.password",
            "services.identity_url",
            "services.words_url",
        ] {
            assert!(
                errors.contains(&ValidationError::Missing(field)),
                "expected {} to be reported, got {:?}",
                field,
                errors
            );
        }
    }

    #[test]
    fn test_rejects_bad_url_and_ranges() {
        let mut config = valid_config();
        config.services.words_url = "not a url".into();
        config.listener.port = 0;
        config.database.max_connections = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::Invalid { .. })));
    }

    #[test]
    fn test_retry_attempts_only_checked_when_enabled() {
        let mut config = valid_config();
        config.retries.max_attempts = 0;
        assert!(validate_config(&config).is_err());

        config.retries.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "localhost".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::Invalid { field: "observability.metrics_address", .. }]
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ValidationError::Missing("auth.secret").to_string(),
            "auth.secret is required"
        );
    }
}

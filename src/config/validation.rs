//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (recovery names a configured service)
//! - Validate value ranges (timeouts > 0, endpoints parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConsoleConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{ConsoleConfig, WireFormat};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.timeout_secs == 0 {
        errors.push(ValidationError::new("transport.timeout_secs", "must be greater than 0"));
    }

    for (name, service) in &config.services {
        let prefix = format!("services.{name}");
        if service.urls.is_empty() {
            errors.push(ValidationError::new(format!("{prefix}.urls"), "at least one URL is required"));
        }
        for raw in &service.urls {
            if let Err(e) = url::Url::parse(raw) {
                errors.push(ValidationError::new(format!("{prefix}.urls"), format!("'{raw}': {e}")));
            }
        }
        if service.wire == WireFormat::Keyed && service.method_field.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.method_field"),
                "keyed wire format needs a method field",
            ));
        }
    }

    let recovery = &config.recovery;
    if recovery.enabled {
        if recovery.sentinel.is_empty() {
            errors.push(ValidationError::new("recovery.sentinel", "must not be empty"));
        }
        if recovery.max_attempts == 0 {
            errors.push(ValidationError::new("recovery.max_attempts", "must be at least 1"));
        }
        if !config.services.contains_key(&recovery.bootstrap_service) {
            errors.push(ValidationError::new(
                "recovery.bootstrap_service",
                format!("unknown service '{}'", recovery.bootstrap_service),
            ));
        }
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not one of {}", observability.log_level, LOG_LEVELS.join(", ")),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ConsoleConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = ConsoleConfig::default();
        config.transport.timeout_secs = 0;
        config.recovery.bootstrap_service = "missing".into();
        config.services.insert("broken".into(), ServiceConfig {
            urls: vec!["not a url".into()],
            method_field: String::new(),
            ..Default::default()
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "transport.timeout_secs",
                "services.broken.urls",
                "services.broken.method_field",
                "recovery.bootstrap_service",
            ]
        );
    }

    #[test]
    fn test_recovery_checks_skipped_when_disabled() {
        let mut config = ConsoleConfig::default();
        config.recovery.enabled = false;
        config.recovery.max_attempts = 0;
        assert!(validate_config(&config).is_ok());
    }
}

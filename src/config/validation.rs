//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the bootstrap route can be built
//! - Check the control-plane endpoint is complete when enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs after every configuration layer has been merged

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::ProxyTarget;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("routing.primary_domain must not be empty")]
    EmptyPrimaryDomain,

    #[error("routing.default_target is invalid: {0}")]
    InvalidDefaultTarget(String),

    #[error("{field} is not a socket address: '{value}'")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("control_plane.scheme must be 'ws' or 'wss', got '{0}'")]
    InvalidScheme(String),

    #[error("control_plane.{0} must be set when the control plane is enabled")]
    MissingControlPlaneField(&'static str),

    #[error("control_plane.dial_timeout_secs must be greater than zero")]
    ZeroDialTimeout,

    #[error("control_plane.retry_delay_ms must be greater than zero")]
    ZeroRetryDelay,

    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routing.primary_domain.trim().is_empty() {
        errors.push(ValidationError::EmptyPrimaryDomain);
    }

    if let Err(e) = ProxyTarget::parse(&config.routing.default_target) {
        errors.push(ValidationError::InvalidDefaultTarget(e.to_string()));
    }

    check_bind(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    let cp = &config.control_plane;
    if cp.enabled {
        if cp.scheme != "ws" && cp.scheme != "wss" {
            errors.push(ValidationError::InvalidScheme(cp.scheme.clone()));
        }
        if cp.host.is_empty() {
            errors.push(ValidationError::MissingControlPlaneField("host"));
        }
        if cp.secret.is_empty() {
            errors.push(ValidationError::MissingControlPlaneField("secret"));
        }
        if cp.dial_timeout_secs == 0 {
            errors.push(ValidationError::ZeroDialTimeout);
        }
        if cp.retry_delay_ms == 0 {
            errors.push(ValidationError::ZeroRetryDelay);
        }
    }

    if config.admin.enabled {
        check_bind(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if config.observability.metrics_enabled {
        check_bind(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_bind(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.control_plane.host = "cp.example.com".into();
        config.control_plane.secret = "token".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid();
        config.routing.primary_domain = String::new();
        config.routing.default_target = "origin".into();
        config.control_plane.scheme = "http".into();
        config.control_plane.secret = String::new();
        config.control_plane.dial_timeout_secs = 0;
        config.listener.tls = Some(TlsConfig {
            cert_path: String::new(),
            key_path: "key.pem".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::EmptyPrimaryDomain));
        assert!(errors.contains(&ValidationError::InvalidScheme("http".into())));
        assert!(errors.contains(&ValidationError::MissingControlPlaneField("secret")));
        assert!(errors.contains(&ValidationError::ZeroDialTimeout));
        assert!(errors.contains(&ValidationError::EmptyTlsPath("cert_path")));
    }

    #[test]
    fn test_zero_retry_delay_is_rejected() {
        let mut config = valid();
        config.control_plane.retry_delay_ms = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::ZeroRetryDelay])
        );

        config.control_plane.enabled = false;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_disabled_control_plane_needs_no_endpoint() {
        let mut config = GatewayConfig::default();
        config.control_plane.enabled = false;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_bad_bind_addresses() {
        let mut config = valid();
        config.listener.bind_address = "localhost".into();
        config.admin.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}

//! Routing error definitions.

use thiserror::Error;

/// Why a forward target could not be turned into a proxy action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    /// The target is not a parseable absolute URL.
    #[error("invalid target URL '{target}': {reason}")]
    InvalidUrl { target: String, reason: String },

    /// The target parsed but uses a scheme the forwarder cannot speak.
    #[error("unsupported target scheme '{0}' (only http and https are forwarded)")]
    UnsupportedScheme(String),

    /// The target has no host component.
    #[error("target URL '{0}' has no host")]
    MissingHost(String),
}

impl TargetError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TargetError::InvalidUrl { .. } => "invalid_url",
            TargetError::UnsupportedScheme(_) => "unsupported_scheme",
            TargetError::MissingHost(_) => "missing_host",
        }
    }
}

/// Errors raised while building the routing table.
///
/// These only occur at startup and are fatal: without a bootstrap route
/// the gateway has nowhere to send unmatched traffic.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("primary domain must not be empty")]
    EmptyPrimaryDomain,

    #[error("default target is unusable: {0}")]
    InvalidDefaultTarget(#[from] TargetError),
}

/// Result type for routing table construction.
pub type RoutingResult<T> = Result<T, RoutingError>;

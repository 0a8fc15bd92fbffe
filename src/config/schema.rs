//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Primary domain and bootstrap route.
    pub routing: RoutingConfig,

    /// Control-plane connection settings.
    pub control_plane: ControlPlaneConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Introspection listener.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Primary domain and the backend that serves everything unmatched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Domain matched by exact equality; owns the bootstrap route.
    pub primary_domain: String,

    /// Backend for the bootstrap `/` route.
    pub default_target: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            primary_domain: "localhost".to_string(),
            default_target: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Control-plane connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Connect to the control plane at all.
    pub enabled: bool,

    /// `ws` or `wss`.
    pub scheme: String,

    /// Control-plane host, optionally with port.
    pub host: String,

    /// Access credential, sent as the last path segment.
    pub secret: String,

    /// Per-attempt dial timeout in seconds.
    pub dial_timeout_secs: u64,

    /// Delay between reconnect attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl ControlPlaneConfig {
    /// Full endpoint URL, credential included.
    pub fn endpoint(&self) -> String {
        format!("{}://{}/router/{}", self.scheme, self.host, self.secret)
    }

    /// Endpoint safe for logs.
    pub fn redacted_endpoint(&self) -> String {
        format!("{}://{}/router/***", self.scheme, self.host)
    }
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scheme: "wss".to_string(),
            host: String::new(),
            secret: String::new(),
            dial_timeout_secs: 5,
            retry_delay_ms: 1000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds. Unset leaves requests unbounded.
    pub request_secs: Option<u64>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "dynamic_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Introspection listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the introspection endpoints.
    pub enabled: bool,

    /// Bind address for the introspection listener.
    pub bind_address: String,

    /// Bearer token required when set.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:9901".to_string(),
            api_key: None,
        }
    }
}

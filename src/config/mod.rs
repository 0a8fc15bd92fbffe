//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → config file (TOML, loader.rs)
//!     → environment overrides (loader.rs)
//!     → command-line flags (main.rs)
//!     → validation.rs (semantic checks, all errors at once)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes change through the control plane, not here
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, ConfigError};
pub use schema::{
    AdminConfig, ControlPlaneConfig, GatewayConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RoutingConfig, TimeoutConfig, TlsConfig,
};
pub use validation::ValidationError;

//! Dynamic multi-tenant HTTP gateway library.
//!
//! Routes inbound requests by (Host, first path segment) to backend URLs.
//! The routing table is pushed at runtime by a control plane over a
//! WebSocket; anything unmatched goes to the bootstrap route.

// Core subsystems
pub mod config;
pub mod control_plane;
pub mod http;
pub mod routing;

// Operator surface
pub mod admin;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routing::RoutingTable;

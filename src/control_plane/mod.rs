//! Control-plane subsystem.
//!
//! # Data Flow
//! ```text
//! control plane (WebSocket, {scheme}://{host}/router/{secret})
//!     → client.rs (connect / read / reconnect state machine)
//!     → codec.rs (JSON frame → Vec<TenantMetadata>)
//!     → RoutingTable::apply, one tenant at a time
//! ```

pub mod client;
pub mod codec;

pub use client::{ConnectionState, ControlPlaneClient, ControlPlaneError};

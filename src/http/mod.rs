//! Public HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → dispatch.rs (Host + first path segment → routing table)
//!     → forward.rs (rewrite URI and headers, stream to backend)
//!     → Send backend response to client
//! ```

pub mod dispatch;
pub mod forward;
pub mod request;
pub mod server;

pub use forward::{build_client, HttpClient};
pub use request::{GatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Control plane push (TenantMetadata)
//!     → table.rs (take lock)
//!     → reconcile.rs (drop tenant's old entries, build new ones)
//!     → target.rs (parse forward target once per route)
//!     → domain.rs (insert into per-pattern table, prune empty ones)
//!
//! Incoming request (host, path)
//!     → matcher.rs (derive path prefix, match host)
//!     → table.rs (exact primary lookup or first matching pattern)
//!     → ResolvedRoute, or the bootstrap route as fallback
//! ```
//!
//! # Design Decisions
//! - Routes are immutable; a push rebuilds them instead of mutating in place
//! - Reconciliation is replace-by-tenant, never an incremental diff
//! - A bad route is skipped on its own and never fails the whole push

pub mod domain;
pub mod error;
pub mod matcher;
pub mod reconcile;
pub mod route;
pub mod table;
pub mod target;

pub use domain::ResolvedRoute;
pub use error::{RoutingError, TargetError};
pub use reconcile::{ReconcileReport, SkipReason};
pub use route::{Route, TenantMetadata};
pub use table::{RoutingSnapshot, RoutingTable};
pub use target::ProxyTarget;

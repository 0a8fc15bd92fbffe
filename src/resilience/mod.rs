//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Control-plane dial or read fails:
//!     → backoff.rs (fixed delay + jitter)
//!     → next dial attempt, bounded by the dial timeout
//! ```
//!
//! # Design Decisions
//! - No attempt limit: the gateway keeps serving with its last known routes
//!   and reconnects for as long as the process lives
//! - No exponential growth; the delay only has to avoid a hot loop

pub mod backoff;

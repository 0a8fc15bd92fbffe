//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Routing table → Control-plane client → Listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Close control-plane connection → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, run_until, StartupError};

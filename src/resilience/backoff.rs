//! Reconnect delay with jitter.

use rand::Rng;
use std::time::Duration;

/// Fixed reconnect delay plus up to 10% jitter.
///
/// The control plane is retried forever at a steady pace; the jitter only
/// keeps a fleet of gateways from reconnecting in lockstep after an outage.
pub fn reconnect_delay(base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let jitter_range = base_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(base_ms + jitter)
}

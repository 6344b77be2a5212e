//! Timing profile for the adaptive read loop.

use std::time::Duration;

/// Timing profile governing reads, pacing, and settle behavior.
///
/// Network devices emit output in bursts with no framing, so response
/// boundaries are inferred from time: a short idle gap ends a read
/// early, a marker sighting ends it after a settle check, and the
/// ceiling bounds the total wait for slow or silent devices.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Ceiling on the total time spent collecting one response.
    pub max_wait: Duration,

    /// Idle gap after the last received data that ends a read early,
    /// once at least some output has arrived.
    pub idle_threshold: Duration,

    /// Grace period after a prompt marker is sighted. The read only
    /// stops if no further data arrives within this window.
    pub settle_delay: Duration,

    /// How long each poll waits for data before re-checking deadlines.
    pub poll_interval: Duration,

    /// Wait after the wake-up newline before sampling the prompt.
    pub prompt_delay: Duration,

    /// Wait after the shell opens before draining the login banner.
    pub banner_delay: Duration,

    /// Pause inserted between consecutive commands in a batch.
    pub pacing: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(3),
            idle_threshold: Duration::from_millis(300),
            settle_delay: Duration::from_millis(100),
            poll_interval: Duration::from_millis(50),
            prompt_delay: Duration::from_millis(500),
            banner_delay: Duration::from_secs(1),
            pacing: Duration::from_millis(100),
        }
    }
}

impl Timing {
    /// Set the per-response ceiling.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the idle gap that ends a read early.
    pub fn with_idle_threshold(mut self, idle_threshold: Duration) -> Self {
        self.idle_threshold = idle_threshold;
        self
    }
}

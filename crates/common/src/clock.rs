//! Recording clock for per-track offset measurement.
//!
//! Every recording cycle is anchored to a monotonic epoch captured when the
//! primary (video) capture starts. Secondary audio captures measure their
//! start delay against that epoch; the resulting millisecond offsets feed the
//! merge planner's delay filters.

use std::time::Instant;

/// A recording clock anchored to the moment the primary capture started.
#[derive(Debug, Clone)]
pub struct RecordingClock {
    /// The instant the recording cycle started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl RecordingClock {
    /// Create a new recording clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since the cycle started.
    ///
    /// Monotonic, so the value is non-negative; this is the offset recorded
    /// for an audio track that starts now.
    pub fn elapsed_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Seconds elapsed since the cycle started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at cycle start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

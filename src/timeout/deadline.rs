/*!
 * Deadlines
 *
 * The clock behind a countdown: a start instant plus a whole-second bound.
 */

use std::time::{Duration, Instant};

/// Fixed point in time a bounded call must finish by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    duration: Duration,
}

impl Deadline {
    /// Deadline `timeout_seconds` from now
    pub fn after_secs(timeout_seconds: u64) -> Self {
        Self::after(Duration::from_secs(timeout_seconds))
    }

    /// Deadline `duration` from now
    pub fn after(duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration,
        }
    }

    /// Instant at which the deadline fires
    pub fn expires_at(&self) -> Instant {
        self.start + self.duration
    }

    /// Check if the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.start.elapsed() >= self.duration
    }

    /// Time left before the deadline, zero once expired
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.start.elapsed())
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

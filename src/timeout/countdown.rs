/*!
 * Countdown Guard
 *
 * An armed deadline for one bounded call. Dropping the guard disarms it, so
 * every exit path of the call (value, target error, target panic, timeout)
 * leaves no countdown behind.
 */

use super::{CancellationToken, Deadline};
use crate::core::guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// RAII countdown armed for the duration of a bounded call
pub struct Countdown {
    deadline: Deadline,
    token: CancellationToken,
    armed: Arc<AtomicUsize>,
    metadata: GuardMetadata,
    active: bool,
}

impl Countdown {
    /// Arm a countdown and count it in `armed` until it is released
    pub fn arm(timeout_seconds: u64, token: CancellationToken, armed: Arc<AtomicUsize>) -> Self {
        armed.fetch_add(1, Ordering::AcqRel);
        let countdown = Self {
            deadline: Deadline::after_secs(timeout_seconds),
            token,
            armed,
            metadata: GuardMetadata::new("countdown"),
            active: true,
        };
        debug!(
            resource = countdown.resource_type(),
            timeout_ms = countdown.deadline.duration().as_millis() as u64,
            "countdown armed"
        );
        countdown
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// The deadline elapsed: cancel the call, then release
    pub fn fire(mut self) {
        self.token.cancel();
        debug!(
            resource = self.resource_type(),
            elapsed_ms = self.deadline.elapsed().as_millis() as u64,
            expired = self.deadline.is_expired(),
            "countdown fired"
        );
        let _ = self.release();
    }
}

impl Guard for Countdown {
    fn resource_type(&self) -> &'static str {
        "countdown"
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }
        self.active = false;
        self.armed.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }
}

impl GuardDrop for Countdown {
    fn on_drop(&mut self) {
        if self.release().is_ok() {
            debug!(
                resource = self.resource_type(),
                lifetime_us = self.metadata().lifetime_micros(),
                remaining_ms = self.deadline.remaining().as_millis() as u64,
                "countdown disarmed"
            );
        }
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("resource", &self.resource_type())
            .field("timeout", &self.deadline.duration())
            .field("remaining", &self.deadline.remaining())
            .field("expired", &self.deadline.is_expired())
            .field("active", &self.active)
            .finish()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.on_drop();
    }
}

/*!
 * RAII Resource Guards
 *
 * Scoped ownership for the per-call resources of a bounded invocation.
 *
 * ## Guard Types
 *
 * - **Countdown**: an armed deadline, disarmed on drop
 * - **InFlightGuard**: a worker's registry entry, removed on drop
 *
 * Both are released on every exit path: normal return, target error,
 * target panic, and timeout.
 */

mod traits;

pub use traits::{Guard, GuardDrop};

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}

/*!
 * Limits and Constants
 *
 * Bounds and defaults shared by the invoker and its configuration.
 */

// =============================================================================
// TIMEOUT BOUNDS
// =============================================================================

/// Smallest accepted timeout (1s)
/// Zero is rejected so that a bound never reads as "disabled"
pub const MIN_TIMEOUT_SECONDS: u64 = 1;

/// Largest accepted timeout (one year)
/// Keeps `Instant + Duration` far from overflow on every platform
pub const MAX_TIMEOUT_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Timeout used by `InvokerConfig::default()` (30s)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

// =============================================================================
// WORKER THREADS
// =============================================================================

/// Prefix for worker thread names: `<prefix>-<function>`
pub const DEFAULT_WORKER_NAME: &str = "bounded-call";

/// Label for calls whose target has no name (spans, thread names, registry)
pub const ANONYMOUS_TARGET: &str = "anonymous";

/// Smallest stack a worker may be configured with (64KB)
pub const MIN_WORKER_STACK_SIZE: usize = 64 * 1024;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable read by `InvokerConfig::from_env`
pub const ENV_TIMEOUT_SECONDS: &str = "BOUNDED_CALL_TIMEOUT_SECS";

/// Environment variable read by `InvokerConfig::from_env`
pub const ENV_WORKER_NAME: &str = "BOUNDED_CALL_WORKER_NAME";

/// Enables JSON output in `init_tracing`
pub const ENV_TRACE_JSON: &str = "BOUNDED_CALL_TRACE_JSON";

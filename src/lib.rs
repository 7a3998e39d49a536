/*!
 * Bounded Call
 * Time-bounded invocation of synchronous functions
 *
 * Wrap any function with a `TimeoutInvoker`; calling the wrapper returns the
 * function's value, or a logged `TimeoutExceededError` once the configured
 * number of seconds has passed.
 */

pub mod core;
pub mod errors;
pub mod monitoring;
pub mod timeout;

// Re-exports
pub use errors::{
    CallError, CallResult, ConfigurationError, LoggedError, TimeoutExceededError,
};
pub use monitoring::{default_log_sink, init_tracing, LogSink};
pub use timeout::{
    Bounded, CancellationToken, InFlightCall, InvokerConfig, Target, TimeoutInvoker,
};

/*!
 * Log Sinks
 *
 * The collaborator a failure is recorded through before it is returned.
 */

use std::sync::Arc;

/// Callable that records a failure message
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Process-wide error-level logger
pub fn default_log_sink() -> LogSink {
    Arc::new(|message: &str| {
        tracing::error!(target: "bounded_call", "{}", message);
    })
}

/*!
 * Monitoring
 * Structured tracing and the log sinks failures are recorded through
 */

mod sink;
mod tracer;

pub use sink::{default_log_sink, LogSink};
pub use tracer::{generate_call_id, init_tracing, CallSpan};

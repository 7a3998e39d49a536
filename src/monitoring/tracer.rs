/*!
 * Call Tracing
 * Structured tracing for bounded invocations using the tracing crate
 *
 * Features:
 * - One span per bounded call, correlated by call id
 * - JSON-formatted logs for structured parsing
 * - Outcome and duration recorded when the call returns
 */

use crate::core::limits::ENV_TRACE_JSON;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - BOUNDED_CALL_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Generate a unique id for call correlation
pub fn generate_call_id() -> Uuid {
    Uuid::new_v4()
}

/// Span covering one bounded invocation
pub struct CallSpan {
    span: tracing::Span,
    start: Instant,
    call_id: Uuid,
    function: String,
    timeout_seconds: u64,
}

impl CallSpan {
    pub fn new(call_id: Uuid, function: &str, timeout_seconds: u64) -> Self {
        let span = span!(
            Level::DEBUG,
            "bounded_call",
            call_id = %call_id,
            function = function,
            timeout_seconds = timeout_seconds,
            result = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        span.in_scope(|| {
            debug!(
                call_id = %call_id,
                function = function,
                timeout_seconds,
                "bounded call started"
            );
        });

        Self {
            span,
            start: Instant::now(),
            call_id,
            function: function.to_string(),
            timeout_seconds,
        }
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// Record the call outcome ("ok", "error", "timeout", "panic", ...)
    pub fn record_result(&self, result: &'static str) {
        self.span.record("result", result);
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Log that the worker was left running past its deadline
    pub fn record_abandoned(&self) {
        self.record_result("timeout");
        let _entered = self.span.enter();
        warn!(
            call_id = %self.call_id,
            function = %self.function,
            timeout_seconds = self.timeout_seconds,
            "worker abandoned after deadline"
        );
    }
}

impl Drop for CallSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_ms", duration.as_millis() as u64);
        let _entered = self.span.enter();
        debug!(
            call_id = %self.call_id,
            function = %self.function,
            duration_ms = duration.as_millis() as u64,
            "bounded call returned"
        );
    }
}

/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 *
 * Failures raised by a bounded call are recorded through a log sink while
 * they are being constructed, so a failure that is later caught and dropped
 * still leaves a log entry behind.
 */

use crate::core::limits::{MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS};
use crate::monitoring::default_log_sink;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;

/// Invalid invoker configuration, surfaced at construction time
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigurationError {
    #[error("Timeout must be a positive number of seconds, got {0}")]
    #[diagnostic(
        code(config::non_positive_timeout),
        help("A bound of zero or less is neither 'immediate' nor 'disabled'. Pass at least 1.")
    )]
    NonPositiveTimeout(i64),

    #[error("Timeout of {value}s exceeds the maximum of {max}s")]
    #[diagnostic(code(config::timeout_too_large))]
    TimeoutTooLarge { value: u64, max: u64 },

    #[error("Worker stack size of {size} bytes is below the minimum of {min} bytes")]
    #[diagnostic(code(config::stack_too_small))]
    StackTooSmall { size: usize, min: usize },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(config::invalid),
        help("Check the JSON document or the BOUNDED_CALL_* environment variables.")
    )]
    InvalidConfig(String),
}

/// Validate a raw timeout and convert it to whole seconds
pub fn validate_timeout_seconds(timeout_seconds: i64) -> Result<u64, ConfigurationError> {
    if timeout_seconds < MIN_TIMEOUT_SECONDS as i64 {
        return Err(ConfigurationError::NonPositiveTimeout(timeout_seconds));
    }
    let value = timeout_seconds as u64;
    if value > MAX_TIMEOUT_SECONDS {
        return Err(ConfigurationError::TimeoutTooLarge {
            value,
            max: MAX_TIMEOUT_SECONDS,
        });
    }
    Ok(value)
}

/// A failure that was logged before it was handed to anyone
///
/// The only way to obtain one is through a constructor that first passes the
/// message to a log sink.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
#[error("{message}")]
pub struct LoggedError {
    message: String,
}

impl LoggedError {
    /// Log `message` at error level, then build the failure
    pub fn new(message: impl Into<String>) -> Self {
        let sink = default_log_sink();
        Self::with_sink(message, sink.as_ref())
    }

    /// Log `message` through `sink`, then build the failure
    pub fn with_sink(message: impl Into<String>, sink: impl Fn(&str)) -> Self {
        let message = message.into();
        sink(&message);
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A bounded call did not complete within its timeout
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Diagnostic)]
#[error("{logged}")]
#[diagnostic(
    code(timeout::exceeded),
    help("The target was abandoned, not rolled back. Its partial side effects remain.")
)]
pub struct TimeoutExceededError {
    function_name: Option<String>,
    timeout_seconds: u64,
    #[serde(rename = "message")]
    logged: LoggedError,
}

impl TimeoutExceededError {
    /// Build and log through the default error-level logger
    pub fn new(function_name: Option<String>, timeout_seconds: u64) -> Self {
        let sink = default_log_sink();
        Self::with_sink(function_name, timeout_seconds, sink.as_ref())
    }

    /// Build and log through `sink`
    pub fn with_sink(
        function_name: Option<String>,
        timeout_seconds: u64,
        sink: impl Fn(&str),
    ) -> Self {
        let message = format_timeout_message(function_name.as_deref(), timeout_seconds);
        let logged = LoggedError::with_sink(message, sink);
        Self {
            function_name,
            timeout_seconds,
            logged,
        }
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn message(&self) -> &str {
        self.logged.message()
    }
}

fn format_timeout_message(function_name: Option<&str>, timeout_seconds: u64) -> String {
    format!(
        "Function '{}' experienced a timeout error; exceeded '{}' seconds.",
        function_name.unwrap_or("None"),
        timeout_seconds
    )
}

/// Failure of a bounded call
///
/// `E` is the target's own error type for fallible targets; infallible
/// targets use the default.
#[derive(Debug, Error)]
pub enum CallError<E = Infallible> {
    /// The deadline fired before the target returned
    #[error(transparent)]
    Timeout(#[from] TimeoutExceededError),

    /// The target returned its own error
    #[error("Operation failed: {0}")]
    Operation(#[source] E),

    /// The worker thread could not be started
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker went away without reporting an outcome
    #[error("Worker for '{0}' exited without reporting a result")]
    WorkerLost(String),
}

impl<E> CallError<E> {
    /// Check if this is a timeout error
    #[inline(always)]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is the target's own error
    #[inline(always)]
    pub fn is_operation_error(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Borrow the timeout failure, if this is one
    pub fn as_timeout(&self) -> Option<&TimeoutExceededError> {
        match self {
            Self::Timeout(e) => Some(e),
            _ => None,
        }
    }

    /// Take the timeout failure, if this is one
    pub fn into_timeout(self) -> Option<TimeoutExceededError> {
        match self {
            Self::Timeout(e) => Some(e),
            _ => None,
        }
    }

    /// Take the target's own error, if this is one
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for bounded calls
pub type CallResult<T, E = Infallible> = Result<T, CallError<E>>;

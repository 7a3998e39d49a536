/*!
 * Invoker Configuration
 *
 * Timeout and worker settings, loadable from JSON or the environment.
 */

use crate::core::limits::*;
use crate::errors::{validate_timeout_seconds, ConfigurationError};
use serde::{Deserialize, Serialize};

/// Configuration for a `TimeoutInvoker`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Whole seconds a call may run (must be positive)
    pub timeout_seconds: i64,

    /// Prefix for worker thread names
    pub worker_name: String,

    /// Worker stack size in bytes (platform default when unset)
    pub stack_size: Option<usize>,
}

impl InvokerConfig {
    /// Create configuration with the given timeout and default worker settings
    pub fn new(timeout_seconds: i64) -> Self {
        Self {
            timeout_seconds,
            ..Self::default()
        }
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: i64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Parse configuration from a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))
    }

    /// Read `BOUNDED_CALL_TIMEOUT_SECS` and `BOUNDED_CALL_WORKER_NAME`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECONDS) {
            config.timeout_seconds = raw.trim().parse().map_err(|_| {
                ConfigurationError::InvalidConfig(format!(
                    "{ENV_TIMEOUT_SECONDS} is not an integer: {raw:?}"
                ))
            })?;
        }
        if let Ok(name) = std::env::var(ENV_WORKER_NAME) {
            config.worker_name = name;
        }

        Ok(config)
    }

    /// Check every field; returns the timeout in whole seconds
    pub fn validate(&self) -> Result<u64, ConfigurationError> {
        let timeout_seconds = validate_timeout_seconds(self.timeout_seconds)?;

        if self.worker_name.is_empty() || self.worker_name.contains('\0') {
            return Err(ConfigurationError::InvalidConfig(format!(
                "worker name must be non-empty and free of NUL bytes: {:?}",
                self.worker_name
            )));
        }
        if let Some(size) = self.stack_size {
            if size < MIN_WORKER_STACK_SIZE {
                return Err(ConfigurationError::StackTooSmall {
                    size,
                    min: MIN_WORKER_STACK_SIZE,
                });
            }
        }

        Ok(timeout_seconds)
    }
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS as i64,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            stack_size: None,
        }
    }
}

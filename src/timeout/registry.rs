/*!
 * In-Flight Registry
 *
 * Tracks which targets are executing through an invoker. Each entry is owned
 * by the worker running the target and disappears when the target returns,
 * including workers abandoned after their deadline.
 */

use crate::core::guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// One executing target
#[derive(Debug, Clone)]
pub struct InFlightCall {
    pub call_id: Uuid,
    pub function: String,
    pub timeout_seconds: u64,
    pub started: Instant,
}

/// Registry of executing targets, keyed by call id
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    calls: Mutex<HashMap<Uuid, InFlightCall>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call; the entry lives as long as the returned guard
    pub fn register(
        self: &Arc<Self>,
        call_id: Uuid,
        function: &str,
        timeout_seconds: u64,
    ) -> InFlightGuard {
        self.calls.lock().insert(
            call_id,
            InFlightCall {
                call_id,
                function: function.to_string(),
                timeout_seconds,
                started: Instant::now(),
            },
        );
        InFlightGuard {
            call_id,
            registry: Arc::clone(self),
            metadata: GuardMetadata::new("in_flight"),
            active: true,
        }
    }

    /// Snapshot of executing calls, oldest first
    pub fn snapshot(&self) -> Vec<InFlightCall> {
        let mut calls: Vec<_> = self.calls.lock().values().cloned().collect();
        calls.sort_by_key(|c| c.started);
        calls
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, call_id: &Uuid) -> bool {
        self.calls.lock().remove(call_id).is_some()
    }
}

/// Registry entry owned by a worker
pub struct InFlightGuard {
    call_id: Uuid,
    registry: Arc<InFlightRegistry>,
    metadata: GuardMetadata,
    active: bool,
}

impl Guard for InFlightGuard {
    fn resource_type(&self) -> &'static str {
        "in_flight"
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
        self.registry.remove(&self.call_id);
        Ok(())
    }
}

impl GuardDrop for InFlightGuard {
    fn on_drop(&mut self) {
        if self.release().is_ok() {
            debug!(
                resource = self.resource_type(),
                call_id = %self.call_id,
                lifetime_us = self.metadata().lifetime_micros(),
                "target returned"
            );
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.on_drop();
    }
}

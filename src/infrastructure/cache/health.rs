//! Backend availability flag driven by connection lifecycle events

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::domain::cache::ConnectionEvent;

/// Whether the networked backend should currently be used.
///
/// Only lifecycle events change the flag. A stale read costs at most one
/// extra fallback or one extra failed backend attempt.
#[derive(Debug, Default)]
pub struct BackendHealth {
    available: AtomicBool,
}

impl BackendHealth {
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Applies a lifecycle event, returning the new availability when it changed
    pub(crate) fn apply(&self, event: &ConnectionEvent) -> Option<bool> {
        let Some(available) = event.availability() else {
            info!(event = %event, "Cache backend lifecycle event");
            return None;
        };

        let previous = self.available.swap(available, Ordering::AcqRel);
        if previous == available {
            return None;
        }

        if available {
            info!(event = %event, "Cache backend available again, routing to networked backend");
        } else {
            warn!(event = %event, "Cache backend unavailable, switching to local store");
        }

        Some(available)
    }
}

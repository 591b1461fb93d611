//! Progress indicator.
//!
//! Tracks at most one in-flight dispatch. A newer dispatch replaces the
//! tracked one; completions of untracked dispatches leave the indicator
//! alone. Tracking never blocks or serializes calls.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use uuid::Uuid;

use crate::fields::store::FieldStore;

#[derive(Debug)]
struct InFlight {
    id: Uuid,
    label: String,
    started: Instant,
}

/// Progress indicator bound to one field.
pub struct ProgressIndicator {
    store: Arc<dyn FieldStore>,
    field: String,
    current: Mutex<Option<InFlight>>,
}

impl ProgressIndicator {
    pub fn new(store: Arc<dyn FieldStore>, field: impl Into<String>) -> Self {
        Self {
            store,
            field: field.into(),
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<InFlight>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start tracking a dispatch.
    pub fn begin(&self, id: Uuid, label: &str) {
        let mut current = self.lock();
        if let Some(previous) = current.as_ref() {
            tracing::debug!(previous = %previous.label, next = %label, "Progress indicator replaced");
        }
        *current = Some(InFlight {
            id,
            label: label.to_string(),
            started: Instant::now(),
        });
        self.store.set(&self.field, &format!("{label}: waiting"));
    }

    /// Finish a dispatch. Returns false if it was no longer tracked.
    pub fn finish(&self, id: Uuid, ok: bool) -> bool {
        let mut current = self.lock();
        match current.as_ref() {
            Some(tracked) if tracked.id == id => {
                let elapsed = tracked.started.elapsed().as_millis();
                let status = if ok { "done" } else { "failed" };
                self.store
                    .set(&self.field, &format!("{}: {status} ({elapsed} ms)", tracked.label));
                *current = None;
                true
            }
            _ => false,
        }
    }

    /// Label of the tracked dispatch.
    pub fn in_flight(&self) -> Option<String> {
        self.lock().as_ref().map(|f| f.label.clone())
    }
}

impl std::fmt::Debug for ProgressIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressIndicator")
            .field("field", &self.field)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MemoryFieldStore;

    #[test]
    fn test_single_tracked_dispatch() {
        let store = Arc::new(MemoryFieldStore::new());
        let progress = ProgressIndicator::new(store.clone(), "progress");

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        progress.begin(first, "getBlockCount");
        progress.begin(second, "getRawMempool");
        assert_eq!(progress.in_flight().as_deref(), Some("getRawMempool"));

        // The replaced dispatch completes late and is ignored.
        assert!(!progress.finish(first, true));
        assert_eq!(store.get("progress").as_deref(), Some("getRawMempool: waiting"));

        assert!(progress.finish(second, true));
        assert!(progress.in_flight().is_none());
        assert!(store.get("progress").unwrap().starts_with("getRawMempool: done"));
    }
}

use crate::types::Timestamp;
use std::sync::{Arc, Mutex};

/// Receives a [`BucketEvent`] each time a bucket answers a digest request.
///
/// Buckets write nothing to stdout or a logger themselves. Install a listener through
/// [`BucketConfig`](crate::BucketConfig) to count empty ranges per series key or to
/// forward the events into the index's own logging.
pub trait BucketEventListener: std::fmt::Debug + Send + Sync + 'static {
    fn on_event(&self, event: BucketEvent);
}

/// Structured events emitted by buckets. Ranges are the regularized ones.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketEvent {
    DigestComputed {
        key: String,
        range_start: Timestamp,
        range_end: Timestamp,
        samples: usize,
    },
    DigestRangeEmpty {
        key: String,
        range_start: Timestamp,
        range_end: Timestamp,
    },
}

#[derive(Debug)]
pub struct NoopEventListener;

impl BucketEventListener for NoopEventListener {
    #[inline]
    fn on_event(&self, _event: BucketEvent) {}
}

pub fn noop_event_listener() -> Arc<dyn BucketEventListener> {
    Arc::new(NoopEventListener)
}

/// Listener that keeps every event in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingEventListener {
    events: Mutex<Vec<BucketEvent>>,
}

impl RecordingEventListener {
    /// Returns a copy of the events recorded so far, oldest first.
    pub fn events(&self) -> Vec<BucketEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl BucketEventListener for RecordingEventListener {
    fn on_event(&self, event: BucketEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

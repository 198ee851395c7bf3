//! The fixed-window bucket: ordered sample storage for one series over one
//! `[start, end)` window, with range digests.

use crate::digest::{Digest, DigestAlgorithm};
use crate::query::{regularize_range, select_inclusive};
use crate::telemetry::{noop_event_listener, BucketEvent, BucketEventListener};
use crate::types::{Sample, TimeWindow, Timestamp, Value};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Configuration options for a `WindowBucket`.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// Structured event hook for observability (no-op by default).
    pub event_listener: Arc<dyn BucketEventListener>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        BucketConfig {
            event_listener: noop_event_listener(),
        }
    }
}

/// Samples of one series over one fixed time window.
///
/// The window is validated when the [`TimeWindow`] is built and never changes.
/// Inserts are not checked against the window: routing samples to the right
/// bucket is the caller's job. There is no internal synchronization; a bucket
/// is meant to be mutated by a single owner.
#[derive(Debug)]
pub struct WindowBucket {
    key: String,
    window: TimeWindow,
    samples: BTreeMap<Timestamp, Value>,
    config: BucketConfig,
}

impl WindowBucket {
    /// Creates an empty bucket for `key` over `window`.
    pub fn new(key: impl Into<String>, window: TimeWindow) -> Self {
        Self::with_config(key, window, BucketConfig::default())
    }

    /// Creates an empty bucket with the provided configuration.
    pub fn with_config(key: impl Into<String>, window: TimeWindow, config: BucketConfig) -> Self {
        WindowBucket {
            key: key.into(),
            window,
            samples: BTreeMap::new(),
            config,
        }
    }

    /// Stores `value` at `timestamp`, replacing any previous value there.
    pub fn insert(&mut self, timestamp: Timestamp, value: Value) {
        self.samples.insert(timestamp, value);
    }

    pub fn insert_sample(&mut self, (timestamp, value): Sample) {
        self.insert(timestamp, value);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns true if `timestamp` falls in the bucket's `[start, end)` window.
    pub fn covers(&self, timestamp: Timestamp) -> bool {
        self.window.contains(timestamp)
    }

    pub fn covers_sample(&self, sample: &Sample) -> bool {
        self.covers(sample.0)
    }

    /// Number of stored samples, whether or not they are covered by the window.
    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn window_start(&self) -> Timestamp {
        self.window.start()
    }

    pub fn window_end(&self) -> Timestamp {
        self.window.end()
    }

    pub fn window_duration(&self) -> i64 {
        self.window.duration()
    }

    /// Borrowed view of all samples in ascending timestamp order.
    pub fn samples(&self) -> impl DoubleEndedIterator<Item = Sample> + ExactSizeIterator + '_ {
        self.samples.iter().map(|(&ts, &value)| (ts, value))
    }

    /// Borrowed view of the samples with `start <= ts <= end`, ascending.
    pub fn range_samples(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> impl DoubleEndedIterator<Item = Sample> + '_ {
        select_inclusive(&self.samples, start, end).map(|(&ts, &value)| (ts, value))
    }

    /// See [`crate::query::regularize_range`].
    pub fn regularize_range(
        query_start: Timestamp,
        query_end: Timestamp,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> (Timestamp, Timestamp) {
        regularize_range(query_start, query_end, window_start, window_end)
    }

    /// Digests the samples of a query range.
    ///
    /// The range is first regularized against the window (`UNBOUNDED` means
    /// open on that side), then samples are selected inclusively on both ends.
    /// An empty selection yields [`Digest::empty_marker`] without calling
    /// `algorithm`.
    pub fn digest<A: DigestAlgorithm>(
        &self,
        algorithm: &A,
        range_start: Timestamp,
        range_end: Timestamp,
    ) -> A::Output {
        let (actual_start, actual_end) = regularize_range(
            range_start,
            range_end,
            self.window.start(),
            self.window.end(),
        );

        let selected: Vec<Sample> = self.range_samples(actual_start, actual_end).collect();
        if selected.is_empty() {
            self.config.event_listener.on_event(BucketEvent::DigestRangeEmpty {
                key: self.key.clone(),
                range_start: actual_start,
                range_end: actual_end,
            });
            return <A::Output as Digest>::empty_marker();
        }

        let digest = algorithm.compute_digest(
            &self.key,
            self.window.start(),
            self.window_duration(),
            &selected,
        );
        self.config.event_listener.on_event(BucketEvent::DigestComputed {
            key: self.key.clone(),
            range_start: actual_start,
            range_end: actual_end,
            samples: selected.len(),
        });
        digest
    }

    /// Digests the bucket's whole window; same as `digest(window_start, window_end)`.
    pub fn digest_window<A: DigestAlgorithm>(&self, algorithm: &A) -> A::Output {
        self.digest(algorithm, self.window.start(), self.window.end())
    }
}

impl Extend<Sample> for WindowBucket {
    fn extend<I: IntoIterator<Item = Sample>>(&mut self, iter: I) {
        self.samples.extend(iter);
    }
}

impl fmt::Display for WindowBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (ts, value)) in self.samples.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", ts, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{SummaryDigest, SummaryDigester};
    use crate::telemetry::RecordingEventListener;
    use crate::types::UNBOUNDED;
    use std::cell::RefCell;

    // Digest algorithm that records what it was handed
    #[derive(Debug, Default)]
    struct CapturingAlgorithm {
        calls: RefCell<Vec<(String, Timestamp, i64, Vec<Sample>)>>,
    }

    #[derive(Debug, PartialEq)]
    enum TestDigest {
        Empty,
        Samples(Vec<Sample>),
    }

    impl Digest for TestDigest {
        fn empty_marker() -> Self {
            TestDigest::Empty
        }

        fn is_empty_marker(&self) -> bool {
            matches!(self, TestDigest::Empty)
        }
    }

    impl DigestAlgorithm for CapturingAlgorithm {
        type Output = TestDigest;

        fn compute_digest(
            &self,
            key: &str,
            window_start: Timestamp,
            window_duration: i64,
            samples: &[Sample],
        ) -> TestDigest {
            self.calls.borrow_mut().push((
                key.to_string(),
                window_start,
                window_duration,
                samples.to_vec(),
            ));
            TestDigest::Samples(samples.to_vec())
        }
    }

    fn create_bucket(start: Timestamp, end: Timestamp) -> WindowBucket {
        WindowBucket::new("test_series", TimeWindow::new(start, end).unwrap())
    }

    #[test]
    fn test_new_bucket_is_empty() {
        let bucket = create_bucket(100, 200);
        assert!(bucket.is_empty());
        assert_eq!(bucket.size(), 0);
        assert_eq!(bucket.key(), "test_series");
        assert_eq!(bucket.window_start(), 100);
        assert_eq!(bucket.window_end(), 200);
        assert_eq!(bucket.window_duration(), 100);
        assert_eq!(bucket.window(), TimeWindow::new(100, 200).unwrap());
        assert_eq!(bucket.samples().count(), 0);
    }

    #[test]
    fn test_covers() {
        let bucket = create_bucket(100, 200);
        for t in [-1, 0, 99, 100, 150, 199, 200, 500] {
            assert_eq!(bucket.covers(t), (100..200).contains(&t), "t={t}");
        }
        assert!(bucket.covers_sample(&(150, 1.0)));
        assert!(!bucket.covers_sample(&(200, 1.0)));
    }

    #[test]
    fn test_insert_overwrites_and_sorts() {
        let mut bucket = create_bucket(0, 100);
        bucket.insert(50, 2.0);
        bucket.insert(10, 1.0);
        bucket.insert(99, 3.0);
        bucket.insert(50, 5.0); // Overwrite

        assert_eq!(bucket.size(), 3);
        assert!(!bucket.is_empty());
        let samples: Vec<_> = bucket.samples().collect();
        assert_eq!(samples, vec![(10, 1.0), (50, 5.0), (99, 3.0)]);

        // The view is double ended
        assert_eq!(bucket.samples().next_back(), Some((99, 3.0)));
        assert_eq!(bucket.samples().len(), 3);
    }

    #[test]
    fn test_insert_does_not_check_window() {
        let mut bucket = create_bucket(0, 100);
        bucket.insert_sample((-20, 1.0));
        bucket.insert_sample((500, 2.0));
        assert_eq!(bucket.size(), 2);
        assert!(!bucket.covers(-20));
        assert!(!bucket.covers(500));
    }

    #[test]
    fn test_extend() {
        let mut bucket = create_bucket(0, 100);
        bucket.extend(vec![(30, 3.0), (10, 1.0), (30, 4.0)]);
        let samples: Vec<_> = bucket.samples().collect();
        assert_eq!(samples, vec![(10, 1.0), (30, 4.0)]);
    }

    #[test]
    fn test_range_samples_is_inclusive() {
        let mut bucket = create_bucket(0, 100);
        bucket.extend([(10, 1.0), (20, 2.0), (30, 3.0)]);
        let selected: Vec<_> = bucket.range_samples(10, 20).collect();
        assert_eq!(selected, vec![(10, 1.0), (20, 2.0)]);
        assert_eq!(bucket.range_samples(30, 10).count(), 0);
    }

    #[test]
    fn test_digest_selects_inclusive_regularized_range() {
        let mut bucket = create_bucket(0, 100);
        bucket.insert(10, 1.0);
        bucket.insert(50, 2.0);
        bucket.insert(99, 3.0);

        let algo = CapturingAlgorithm::default();
        let digest = bucket.digest(&algo, 20, 200);
        assert_eq!(digest, TestDigest::Samples(vec![(50, 2.0), (99, 3.0)]));

        let calls = algo.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "test_series");
        assert_eq!(calls[0].1, 0);
        assert_eq!(calls[0].2, 100);
    }

    #[test]
    fn test_digest_includes_sample_at_window_end() {
        // The window is half-open, but digest ranges are inclusive
        let mut bucket = create_bucket(0, 100);
        bucket.insert(100, 7.0);
        assert!(!bucket.covers(100));

        let algo = CapturingAlgorithm::default();
        assert_eq!(
            bucket.digest_window(&algo),
            TestDigest::Samples(vec![(100, 7.0)])
        );
        // A query entirely after the window collapses onto the end boundary
        assert_eq!(
            bucket.digest(&algo, 150, 300),
            TestDigest::Samples(vec![(100, 7.0)])
        );
    }

    #[test]
    fn test_digest_empty_range_skips_algorithm() {
        let mut bucket = create_bucket(0, 100);
        bucket.insert(10, 1.0);

        let algo = CapturingAlgorithm::default();
        assert_eq!(bucket.digest(&algo, 20, 40), TestDigest::Empty);
        // Before the window: collapses to (0, 0)
        assert_eq!(bucket.digest(&algo, -50, -10), TestDigest::Empty);
        assert!(algo.calls.borrow().is_empty());

        let empty = create_bucket(0, 100);
        assert!(empty.digest_window(&SummaryDigester::default()).is_empty_marker());
    }

    #[test]
    fn test_digest_unbounded_range() {
        let mut bucket = create_bucket(100, 200);
        bucket.extend([(90, 0.5), (100, 1.0), (150, 2.0), (200, 3.0)]);

        let algo = CapturingAlgorithm::default();
        assert_eq!(
            bucket.digest(&algo, UNBOUNDED, UNBOUNDED),
            TestDigest::Samples(vec![(100, 1.0), (150, 2.0), (200, 3.0)])
        );
        assert_eq!(
            bucket.digest(&algo, 150, UNBOUNDED),
            TestDigest::Samples(vec![(150, 2.0), (200, 3.0)])
        );
        assert_eq!(
            bucket.digest(&algo, UNBOUNDED, 120),
            TestDigest::Samples(vec![(100, 1.0)])
        );
    }

    #[test]
    fn test_digest_window_matches_full_range() {
        let mut bucket = create_bucket(0, 1000);
        for i in 0..50 {
            bucket.insert(i * 37 - 100, i as Value);
        }
        let algo = SummaryDigester::default();
        let whole: SummaryDigest = bucket.digest_window(&algo);
        let explicit = bucket.digest(&algo, 0, 1000);
        assert_eq!(whole, explicit);
    }

    #[test]
    fn test_digest_on_widest_window() {
        let mut bucket = WindowBucket::new("wide", TimeWindow::new(0, i64::MAX).unwrap());
        bucket.insert(0, 1.0);
        bucket.insert(i64::MAX - 1, 2.0);

        let digest = bucket.digest_window(&SummaryDigester::default());
        assert_eq!(digest.count, 2);
        assert_eq!(digest.window_duration, i64::MAX);
    }

    #[test]
    fn test_digest_emits_events() {
        let listener = Arc::new(RecordingEventListener::default());
        let config = BucketConfig {
            event_listener: listener.clone(),
        };
        let mut bucket =
            WindowBucket::with_config("events", TimeWindow::new(0, 100).unwrap(), config);
        bucket.insert(10, 1.0);

        let algo = SummaryDigester::default();
        bucket.digest(&algo, 20, 30);
        bucket.digest(&algo, UNBOUNDED, UNBOUNDED);

        assert_eq!(
            listener.events(),
            vec![
                BucketEvent::DigestRangeEmpty {
                    key: "events".to_string(),
                    range_start: 20,
                    range_end: 30,
                },
                BucketEvent::DigestComputed {
                    key: "events".to_string(),
                    range_start: 0,
                    range_end: 100,
                    samples: 1,
                },
            ]
        );
    }

    #[test]
    fn test_display() {
        let mut bucket = create_bucket(0, 100);
        assert_eq!(bucket.to_string(), "{}");
        bucket.insert(50, 2.5);
        bucket.insert(10, 1.0);
        assert_eq!(bucket.to_string(), "{10=1.0, 50=2.5}");
    }

    #[test]
    fn test_regularize_range_associated_fn() {
        assert_eq!(WindowBucket::regularize_range(250, 300, 100, 200), (200, 200));
        assert_eq!(WindowBucket::regularize_range(0, 50, 100, 200), (100, 100));
        assert_eq!(WindowBucket::regularize_range(50, 250, 100, 200), (100, 200));
    }
}

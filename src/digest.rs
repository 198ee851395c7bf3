//! Digest contract used by [`WindowBucket`](crate::WindowBucket) and a default
//! summary-statistics implementation.

use crate::types::{Sample, Timestamp, Value};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The default selection size at which [`SummaryDigester`] switches to rayon.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// A statistical digest of a set of ordered samples.
pub trait Digest: Sized {
    /// The sentinel returned when a range selects no samples.
    fn empty_marker() -> Self;

    /// Returns true if this digest is the empty sentinel.
    fn is_empty_marker(&self) -> bool;
}

/// Computes a digest from a non-empty, timestamp-ascending selection of samples.
///
/// Buckets never call this with an empty slice; they return
/// [`Digest::empty_marker`] instead.
pub trait DigestAlgorithm {
    type Output: Digest;

    fn compute_digest(
        &self,
        key: &str,
        window_start: Timestamp,
        window_duration: i64,
        samples: &[Sample],
    ) -> Self::Output;
}

/// Summary statistics over one bucket range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDigest {
    /// True only for the empty sentinel.
    pub empty: bool,
    pub key: String,
    pub window_start: Timestamp,
    pub window_duration: i64,
    pub count: usize,
    pub first_timestamp: Timestamp,
    pub last_timestamp: Timestamp,
    pub min: Value,
    pub max: Value,
    pub sum: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Digest for SummaryDigest {
    fn empty_marker() -> Self {
        SummaryDigest {
            empty: true,
            key: String::new(),
            window_start: 0,
            window_duration: 0,
            count: 0,
            first_timestamp: 0,
            last_timestamp: 0,
            min: 0.0,
            max: 0.0,
            sum: 0.0,
            mean: 0.0,
            std_dev: 0.0,
        }
    }

    #[inline]
    fn is_empty_marker(&self) -> bool {
        self.empty
    }
}

/// Default [`DigestAlgorithm`] producing a [`SummaryDigest`].
///
/// Selections of at least `parallel_threshold` samples are folded in parallel.
#[derive(Debug, Clone, Copy)]
pub struct SummaryDigester {
    pub parallel_threshold: usize,
}

impl Default for SummaryDigester {
    fn default() -> Self {
        SummaryDigester {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl SummaryDigester {
    pub fn with_parallel_threshold(parallel_threshold: usize) -> Self {
        SummaryDigester { parallel_threshold }
    }
}

impl DigestAlgorithm for SummaryDigester {
    type Output = SummaryDigest;

    fn compute_digest(
        &self,
        key: &str,
        window_start: Timestamp,
        window_duration: i64,
        samples: &[Sample],
    ) -> SummaryDigest {
        if samples.is_empty() {
            return SummaryDigest::empty_marker();
        }

        let acc = if samples.len() >= self.parallel_threshold {
            samples
                .par_iter()
                .fold(Accumulator::default, |mut acc, &sample| {
                    acc.push(sample);
                    acc
                })
                .reduce(Accumulator::default, Accumulator::merge)
        } else {
            samples.iter().fold(Accumulator::default(), |mut acc, &sample| {
                acc.push(sample);
                acc
            })
        };

        let count = acc.count as f64;
        let mean = acc.sum / count;
        let variance = acc.m2 / count;

        SummaryDigest {
            empty: false,
            key: key.to_string(),
            window_start,
            window_duration,
            count: acc.count,
            first_timestamp: acc.first_timestamp,
            last_timestamp: acc.last_timestamp,
            min: acc.min,
            max: acc.max,
            sum: acc.sum,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    first_timestamp: Timestamp,
    last_timestamp: Timestamp,
    min: Value,
    max: Value,
    sum: f64,
    // Running mean and sum of squared deviations (Welford), merged with
    // Chan's pairwise update.
    mean: f64,
    m2: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            count: 0,
            first_timestamp: Timestamp::MAX,
            last_timestamp: Timestamp::MIN,
            min: Value::INFINITY,
            max: Value::NEG_INFINITY,
            sum: 0.0,
            mean: 0.0,
            m2: 0.0,
        }
    }
}

impl Accumulator {
    #[inline]
    fn push(&mut self, (ts, value): Sample) {
        self.count += 1;
        self.first_timestamp = self.first_timestamp.min(ts);
        self.last_timestamp = self.last_timestamp.max(ts);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let v = f64::from(value);
        self.sum += v;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    fn merge(self, other: Accumulator) -> Accumulator {
        if self.count == 0 {
            return other;
        }
        if other.count == 0 {
            return self;
        }

        let count = self.count + other.count;
        let (n_a, n_b, n) = (self.count as f64, other.count as f64, count as f64);
        let delta = other.mean - self.mean;

        Accumulator {
            count,
            first_timestamp: self.first_timestamp.min(other.first_timestamp),
            last_timestamp: self.last_timestamp.max(other.last_timestamp),
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
            mean: self.mean + delta * n_b / n,
            m2: self.m2 + other.m2 + delta * delta * n_a * n_b / n,
        }
    }
}

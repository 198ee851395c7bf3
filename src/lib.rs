#![doc = include_str!("../README.md")]
// Declare modules
pub mod bucket;
pub mod digest;
pub mod error;
pub mod query;
pub mod telemetry;
pub mod types;

/// Fixed-window sample storage for one series.
pub use crate::bucket::WindowBucket;
/// Configuration options for a bucket.
pub use crate::bucket::BucketConfig;
/// Digest contract and the default summary implementation.
pub use crate::digest::{Digest, DigestAlgorithm, SummaryDigest, SummaryDigester};
/// Error type for window construction.
pub use crate::error::BucketError;
/// Range regularization against a window's bounds.
pub use crate::query::regularize_range;
/// Structured event hook for observability.
pub use crate::telemetry::{BucketEvent, BucketEventListener};
/// Core scalar types and the half-open time window.
pub use crate::types::{Sample, TimeWindow, Timestamp, Value, UNBOUNDED};

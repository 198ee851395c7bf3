use thiserror::Error;

use crate::types::Timestamp;

/// Error type for window and bucket construction.
///
/// Digesting never fails: an empty selection is reported through the
/// digest's empty marker, not through this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    #[error("Invalid time window: start={start} is after end={end}")]
    InvalidTimeWindow { start: Timestamp, end: Timestamp },

    #[error("Invalid window duration: start={start}, duration={duration}")]
    DurationOverflow { start: Timestamp, duration: i64 },
}

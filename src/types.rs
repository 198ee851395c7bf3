use crate::error::BucketError;
use serde::{Deserialize, Serialize};

/// Timestamp type (signed, in the index's time unit).
pub type Timestamp = i64;

/// Value type.
pub type Value = f32;

/// A single (timestamp, value) pair.
pub type Sample = (Timestamp, Value);

/// Marker for an open bound in a range query ("no lower/upper bound").
pub const UNBOUNDED: Timestamp = -1;

/// A half-open time interval `[start, end)` owned by one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

// Deserialized windows go through the same check as `TimeWindow::new`.
#[derive(Deserialize)]
struct RawTimeWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = BucketError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Creates a window `[start, end)`.
    ///
    /// # Errors
    /// Returns [`BucketError::InvalidTimeWindow`] if `start > end`, and
    /// [`BucketError::DurationOverflow`] if `end - start` does not fit in `i64`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, BucketError> {
        if start > end {
            return Err(BucketError::InvalidTimeWindow { start, end });
        }
        if end.checked_sub(start).is_none() {
            return Err(BucketError::DurationOverflow {
                start,
                duration: end.wrapping_sub(start),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a window `[start, start + duration)`.
    ///
    /// # Errors
    /// Returns [`BucketError::DurationOverflow`] if the duration is negative or
    /// the end would overflow `i64`.
    pub fn with_duration(start: Timestamp, duration: i64) -> Result<Self, BucketError> {
        if duration < 0 {
            return Err(BucketError::DurationOverflow { start, duration });
        }
        let end = start
            .checked_add(duration)
            .ok_or(BucketError::DurationOverflow { start, duration })?;
        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Length of the window (`end - start`).
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Returns true if `ts` lies in `[start, end)`.
    #[inline]
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts < self.end
    }

    /// A zero-width window covers no timestamp at all.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

use crate::types::{Timestamp, Value, UNBOUNDED};
use std::collections::btree_map::Range;
use std::collections::BTreeMap;

/// Reconciles a query range against a window's `[window_start, window_end)` bounds.
///
/// `UNBOUNDED` (-1) on either side means "no bound" and is replaced by the
/// corresponding window boundary.
///
/// A query starting after the window end collapses to the point
/// `(window_end, window_end)`, and one ending before the window start collapses
/// to `(window_start, window_start)`. These points are not clamped any further.
/// Otherwise each bound is clamped into the window independently.
///
/// An open end never counts as "before the window". An open start is still
/// compared as -1, so a window lying entirely below -1 collapses to its end.
///
/// The result always satisfies `actual_start <= actual_end`.
///
/// # Arguments
/// * `query_start` - Requested start, or `UNBOUNDED`.
/// * `query_end` - Requested end, or `UNBOUNDED`.
/// * `window_start` - Start of the window.
/// * `window_end` - End of the window.
///
/// # Returns
/// * `(actual_start, actual_end)` - The regularized range.
pub fn regularize_range(
    query_start: Timestamp,
    query_end: Timestamp,
    window_start: Timestamp,
    window_end: Timestamp,
) -> (Timestamp, Timestamp) {
    let start_unbounded = query_start == UNBOUNDED;
    let end_unbounded = query_end == UNBOUNDED;

    // Entirely after the window
    if query_start > window_end {
        return (window_end, window_end);
    }
    // Entirely before the window
    if !end_unbounded && query_end < window_start {
        return (window_start, window_start);
    }

    let actual_start = if start_unbounded || query_start < window_start {
        window_start
    } else {
        query_start
    };
    let mut actual_end = if end_unbounded || query_end > window_end {
        window_end
    } else {
        query_end
    };

    // Inverted input like (180, 120) inside the window
    if actual_end < actual_start {
        actual_end = actual_start;
    }

    (actual_start, actual_end)
}

/// Selects the samples with `start <= ts <= end` (inclusive on both ends).
///
/// Returns an empty range instead of panicking when `start > end`.
pub fn select_inclusive(
    samples: &BTreeMap<Timestamp, Value>,
    start: Timestamp,
    end: Timestamp,
) -> Range<'_, Timestamp, Value> {
    if start > end {
        // `BTreeMap::range` panics on inverted bounds
        return samples.range(start..start);
    }
    samples.range(start..=end)
}

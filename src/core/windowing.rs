use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::series::NormalizedPoint;

/// User-selected sub-range of the timeline domain, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl SelectionWindow {
    #[must_use]
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self { start_ms, end_ms }
    }

    #[must_use]
    pub fn width_ms(self) -> f64 {
        self.end_ms - self.start_ms
    }

    #[must_use]
    pub fn center_ms(self) -> f64 {
        self.start_ms + self.width_ms() / 2.0
    }

    #[must_use]
    pub fn contains(self, timestamp_ms: f64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }

    #[must_use]
    pub fn clamp(self, timestamp_ms: f64) -> f64 {
        timestamp_ms.clamp(self.start_ms, self.end_ms)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.start_ms.is_finite() && self.end_ms.is_finite()
    }
}

/// The single highlighted instant shared by every synchronized view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub timestamp_ms: f64,
}

impl Cursor {
    #[must_use]
    pub fn new(timestamp_ms: f64) -> Self {
        Self { timestamp_ms }
    }
}

/// Returns points whose timestamp falls inside an inclusive window.
#[must_use]
pub fn points_in_window(points: &[NormalizedPoint], window: SelectionWindow) -> &[NormalizedPoint] {
    let (min_t, max_t) = if window.start_ms <= window.end_ms {
        (window.start_ms, window.end_ms)
    } else {
        (window.end_ms, window.start_ms)
    };

    let from = points.partition_point(|point| point.timestamp_ms < min_t);
    let to = points.partition_point(|point| point.timestamp_ms <= max_t);
    &points[from..to.max(from)]
}

/// Index of the sample closest in time to `target` in an ascending sequence.
///
/// Targets outside the covered range resolve to the nearest endpoint; equal
/// distances resolve to the earlier sample. Returns `None` for `len == 0`.
#[must_use]
pub fn nearest_index<F>(len: usize, target: f64, timestamp_at: F) -> Option<usize>
where
    F: Fn(usize) -> f64,
{
    if len == 0 || target.is_nan() {
        return None;
    }

    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if timestamp_at(mid) < target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    let mut candidates: SmallVec<[(OrderedFloat<f64>, usize); 2]> = SmallVec::new();
    if lo > 0 {
        candidates.push((OrderedFloat((target - timestamp_at(lo - 1)).abs()), lo - 1));
    }
    if lo < len {
        candidates.push((OrderedFloat((timestamp_at(lo) - target).abs()), lo));
    }

    candidates
        .into_iter()
        .min_by_key(|candidate| candidate.0)
        .map(|(_, index)| index)
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::windowing::nearest_index;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub timestamp_ms: f64,
    pub lat: f64,
    pub lng: f64,
}

impl GpsSample {
    #[must_use]
    pub fn new(timestamp_ms: f64, lat: f64, lng: f64) -> Self {
        Self {
            timestamp_ms,
            lat,
            lng,
        }
    }

    #[must_use]
    pub fn position(self) -> GpsPosition {
        GpsPosition {
            lat: self.lat,
            lng: self.lng,
        }
    }

    fn is_valid(self) -> bool {
        self.timestamp_ms.is_finite() && self.lat.is_finite() && self.lng.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub lat: f64,
    pub lng: f64,
}

/// Ascending GPS track with nearest-sample lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsTrack {
    samples: Vec<GpsSample>,
}

impl GpsTrack {
    /// Builds a track, dropping non-finite samples and repeated timestamps
    /// (first occurrence wins).
    #[must_use]
    pub fn from_samples(mut samples: Vec<GpsSample>) -> Self {
        let original_count = samples.len();
        samples.retain(|sample| sample.is_valid());
        samples.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        samples.dedup_by(|later, earlier| later.timestamp_ms == earlier.timestamp_ms);
        debug!(
            original_count,
            canonical_count = samples.len(),
            "built gps track"
        );
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[GpsSample] {
        &self.samples
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Sample with the smallest `|Δt|` to `cursor_ms`.
    ///
    /// Ties resolve to the earlier sample; cursors outside the track clamp to
    /// the nearest endpoint. `None` only for an empty track.
    #[must_use]
    pub fn nearest(&self, cursor_ms: f64) -> Option<&GpsSample> {
        nearest_index(self.samples.len(), cursor_ms, |idx| {
            self.samples[idx].timestamp_ms
        })
        .map(|idx| &self.samples[idx])
    }

    #[must_use]
    pub fn position_at(&self, cursor_ms: f64) -> Option<GpsPosition> {
        self.nearest(cursor_ms).map(|sample| sample.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_cursor_yields_no_position() {
        let track = GpsTrack::from_samples(vec![GpsSample::new(0.0, 1.0, 2.0)]);
        assert_eq!(track.position_at(f64::NAN), None);
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::resolution::SampleResolution;
use crate::core::timeline::ResolvedTimeline;
use crate::core::windowing::{SelectionWindow, nearest_index, points_in_window};

/// Source timestamps further than this from the timeline-derived value are
/// assumed to ignore shift semantics.
pub const DEFAULT_TIMESTAMP_DISAGREEMENT_MS: f64 = 12.0 * 3_600_000.0;

/// One per-channel sample as received from the telemetry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub time_of_day: String,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub source_timestamp_ms: Option<f64>,
}

impl RawReading {
    #[must_use]
    pub fn new(time_of_day: impl Into<String>, avg: Option<f64>) -> Self {
        Self {
            time_of_day: time_of_day.into(),
            avg,
            min: None,
            max: None,
            source_timestamp_ms: None,
        }
    }

    #[must_use]
    pub fn with_min_max(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_source_timestamp(mut self, timestamp_ms: f64) -> Self {
        self.source_timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// Raw-to-engineering-unit transform: `v * resolution_factor + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitTransform {
    pub resolution_factor: f64,
    pub offset: f64,
}

impl Default for UnitTransform {
    fn default() -> Self {
        Self {
            resolution_factor: 1.0,
            offset: 0.0,
        }
    }
}

impl UnitTransform {
    #[must_use]
    pub fn new(resolution_factor: f64, offset: f64) -> Self {
        Self {
            resolution_factor,
            offset,
        }
    }

    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        value * self.resolution_factor + self.offset
    }

    fn apply_finite(self, value: Option<f64>) -> Option<f64> {
        value
            .filter(|v| v.is_finite())
            .map(|v| self.apply(v))
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChannelKind {
    #[default]
    Analog,
    Digital,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// Display and transform metadata of a telemetry channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub kind: ChannelKind,
    pub color: String,
    pub min_color: Option<String>,
    pub max_color: Option<String>,
    pub transform: UnitTransform,
    pub display: bool,
    pub y_axis_range: Option<AxisRange>,
}

impl ChannelMeta {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ChannelKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            unit: String::new(),
            kind,
            color: String::new(),
            min_color: None,
            max_color: None,
            transform: UnitTransform::default(),
            display: true,
            y_axis_range: None,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: UnitTransform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawChannel {
    pub meta: ChannelMeta,
    pub readings: Vec<RawReading>,
}

/// A bucket-aligned sample. `avg` is always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub timestamp_ms: f64,
    pub avg: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Canonical, ascending, deduplicated series of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub meta: ChannelMeta,
    pub points: Vec<NormalizedPoint>,
}

impl Series {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Sample nearest to `timestamp_ms`, clamped to the series endpoints.
    #[must_use]
    pub fn value_at(&self, timestamp_ms: f64) -> Option<&NormalizedPoint> {
        nearest_index(self.points.len(), timestamp_ms, |idx| {
            self.points[idx].timestamp_ms
        })
        .map(|idx| &self.points[idx])
    }

    #[must_use]
    pub fn in_window(&self, window: SelectionWindow) -> &[NormalizedPoint] {
        points_in_window(&self.points, window)
    }

    /// Min/max over avg and envelope values.
    #[must_use]
    pub fn value_range(&self) -> Option<AxisRange> {
        let mut values = self
            .points
            .iter()
            .flat_map(|p| [Some(p.avg), p.min, p.max])
            .flatten();
        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(AxisRange { min, max })
    }

    /// Configured y-axis range, falling back to the data range.
    #[must_use]
    pub fn y_axis_range(&self) -> Option<AxisRange> {
        self.meta.y_axis_range.or_else(|| self.value_range())
    }
}

/// Per-channel normalization counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub input: usize,
    pub emitted: usize,
    pub dropped_invalid_time: usize,
    pub dropped_missing_avg: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    InvalidTime,
    MissingAvg,
}

/// Converts raw channel readings into canonical series on a resolved timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesNormalizer {
    timeline: ResolvedTimeline,
    resolution: SampleResolution,
    disagreement_ms: f64,
}

impl SeriesNormalizer {
    #[must_use]
    pub fn new(timeline: ResolvedTimeline, resolution: SampleResolution) -> Self {
        Self {
            timeline,
            resolution,
            disagreement_ms: DEFAULT_TIMESTAMP_DISAGREEMENT_MS,
        }
    }

    #[must_use]
    pub fn with_disagreement_ms(mut self, disagreement_ms: f64) -> Self {
        self.disagreement_ms = disagreement_ms;
        self
    }

    #[must_use]
    pub fn resolution(self) -> SampleResolution {
        self.resolution
    }

    /// Snaps a timestamp down to its bucket boundary.
    #[must_use]
    pub fn align(self, timestamp_ms: f64) -> f64 {
        let bucket = self.resolution.bucket_ms();
        (timestamp_ms / bucket).floor() * bucket
    }

    /// Resolves a reading's timestamp, preferring the source value unless it
    /// disagrees with the shift timeline by more than the configured limit.
    #[must_use]
    pub fn resolve_timestamp(self, reading: &RawReading) -> Option<f64> {
        let derived = self.timeline.hms_to_timeline_ms(&reading.time_of_day)?;
        match reading.source_timestamp_ms {
            Some(source)
                if source.is_finite() && (source - derived).abs() <= self.disagreement_ms =>
            {
                Some(source)
            }
            _ => Some(derived),
        }
    }

    /// Normalizes one reading; `None` means the point is dropped.
    #[must_use]
    pub fn normalize_point(
        self,
        reading: &RawReading,
        transform: UnitTransform,
    ) -> Option<NormalizedPoint> {
        self.try_normalize_point(reading, transform).ok()
    }

    fn try_normalize_point(
        self,
        reading: &RawReading,
        transform: UnitTransform,
    ) -> Result<NormalizedPoint, Rejection> {
        let timestamp_ms = self
            .resolve_timestamp(reading)
            .ok_or(Rejection::InvalidTime)?;
        let avg = transform
            .apply_finite(reading.avg)
            .ok_or(Rejection::MissingAvg)?;

        Ok(NormalizedPoint {
            timestamp_ms: self.align(timestamp_ms),
            avg,
            min: transform.apply_finite(reading.min),
            max: transform.apply_finite(reading.max),
        })
    }

    /// Normalizes a channel. Channels flagged non-displayable yield `None`.
    #[must_use]
    pub fn normalize_channel(self, channel: &RawChannel) -> Option<Series> {
        self.normalize_channel_with_stats(channel)
            .map(|(series, _)| series)
    }

    #[must_use]
    pub fn normalize_channel_with_stats(
        self,
        channel: &RawChannel,
    ) -> Option<(Series, NormalizeStats)> {
        if !channel.meta.display {
            trace!(channel = %channel.meta.id, "skipping non-displayable channel");
            return None;
        }

        let mut stats = NormalizeStats {
            input: channel.readings.len(),
            ..NormalizeStats::default()
        };
        let mut points = Vec::with_capacity(channel.readings.len());
        for reading in &channel.readings {
            match self.try_normalize_point(reading, channel.meta.transform) {
                Ok(point) => points.push(point),
                Err(Rejection::InvalidTime) => stats.dropped_invalid_time += 1,
                Err(Rejection::MissingAvg) => stats.dropped_missing_avg += 1,
            }
        }

        // Stable sort keeps arrival order inside a bucket, so dedup keeps the first.
        points.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        let before_dedup = points.len();
        points.dedup_by(|later, earlier| later.timestamp_ms == earlier.timestamp_ms);
        stats.duplicates = before_dedup - points.len();
        stats.emitted = points.len();

        debug!(
            channel = %channel.meta.id,
            input = stats.input,
            emitted = stats.emitted,
            dropped_invalid_time = stats.dropped_invalid_time,
            dropped_missing_avg = stats.dropped_missing_avg,
            duplicates = stats.duplicates,
            "normalized channel"
        );

        Some((
            Series {
                meta: channel.meta.clone(),
                points,
            },
            stats,
        ))
    }

    /// Normalizes every displayable channel, keeping source order.
    #[must_use]
    pub fn normalize_all<'a, I>(self, channels: I) -> IndexMap<String, Series>
    where
        I: IntoIterator<Item = &'a RawChannel>,
    {
        channels
            .into_iter()
            .filter_map(|channel| self.normalize_channel(channel))
            .map(|series| (series.meta.id.clone(), series))
            .collect()
    }
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::shift::parse_hms;

pub const DEFAULT_RESOLUTION_SCAN_LIMIT: usize = 2_000;

/// Effective sampling bucket of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SampleResolution {
    PerSecond,
    #[default]
    PerMinute,
}

impl SampleResolution {
    #[must_use]
    pub const fn bucket_ms(self) -> f64 {
        match self {
            Self::PerSecond => 1_000.0,
            Self::PerMinute => 60_000.0,
        }
    }
}

/// Nominal resolution tag as declared by the telemetry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResolutionHint {
    PerSecond,
    PerMinute,
    #[default]
    Unknown,
}

impl ResolutionHint {
    /// Maps the source's free-form tag (`"second"`, `"1s"`, `"minute"`, ...).
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::Unknown;
        };
        match tag.trim().to_ascii_lowercase().as_str() {
            "second" | "seconds" | "per_second" | "persecond" | "1s" | "sec" => Self::PerSecond,
            "minute" | "minutes" | "per_minute" | "perminute" | "1m" | "min" => Self::PerMinute,
            _ => Self::Unknown,
        }
    }
}

/// Smallest positive gap between consecutive sorted timestamps.
///
/// Only the first `scan_limit` finite values are inspected.
#[must_use]
pub fn smallest_positive_delta(timestamps: &[f64], scan_limit: usize) -> Option<f64> {
    let mut sample: Vec<f64> = timestamps
        .iter()
        .copied()
        .filter(|ts| ts.is_finite())
        .take(scan_limit)
        .collect();
    sample.sort_by(f64::total_cmp);

    sample
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|delta| *delta > 0.0)
        .min_by(f64::total_cmp)
}

/// Whether any parseable `HH:MM:SS` carries a non-zero seconds component.
#[must_use]
pub fn has_sub_minute_components<'a, I>(times: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    times
        .into_iter()
        .filter_map(parse_hms)
        .any(|secs| secs % 60 != 0)
}

/// Decides between one-second and one-minute buckets for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionDetector {
    scan_limit: usize,
}

impl Default for ResolutionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION_SCAN_LIMIT)
    }
}

impl ResolutionDetector {
    #[must_use]
    pub fn new(scan_limit: usize) -> Self {
        Self {
            scan_limit: scan_limit.max(2),
        }
    }

    #[must_use]
    pub fn scan_limit(self) -> usize {
        self.scan_limit
    }

    /// Per-second when consecutive timestamps are closer than a minute, or
    /// when series tagged per-minute still carry non-zero seconds.
    #[must_use]
    pub fn detect<'a, I>(
        self,
        timestamps: &[f64],
        series_times: I,
        hint: ResolutionHint,
    ) -> SampleResolution
    where
        I: IntoIterator<Item = &'a str>,
    {
        let delta = smallest_positive_delta(timestamps, self.scan_limit);
        if let Some(delta) = delta {
            if delta < SampleResolution::PerMinute.bucket_ms() {
                debug!(delta_ms = delta, "detected per-second sampling");
                return SampleResolution::PerSecond;
            }
        }

        if hint == ResolutionHint::PerMinute
            && has_sub_minute_components(series_times.into_iter().take(self.scan_limit))
        {
            debug!("per-minute tag carries second components, treating as per-second");
            return SampleResolution::PerSecond;
        }

        SampleResolution::PerMinute
    }
}

//! Wire shape of one telemetry load and its mapping into engine inputs.
//!
//! This is the only place that knows the upstream field names; everything
//! past [`adapt`] works on typed `RawChannel`s and a `GpsTrack`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::{
    AxisRange, ChannelKind, ChannelMeta, GpsSample, GpsTrack, RawChannel, RawReading,
    ResolutionHint, ResolvedTimeline, UnitTransform,
};
use crate::error::{TimelineError, TimelineResult};

/// Absolute timestamp as sent by the source: epoch milliseconds or ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceTimestamp {
    EpochMs(f64),
    Text(String),
}

impl SourceTimestamp {
    #[must_use]
    pub fn to_epoch_ms(&self) -> Option<f64> {
        match self {
            Self::EpochMs(ms) => ms.is_finite().then_some(*ms),
            Self::Text(text) => parse_iso_epoch_ms(text),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Self::EpochMs),
            Value::String(text) => Some(Self::Text(text)),
            _ => None,
        }
    }
}

fn parse_iso_epoch_ms(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.timestamp_millis() as f64);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis() as f64)
}

// Field-level leniency: a malformed value becomes `None` so that only the
// affected point or row is dropped in `adapt`, never the whole load.

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|value| value.is_finite()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<SourceTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(SourceTimestamp::from_value))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampRow {
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<SourceTimestamp>,
}

/// Channel ids arrive as strings or bare numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Text(String),
    Number(i64),
}

impl ChannelId {
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(default, alias = "value", deserialize_with = "lenient_number")]
    pub avg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRangePayload {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPayload {
    pub id: ChannelId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub min_color: Option<String>,
    #[serde(default)]
    pub max_color: Option<String>,
    #[serde(default = "default_resolution_factor")]
    pub resolution: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_display")]
    pub display: bool,
    #[serde(default, rename = "yAxisRange")]
    pub y_axis_range: Option<AxisRangePayload>,
    #[serde(default)]
    pub points: Vec<PointPayload>,
}

fn default_resolution_factor() -> f64 {
    1.0
}

fn default_display() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsRow {
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lng: Option<f64>,
}

/// One already-parsed load as delivered by the telemetry collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryPayload {
    #[serde(default)]
    pub timestamps: Vec<TimestampRow>,
    #[serde(default)]
    pub analog: Vec<ChannelPayload>,
    #[serde(default)]
    pub digital: Vec<ChannelPayload>,
    #[serde(default, rename = "gpsPerSecond")]
    pub gps_per_second: Vec<GpsRow>,
    /// Nominal sampling tag, e.g. `"minute"` or `"second"`.
    #[serde(default)]
    pub resolution: Option<String>,
}

impl TelemetryPayload {
    pub fn from_json_str(input: &str) -> TimelineResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| TimelineError::InvalidData(format!("failed to parse payload: {e}")))
    }
}

/// Engine-side view of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedLoad {
    pub channels: Vec<RawChannel>,
    pub gps: GpsTrack,
    /// Timeline-resolved instants from the `timestamps` rows, falling back to
    /// point times when the payload carries no rows.
    pub timestamps_ms: Vec<f64>,
    pub hint: ResolutionHint,
}

impl AdaptedLoad {
    /// Every point time string across all channels.
    pub fn point_times(&self) -> impl Iterator<Item = &str> {
        self.channels
            .iter()
            .flat_map(|channel| channel.readings.iter())
            .map(|reading| reading.time_of_day.as_str())
    }
}

/// Maps a payload into typed channels and a GPS track on `timeline`.
#[must_use]
pub fn adapt(payload: &TelemetryPayload, timeline: &ResolvedTimeline) -> AdaptedLoad {
    let source_times: HashMap<&str, f64> = payload
        .timestamps
        .iter()
        .filter_map(|row| {
            let ms = row.timestamp.as_ref()?.to_epoch_ms()?;
            Some((row.time.as_deref()?, ms))
        })
        .collect();

    let channels: Vec<RawChannel> = payload
        .analog
        .iter()
        .map(|channel| adapt_channel(channel, ChannelKind::Analog, &source_times))
        .chain(
            payload
                .digital
                .iter()
                .map(|channel| adapt_channel(channel, ChannelKind::Digital, &source_times)),
        )
        .collect();

    let gps = GpsTrack::from_samples(
        payload
            .gps_per_second
            .iter()
            .filter_map(|row| {
                let ts = timeline.hms_to_timeline_ms(row.time.as_deref()?)?;
                Some(GpsSample::new(ts, row.lat?, row.lng?))
            })
            .collect(),
    );

    let mut timestamps_ms: Vec<f64> = payload
        .timestamps
        .iter()
        .filter_map(|row| timeline.hms_to_timeline_ms(row.time.as_deref()?))
        .collect();
    if timestamps_ms.is_empty() {
        timestamps_ms = channels
            .iter()
            .flat_map(|channel| channel.readings.iter())
            .filter_map(|reading| timeline.hms_to_timeline_ms(&reading.time_of_day))
            .collect();
    }

    let hint = ResolutionHint::from_tag(payload.resolution.as_deref());
    debug!(
        channels = channels.len(),
        gps_samples = gps.len(),
        timestamps = timestamps_ms.len(),
        ?hint,
        "adapted telemetry payload"
    );

    AdaptedLoad {
        channels,
        gps,
        timestamps_ms,
        hint,
    }
}

fn adapt_channel(
    channel: &ChannelPayload,
    kind: ChannelKind,
    source_times: &HashMap<&str, f64>,
) -> RawChannel {
    let id = channel.id.to_key();
    trace!(channel = %id, points = channel.points.len(), "adapt channel");
    let meta = ChannelMeta {
        name: channel.name.clone().unwrap_or_else(|| id.clone()),
        id,
        unit: channel.unit.clone(),
        kind,
        color: channel.color.clone(),
        min_color: channel.min_color.clone(),
        max_color: channel.max_color.clone(),
        transform: UnitTransform::new(channel.resolution, channel.offset),
        display: channel.display,
        y_axis_range: channel.y_axis_range.map(|range| AxisRange {
            min: range.min,
            max: range.max,
        }),
    };

    let readings: Vec<RawReading> = channel
        .points
        .iter()
        .filter_map(|point| {
            let time = point.time.as_deref()?;
            Some(RawReading {
                time_of_day: time.to_owned(),
                avg: point.avg,
                min: point.min,
                max: point.max,
                source_timestamp_ms: source_times.get(time).copied(),
            })
        })
        .collect();
    let untimed = channel.points.len() - readings.len();
    if untimed > 0 {
        debug!(channel = %meta.id, untimed, "dropped points without a time");
    }

    RawChannel { meta, readings }
}

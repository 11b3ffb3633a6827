use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{TimelineError, TimelineResult};

pub const SECONDS_PER_DAY: u32 = 86_400;
pub const MS_PER_SECOND: f64 = 1_000.0;
pub const MS_PER_DAY: f64 = SECONDS_PER_DAY as f64 * MS_PER_SECOND;

const DEFAULT_SHIFT_START: u32 = 6 * 3_600;
const DEFAULT_SHIFT_END: u32 = 18 * 3_600;

/// A recurring duty window expressed in seconds of day.
///
/// `end_seconds_of_day` is normalized past `SECONDS_PER_DAY` when the shift
/// runs over midnight, so `start < end` always holds and timeline arithmetic
/// stays monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDefinition {
    pub start_seconds_of_day: u32,
    pub end_seconds_of_day: u32,
    pub crosses_midnight: bool,
}

impl Default for ShiftDefinition {
    fn default() -> Self {
        Self::from_seconds(DEFAULT_SHIFT_START, DEFAULT_SHIFT_END)
    }
}

impl ShiftDefinition {
    /// Builds a shift from raw seconds of day.
    ///
    /// An end at or before the start is read as "next day".
    #[must_use]
    pub fn from_seconds(start_seconds_of_day: u32, end_seconds_of_day: u32) -> Self {
        let start = start_seconds_of_day % SECONDS_PER_DAY;
        let mut end = end_seconds_of_day % SECONDS_PER_DAY;
        if end <= start {
            end += SECONDS_PER_DAY;
        }
        Self {
            start_seconds_of_day: start,
            end_seconds_of_day: end,
            crosses_midnight: end > SECONDS_PER_DAY,
        }
    }

    /// Parses a shift descriptor, falling back to 06:00–18:00.
    ///
    /// Accepts `"6 AM to 6 PM"`, `"6:30pm-6:30am"` and the canonical
    /// `"HH:MM:SStoHH:MM:SS"` form.
    #[must_use]
    pub fn parse(descriptor: &str) -> Self {
        match Self::try_parse(descriptor) {
            Ok(shift) => shift,
            Err(err) => {
                warn!(error = %err, "falling back to default shift");
                Self::default()
            }
        }
    }

    pub fn try_parse(descriptor: &str) -> TimelineResult<Self> {
        let lowered = descriptor.trim().to_ascii_lowercase();
        let (start, end) = lowered
            .split_once("to")
            .or_else(|| lowered.split_once('-'))
            .ok_or_else(|| TimelineError::InvalidShift(descriptor.to_owned()))?;

        let start = parse_clock_token(start)
            .ok_or_else(|| TimelineError::InvalidShift(descriptor.to_owned()))?;
        let end = parse_clock_token(end)
            .ok_or_else(|| TimelineError::InvalidShift(descriptor.to_owned()))?;

        Ok(Self::from_seconds(start, end))
    }

    #[must_use]
    pub fn duration_seconds(self) -> u32 {
        self.end_seconds_of_day - self.start_seconds_of_day
    }

    #[must_use]
    pub fn duration_ms(self) -> f64 {
        f64::from(self.duration_seconds()) * MS_PER_SECOND
    }

    /// Machine form understood by the telemetry service, e.g. `18:00:00to06:00:00`.
    #[must_use]
    pub fn canonical_descriptor(self) -> String {
        format!(
            "{}to{}",
            format_hms(self.start_seconds_of_day),
            format_hms(self.end_seconds_of_day % SECONDS_PER_DAY)
        )
    }

    /// Operator-facing label, e.g. `6 PM to 6 AM`.
    #[must_use]
    pub fn human_descriptor(self) -> String {
        format!(
            "{} to {}",
            format_meridiem(self.start_seconds_of_day),
            format_meridiem(self.end_seconds_of_day % SECONDS_PER_DAY)
        )
    }
}

/// Parses `HH:MM:SS` (or `HH:MM`) into seconds of day.
#[must_use]
pub fn parse_hms(text: &str) -> Option<u32> {
    let (hour, minute, second) = split_clock_fields(text.trim())?;
    if hour > 23 {
        return None;
    }
    Some(hour * 3_600 + minute * 60 + second)
}

/// Formats seconds of day as `HH:MM:SS`; values past midnight wrap.
#[must_use]
pub fn format_hms(seconds_of_day: u32) -> String {
    let secs = seconds_of_day % SECONDS_PER_DAY;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3_600,
        (secs % 3_600) / 60,
        secs % 60
    )
}

fn format_meridiem(seconds_of_day: u32) -> String {
    let hour24 = seconds_of_day / 3_600;
    let minute = (seconds_of_day % 3_600) / 60;
    let second = seconds_of_day % 60;
    let suffix = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    match (minute, second) {
        (0, 0) => format!("{hour12} {suffix}"),
        (m, 0) => format!("{hour12}:{m:02} {suffix}"),
        (m, s) => format!("{hour12}:{m:02}:{s:02} {suffix}"),
    }
}

fn parse_clock_token(token: &str) -> Option<u32> {
    let token = token.trim();
    let (clock, meridiem) = if let Some(rest) = token.strip_suffix("am") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = token.strip_suffix("pm") {
        (rest.trim_end(), Some(true))
    } else {
        (token, None)
    };

    let (hour, minute, second) = split_clock_fields(clock)?;
    let hour = match meridiem {
        Some(is_pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            }
        }
        None if hour <= 23 => hour,
        None => return None,
    };

    Some(hour * 3_600 + minute * 60 + second)
}

fn split_clock_fields(clock: &str) -> Option<(u32, u32, u32)> {
    if clock.is_empty() {
        return None;
    }
    let mut fields = clock.split(':');
    let hour = parse_field(fields.next()?)?;
    let minute = fields.next().map_or(Some(0), parse_field)?;
    let second = fields.next().map_or(Some(0), parse_field)?;
    if fields.next().is_some() || minute > 59 || second > 59 {
        return None;
    }
    Some((hour, minute, second))
}

fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

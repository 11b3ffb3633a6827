use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::shift::{
    MS_PER_DAY, MS_PER_SECOND, SECONDS_PER_DAY, ShiftDefinition, format_hms, parse_hms,
};
use crate::error::{TimelineError, TimelineResult};

/// Absolute bounds of one shift on the timeline, in epoch milliseconds.
///
/// `base_day_epoch_ms` is midnight UTC of the timeline base day. For a shift
/// that runs over midnight this is the day *before* the selected date, because
/// the selected date names the day the shift ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineDomain {
    pub base_day_epoch_ms: f64,
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimelineDomain {
    #[must_use]
    pub fn width_ms(self) -> f64 {
        self.end_ms - self.start_ms
    }

    #[must_use]
    pub fn contains(self, timestamp_ms: f64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }

    #[must_use]
    pub fn clamp(self, timestamp_ms: f64) -> f64 {
        timestamp_ms.clamp(self.start_ms, self.end_ms)
    }
}

/// How the caller spelled the selected date, so request dates echo it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateStyle {
    /// `2025-01-15`
    #[default]
    IsoDash,
    /// `2025/01/15`
    IsoSlash,
    /// `15/01/2025`
    DayFirstSlash,
    /// `15-01-2025`
    DayFirstDash,
    /// `01/31/2025`, only recognised when the day-first reading is impossible.
    MonthFirstSlash,
    /// `2025-01-15T00:00:00.000Z` and other RFC 3339 / ISO date-times.
    IsoDateTime,
}

impl DateStyle {
    #[must_use]
    pub fn format(self, date: NaiveDate) -> String {
        match self {
            Self::IsoDash => date.format("%Y-%m-%d").to_string(),
            Self::IsoSlash => date.format("%Y/%m/%d").to_string(),
            Self::DayFirstSlash => date.format("%d/%m/%Y").to_string(),
            Self::DayFirstDash => date.format("%d-%m-%Y").to_string(),
            Self::MonthFirstSlash => date.format("%m/%d/%Y").to_string(),
            Self::IsoDateTime => date.format("%Y-%m-%dT00:00:00.000Z").to_string(),
        }
    }
}

/// Parses a selected-date string in any of the supported styles.
#[must_use]
pub fn parse_date(text: &str) -> Option<(NaiveDate, DateStyle)> {
    let text = text.trim();
    const DATE_ONLY: [(&str, DateStyle); 5] = [
        ("%Y-%m-%d", DateStyle::IsoDash),
        ("%Y/%m/%d", DateStyle::IsoSlash),
        ("%d/%m/%Y", DateStyle::DayFirstSlash),
        ("%d-%m-%Y", DateStyle::DayFirstDash),
        ("%m/%d/%Y", DateStyle::MonthFirstSlash),
    ];
    for (format, style) in DATE_ONLY {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some((date, style));
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some((datetime.date_naive(), DateStyle::IsoDateTime));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some((datetime.date(), DateStyle::IsoDateTime));
        }
    }
    None
}

/// Strict variant of [`parse_date`].
pub fn try_parse_date(text: &str) -> TimelineResult<(NaiveDate, DateStyle)> {
    parse_date(text).ok_or_else(|| TimelineError::InvalidDate(text.to_owned()))
}

fn midnight_epoch_ms(date: NaiveDate) -> f64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0.0, |dt| dt.and_utc().timestamp_millis() as f64)
}

/// A shift anchored to a concrete date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTimeline {
    pub shift: ShiftDefinition,
    pub domain: TimelineDomain,
    pub selected_date: NaiveDate,
    pub base_day: NaiveDate,
    pub date_style: DateStyle,
}

impl ResolvedTimeline {
    /// Maps a wall-clock `HH:MM:SS` reading onto the timeline.
    ///
    /// On an overnight shift early-morning readings belong to the tail of the
    /// shift and land one day after the base day, so `02:00:00` sorts after
    /// `23:59:00`. Returns `None` for malformed clock strings.
    #[must_use]
    pub fn hms_to_timeline_ms(&self, hms: &str) -> Option<f64> {
        parse_hms(hms).map(|secs| self.seconds_of_day_to_timeline_ms(secs))
    }

    #[must_use]
    pub fn seconds_of_day_to_timeline_ms(&self, seconds_of_day: u32) -> f64 {
        let secs = seconds_of_day % SECONDS_PER_DAY;
        let shift = self.shift;
        let in_overnight_tail = shift.crosses_midnight
            && secs < shift.start_seconds_of_day
            && secs + SECONDS_PER_DAY <= shift.end_seconds_of_day;

        let mut ms = self.domain.base_day_epoch_ms + f64::from(secs) * MS_PER_SECOND;
        if in_overnight_tail {
            ms += MS_PER_DAY;
        }
        ms
    }

    /// UTC wall clock of an absolute timeline instant, as `HH:MM:SS`.
    #[must_use]
    pub fn timeline_ms_to_hms(&self, timestamp_ms: f64) -> String {
        let offset_secs = ((timestamp_ms - self.domain.base_day_epoch_ms) / MS_PER_SECOND).floor();
        let secs = (offset_secs as i64).rem_euclid(i64::from(SECONDS_PER_DAY));
        format_hms(secs as u32)
    }

    /// The timeline base day in the caller's original date style.
    #[must_use]
    pub fn format_base_day(&self) -> String {
        self.date_style.format(self.base_day)
    }
}

/// Turns `(shift descriptor, date)` pairs into absolute timelines.
pub struct TimelineResolver;

impl TimelineResolver {
    /// Resolves against the current UTC date for the unparseable-date fallback.
    #[must_use]
    pub fn resolve(shift_descriptor: &str, date: &str) -> ResolvedTimeline {
        Self::resolve_at(shift_descriptor, date, Utc::now().date_naive())
    }

    /// Resolves with an explicit "today", used when `date` cannot be parsed.
    #[must_use]
    pub fn resolve_at(shift_descriptor: &str, date: &str, today: NaiveDate) -> ResolvedTimeline {
        let shift = ShiftDefinition::parse(shift_descriptor);
        let (selected_date, date_style) = try_parse_date(date).unwrap_or_else(|err| {
            warn!(error = %err, %today, "falling back to today");
            (today, DateStyle::default())
        });
        Self::resolve_parsed(shift, selected_date, date_style)
    }

    /// Like `resolve`, but an unparseable shift or date is an error instead
    /// of a fallback.
    pub fn try_resolve(shift_descriptor: &str, date: &str) -> TimelineResult<ResolvedTimeline> {
        let shift = ShiftDefinition::try_parse(shift_descriptor)?;
        let (selected_date, date_style) = try_parse_date(date)?;
        Ok(Self::resolve_parsed(shift, selected_date, date_style))
    }

    #[must_use]
    pub fn resolve_parsed(
        shift: ShiftDefinition,
        selected_date: NaiveDate,
        date_style: DateStyle,
    ) -> ResolvedTimeline {
        let base_day = if shift.crosses_midnight {
            selected_date
                .checked_sub_days(Days::new(1))
                .unwrap_or(selected_date)
        } else {
            selected_date
        };

        let base_day_epoch_ms = midnight_epoch_ms(base_day);
        let domain = TimelineDomain {
            base_day_epoch_ms,
            start_ms: base_day_epoch_ms + f64::from(shift.start_seconds_of_day) * MS_PER_SECOND,
            end_ms: base_day_epoch_ms + f64::from(shift.end_seconds_of_day) * MS_PER_SECOND,
        };

        debug!(
            shift = %shift.canonical_descriptor(),
            %selected_date,
            %base_day,
            crosses_midnight = shift.crosses_midnight,
            "resolved shift timeline"
        );

        ResolvedTimeline {
            shift,
            domain,
            selected_date,
            base_day,
            date_style,
        }
    }
}

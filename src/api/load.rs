use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::{ResolvedTimeline, SampleResolution, SelectionWindow};
use crate::error::{TimelineError, TimelineResult};

/// Parameters handed to the external fetch layer for one reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub version: u64,
    pub device_id: String,
    /// Timeline base day, spelled like the caller's selected date.
    pub date: String,
    /// Canonical `HH:MM:SStoHH:MM:SS` shift.
    pub shift: String,
    /// UTC wall clock `HH:MM:SS` of the window start.
    pub start_time: String,
    /// UTC wall clock `HH:MM:SS` of the window end.
    pub end_time: String,
    pub window: SelectionWindow,
}

impl FetchRequest {
    #[must_use]
    pub fn for_window(
        version: u64,
        device_id: &str,
        timeline: &ResolvedTimeline,
        window: SelectionWindow,
    ) -> Self {
        Self {
            version,
            device_id: device_id.to_owned(),
            date: timeline.format_base_day(),
            shift: timeline.shift.canonical_descriptor(),
            start_time: timeline.timeline_ms_to_hms(window.start_ms),
            end_time: timeline.timeline_ms_to_hms(window.end_ms),
            window,
        }
    }
}

/// Upstream fetch error reported back by the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct FetchFailure {
    pub reason: String,
}

impl FetchFailure {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// "Load failed" signal delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub version: u64,
    pub reason: String,
}

/// Result of handing a load result back to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadOutcome {
    Applied {
        version: u64,
        channels: usize,
        resolution: SampleResolution,
    },
    /// A newer load was requested after this one; the result was ignored.
    Stale { version: u64, current: u64 },
    Failed { version: u64, reason: String },
}

impl LoadOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Maps `Failed` to `TimelineError::LoadFailed`; stale results are not errors.
    pub fn into_result(self) -> TimelineResult<Self> {
        match self {
            Self::Failed { version, reason } => Err(TimelineError::LoadFailed { version, reason }),
            other => Ok(other),
        }
    }
}

/// Monotonic load version counter.
///
/// Every reload trigger bumps the version; results carrying an older version
/// are discarded when they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadTracker {
    current: u64,
}

impl LoadTracker {
    #[must_use]
    pub fn current(self) -> u64 {
        self.current
    }

    /// Starts a new load and returns its version.
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        debug!(version = self.current, "load requested");
        self.current
    }

    /// Supersedes any in-flight load without starting a new one.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }

    #[must_use]
    pub fn is_current(self, version: u64) -> bool {
        version == self.current
    }
}

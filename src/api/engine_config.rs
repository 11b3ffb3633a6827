use serde::{Deserialize, Serialize};

use crate::api::SyncTuning;
use crate::core::resolution::DEFAULT_RESOLUTION_SCAN_LIMIT;
use crate::core::series::DEFAULT_TIMESTAMP_DISAGREEMENT_MS;
use crate::error::{TimelineError, TimelineResult};
use crate::interaction::WindowTuning;

/// Public engine bootstrap configuration.
///
/// Serializable so dashboards can keep tuning next to their other settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEngineConfig {
    pub device_id: String,
    #[serde(default = "default_window_tuning")]
    pub window: WindowTuning,
    #[serde(default = "default_sync_tuning")]
    pub sync: SyncTuning,
    #[serde(default = "default_resolution_scan_limit")]
    pub resolution_scan_limit: usize,
    #[serde(default = "default_timestamp_disagreement_ms")]
    pub timestamp_disagreement_ms: f64,
}

impl TimelineEngineConfig {
    #[must_use]
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            window: default_window_tuning(),
            sync: default_sync_tuning(),
            resolution_scan_limit: default_resolution_scan_limit(),
            timestamp_disagreement_ms: default_timestamp_disagreement_ms(),
        }
    }

    #[must_use]
    pub fn with_window_tuning(mut self, tuning: WindowTuning) -> Self {
        self.window = tuning;
        self
    }

    #[must_use]
    pub fn with_min_range_ms(mut self, min_range_ms: f64) -> Self {
        self.window.min_range_ms = min_range_ms;
        self
    }

    #[must_use]
    pub fn with_sync_tuning(mut self, tuning: SyncTuning) -> Self {
        self.sync = tuning;
        self
    }

    #[must_use]
    pub fn with_resolution_scan_limit(mut self, scan_limit: usize) -> Self {
        self.resolution_scan_limit = scan_limit;
        self
    }

    #[must_use]
    pub fn with_timestamp_disagreement_ms(mut self, disagreement_ms: f64) -> Self {
        self.timestamp_disagreement_ms = disagreement_ms;
        self
    }

    pub fn validate(self) -> TimelineResult<Self> {
        self.window.validate()?;
        self.sync.validate()?;
        if self.resolution_scan_limit < 2 {
            return Err(TimelineError::InvalidConfig(
                "resolution scan limit must be >= 2".to_owned(),
            ));
        }
        if !self.timestamp_disagreement_ms.is_finite() || self.timestamp_disagreement_ms < 0.0 {
            return Err(TimelineError::InvalidConfig(
                "timestamp disagreement must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }

    pub fn to_json_pretty(&self) -> TimelineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TimelineError::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    pub fn from_json_str(input: &str) -> TimelineResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| TimelineError::InvalidConfig(format!("failed to parse config: {e}")))
    }
}

fn default_window_tuning() -> WindowTuning {
    WindowTuning::default()
}

fn default_sync_tuning() -> SyncTuning {
    SyncTuning::default()
}

fn default_resolution_scan_limit() -> usize {
    DEFAULT_RESOLUTION_SCAN_LIMIT
}

fn default_timestamp_disagreement_ms() -> f64 {
    DEFAULT_TIMESTAMP_DISAGREEMENT_MS
}

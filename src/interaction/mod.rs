//! Pointer-gesture state for the selection window and cursor.

mod window_controller;

use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};

pub use window_controller::WindowController;

pub const DEFAULT_MIN_RANGE_MS: f64 = 3_600_000.0;
pub const DEFAULT_WINDOW_WIDTH_MS: f64 = 3_600_000.0;
pub const DEFAULT_HANDLE_TOLERANCE_MS: f64 = 15.0 * 60_000.0;
pub const DEFAULT_COMMIT_DEBOUNCE_MS: f64 = 500.0;

/// Which part of the selection window a pointer gesture is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DragMode {
    #[default]
    None,
    Left,
    Right,
    Move,
}

/// Pointer gesture lifecycle.
///
/// `Idle -> Dragging -> Idle` when the press lands on a handle or inside the
/// window, `Idle -> NewSelection -> Idle` when it lands anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragMode),
    NewSelection,
}

/// Whether window changes may trigger reloads yet.
///
/// While `Initializing` (e.g. restoring a saved window) commits are
/// suppressed; the host ends initialization explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControllerPhase {
    #[default]
    Initializing,
    Interactive,
}

/// Selection-window limits and gesture timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowTuning {
    pub min_range_ms: f64,
    pub default_width_ms: f64,
    pub handle_tolerance_ms: f64,
    pub commit_debounce_ms: f64,
}

impl Default for WindowTuning {
    fn default() -> Self {
        Self {
            min_range_ms: DEFAULT_MIN_RANGE_MS,
            default_width_ms: DEFAULT_WINDOW_WIDTH_MS,
            handle_tolerance_ms: DEFAULT_HANDLE_TOLERANCE_MS,
            commit_debounce_ms: DEFAULT_COMMIT_DEBOUNCE_MS,
        }
    }
}

impl WindowTuning {
    pub fn validate(self) -> TimelineResult<Self> {
        if !self.min_range_ms.is_finite() || self.min_range_ms <= 0.0 {
            return Err(TimelineError::InvalidConfig(
                "window min range must be finite and > 0".to_owned(),
            ));
        }
        if !self.default_width_ms.is_finite() || self.default_width_ms <= 0.0 {
            return Err(TimelineError::InvalidConfig(
                "default window width must be finite and > 0".to_owned(),
            ));
        }
        if !self.handle_tolerance_ms.is_finite() || self.handle_tolerance_ms < 0.0 {
            return Err(TimelineError::InvalidConfig(
                "handle tolerance must be finite and >= 0".to_owned(),
            ));
        }
        if !self.commit_debounce_ms.is_finite() || self.commit_debounce_ms < 0.0 {
            return Err(TimelineError::InvalidConfig(
                "commit debounce must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

use tracing::{debug, trace, warn};

use crate::core::{Cursor, SelectionWindow, TimelineDomain};
use crate::error::{TimelineError, TimelineResult};

use super::{ControllerPhase, DragMode, GestureState, WindowTuning};

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer_ms: f64,
    window: SelectionWindow,
}

/// Owns the selection window and cursor and applies gestures to them.
///
/// Drag updates are previews and never commit on their own. A commit happens
/// on pointer release, on an explicit `commit`, or from `poll_debounce` once
/// the debounce interval has passed without further activity. The last case
/// also applies while a drag is held still; the gesture stays active and the
/// release only commits again if the window moved since.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowController {
    domain: TimelineDomain,
    tuning: WindowTuning,
    selection: SelectionWindow,
    cursor: Cursor,
    drag: DragMode,
    gesture: GestureState,
    phase: ControllerPhase,
    anchor: Option<DragAnchor>,
    commit_pending: bool,
    last_activity_ms: Option<f64>,
    last_committed: Option<SelectionWindow>,
}

impl WindowController {
    #[must_use]
    pub fn new(domain: TimelineDomain, tuning: WindowTuning) -> Self {
        let selection = SelectionWindow::new(domain.start_ms, domain.end_ms);
        Self {
            domain,
            tuning,
            selection,
            cursor: Cursor::new(selection.start_ms),
            drag: DragMode::None,
            gesture: GestureState::Idle,
            phase: ControllerPhase::Initializing,
            anchor: None,
            commit_pending: false,
            last_activity_ms: None,
            last_committed: None,
        }
    }

    #[must_use]
    pub fn domain(&self) -> TimelineDomain {
        self.domain
    }

    #[must_use]
    pub fn tuning(&self) -> WindowTuning {
        self.tuning
    }

    #[must_use]
    pub fn selection(&self) -> SelectionWindow {
        self.selection
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn drag_mode(&self) -> DragMode {
        self.drag
    }

    #[must_use]
    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    #[must_use]
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    #[must_use]
    pub fn is_commit_pending(&self) -> bool {
        self.commit_pending
    }

    #[must_use]
    pub fn last_committed(&self) -> Option<SelectionWindow> {
        self.last_committed
    }

    /// Replaces the domain after a date or shift change.
    ///
    /// The selection resets to the full domain and the controller returns to
    /// `Initializing` until the host finishes initialization again.
    pub fn set_domain(&mut self, domain: TimelineDomain) {
        self.domain = domain;
        self.selection = SelectionWindow::new(domain.start_ms, domain.end_ms);
        self.cursor = Cursor::new(self.selection.start_ms);
        self.drag = DragMode::None;
        self.gesture = GestureState::Idle;
        self.phase = ControllerPhase::Initializing;
        self.anchor = None;
        self.commit_pending = false;
        self.last_activity_ms = None;
        self.last_committed = None;
        debug!(
            start_ms = domain.start_ms,
            end_ms = domain.end_ms,
            "window controller domain reset"
        );
    }

    /// Applies a saved window without scheduling a reload.
    pub fn restore_window(&mut self, start_ms: f64, end_ms: f64) -> TimelineResult<SelectionWindow> {
        let window = self.constrain(start_ms, end_ms)?;
        self.apply_selection(window);
        if self.phase == ControllerPhase::Interactive {
            self.commit_pending = true;
            self.last_activity_ms = None;
        }
        Ok(window)
    }

    /// Leaves `Initializing` and returns the window the initial load covers.
    pub fn finish_initialization(&mut self) -> SelectionWindow {
        self.phase = ControllerPhase::Interactive;
        self.commit_pending = false;
        self.last_committed = Some(self.selection);
        self.selection
    }

    /// Sets the window, clamping into the domain and enforcing the minimum
    /// width. Non-finite input is rejected and the last valid window kept.
    pub fn set_window(&mut self, start_ms: f64, end_ms: f64) -> TimelineResult<SelectionWindow> {
        let window = self.constrain(start_ms, end_ms)?;
        self.apply_selection(window);
        self.commit_pending = true;
        self.last_activity_ms = None;
        Ok(window)
    }

    /// Centers the window on `timestamp_ms`, keeping its width.
    pub fn recenter(&mut self, timestamp_ms: f64) -> TimelineResult<SelectionWindow> {
        if !timestamp_ms.is_finite() {
            return Err(self.reject(timestamp_ms, timestamp_ms));
        }
        let width = self.selection.width_ms();
        let window = self.fit_span(timestamp_ms - width / 2.0, width);
        self.apply_selection(window);
        self.commit_pending = true;
        self.last_activity_ms = None;
        Ok(window)
    }

    /// Moves the cursor, clamped into the current selection.
    pub fn seek(&mut self, timestamp_ms: f64) -> TimelineResult<Cursor> {
        if !timestamp_ms.is_finite() {
            return Err(TimelineError::InvalidData(
                "cursor time must be finite".to_owned(),
            ));
        }
        self.cursor = Cursor::new(self.selection.clamp(timestamp_ms));
        trace!(cursor_ms = self.cursor.timestamp_ms, "seek");
        Ok(self.cursor)
    }

    /// Starts a pointer gesture and returns the resulting drag mode.
    ///
    /// Presses within the handle tolerance of an edge resize that edge (the
    /// nearer one when both qualify), presses inside the window move it, and
    /// anything else starts a new default-width window centered on the pointer.
    pub fn begin_drag(&mut self, pointer_ms: f64, now_ms: f64) -> TimelineResult<DragMode> {
        if !pointer_ms.is_finite() {
            return Err(self.reject(pointer_ms, pointer_ms));
        }

        let tolerance = self.tuning.handle_tolerance_ms;
        let to_left = (pointer_ms - self.selection.start_ms).abs();
        let to_right = (pointer_ms - self.selection.end_ms).abs();

        let mode = if to_left <= tolerance || to_right <= tolerance {
            if to_left <= to_right {
                DragMode::Left
            } else {
                DragMode::Right
            }
        } else if self.selection.contains(pointer_ms) {
            DragMode::Move
        } else {
            DragMode::None
        };

        if mode == DragMode::None {
            let width = self.tuning.default_width_ms.max(self.tuning.min_range_ms);
            let window = self.fit_span(pointer_ms - width / 2.0, width);
            self.apply_selection(window);
            self.commit_pending = true;
            self.drag = DragMode::Move;
            self.gesture = GestureState::NewSelection;
        } else {
            self.drag = mode;
            self.gesture = GestureState::Dragging(mode);
        }

        self.anchor = Some(DragAnchor {
            pointer_ms,
            window: self.selection,
        });
        self.last_activity_ms = Some(now_ms);
        debug!(pointer_ms, gesture = ?self.gesture, "begin drag");
        Ok(self.drag)
    }

    /// Preview update for an in-progress drag. Returns `None` when idle.
    pub fn update_drag(
        &mut self,
        pointer_ms: f64,
        now_ms: f64,
    ) -> TimelineResult<Option<SelectionWindow>> {
        let Some(anchor) = self.anchor else {
            return Ok(None);
        };
        if !pointer_ms.is_finite() {
            return Err(self.reject(pointer_ms, pointer_ms));
        }

        let min_width = self.effective_min_width();
        let domain = self.domain;
        let window = match self.drag {
            DragMode::None => return Ok(None),
            DragMode::Left => {
                let right = anchor.window.end_ms;
                let left = pointer_ms.max(domain.start_ms).min(right - min_width);
                SelectionWindow::new(left, right)
            }
            DragMode::Right => {
                let left = anchor.window.start_ms;
                let right = pointer_ms.min(domain.end_ms).max(left + min_width);
                SelectionWindow::new(left, right)
            }
            DragMode::Move => {
                let delta = pointer_ms - anchor.pointer_ms;
                self.fit_span(anchor.window.start_ms + delta, anchor.window.width_ms())
            }
        };

        if !window.is_finite() {
            return Err(self.reject(window.start_ms, window.end_ms));
        }

        self.apply_selection(window);
        self.commit_pending = true;
        self.last_activity_ms = Some(now_ms);
        trace!(
            start_ms = window.start_ms,
            end_ms = window.end_ms,
            mode = ?self.drag,
            "drag preview"
        );
        Ok(Some(window))
    }

    /// Pointer release: ends the gesture and commits.
    pub fn end_drag(&mut self, now_ms: f64) -> Option<SelectionWindow> {
        if self.anchor.is_none() {
            return None;
        }
        self.drag = DragMode::None;
        self.gesture = GestureState::Idle;
        self.anchor = None;
        self.last_activity_ms = Some(now_ms);
        self.commit()
    }

    /// Emits the current window when it differs from the last committed one.
    ///
    /// Suppressed while `Initializing`.
    pub fn commit(&mut self) -> Option<SelectionWindow> {
        if self.phase == ControllerPhase::Initializing {
            trace!("commit suppressed during initialization");
            return None;
        }
        if !self.commit_pending {
            return None;
        }
        self.commit_pending = false;
        if self.last_committed == Some(self.selection) {
            return None;
        }
        self.last_committed = Some(self.selection);
        debug!(
            start_ms = self.selection.start_ms,
            end_ms = self.selection.end_ms,
            "window committed"
        );
        Some(self.selection)
    }

    /// Commits a pending change once the debounce interval has elapsed.
    ///
    /// Changes with no activity timestamp (`set_window`, `recenter`,
    /// `restore_window`) start their quiet period at the first poll.
    pub fn poll_debounce(&mut self, now_ms: f64) -> Option<SelectionWindow> {
        if !self.commit_pending {
            return None;
        }
        match self.last_activity_ms {
            None => {
                self.last_activity_ms = Some(now_ms);
                None
            }
            Some(last) if now_ms - last < self.tuning.commit_debounce_ms => None,
            Some(_) => self.commit(),
        }
    }

    fn apply_selection(&mut self, window: SelectionWindow) {
        self.selection = window;
        self.cursor = Cursor::new(window.clamp(self.cursor.timestamp_ms));
    }

    fn effective_min_width(&self) -> f64 {
        self.tuning.min_range_ms.min(self.domain.width_ms())
    }

    /// Places a span of `width` starting at `start_ms`, shifted to stay inside
    /// the domain and shrunk only when the domain itself is narrower.
    fn fit_span(&self, start_ms: f64, width: f64) -> SelectionWindow {
        let domain = self.domain;
        let width = width.min(domain.width_ms());
        let start = start_ms.clamp(domain.start_ms, domain.end_ms - width);
        SelectionWindow::new(start, start + width)
    }

    fn constrain(&self, start_ms: f64, end_ms: f64) -> TimelineResult<SelectionWindow> {
        if !start_ms.is_finite() || !end_ms.is_finite() {
            return Err(self.reject(start_ms, end_ms));
        }

        let domain = self.domain;
        let (lo, hi) = if start_ms <= end_ms {
            (start_ms, end_ms)
        } else {
            (end_ms, start_ms)
        };
        let mut start = domain.clamp(lo);
        let mut end = domain.clamp(hi);

        let min_width = self.effective_min_width();
        if end - start < min_width {
            end = start + min_width;
            if end > domain.end_ms {
                end = domain.end_ms;
                start = end - min_width;
            }
        }

        Ok(SelectionWindow::new(start, end))
    }

    fn reject(&self, start_ms: f64, end_ms: f64) -> TimelineError {
        warn!(
            start_ms,
            end_ms,
            kept_start_ms = self.selection.start_ms,
            kept_end_ms = self.selection.end_ms,
            "rejecting non-finite window update"
        );
        TimelineError::InvalidWindow {
            start: start_ms,
            end: end_ms,
        }
    }
}

use tracing::trace;

use crate::core::{Cursor, SelectionWindow};
use crate::error::TimelineResult;
use crate::extensions::CursorEvent;
use crate::interaction::DragMode;

use super::{FetchRequest, TimelineEngine};

impl TimelineEngine {
    /// Applies a saved window while initializing; no reload is scheduled.
    pub fn restore_window(&mut self, start_ms: f64, end_ms: f64) -> TimelineResult<SelectionWindow> {
        let window = self.controller.restore_window(start_ms, end_ms)?;
        self.queue_cursor_sync();
        Ok(window)
    }

    /// Ends initialization and issues the first load for the current window.
    pub fn initialize(&mut self) -> FetchRequest {
        let window = self.controller.finish_initialization();
        self.queue_cursor_sync();
        self.trigger_reload(window)
    }

    pub fn pointer_down(&mut self, pointer_ms: f64, now_ms: f64) -> TimelineResult<DragMode> {
        let mode = self.controller.begin_drag(pointer_ms, now_ms)?;
        self.queue_cursor_sync();
        Ok(mode)
    }

    /// Drag preview; never triggers a reload.
    pub fn pointer_move(
        &mut self,
        pointer_ms: f64,
        now_ms: f64,
    ) -> TimelineResult<Option<SelectionWindow>> {
        let preview = self.controller.update_drag(pointer_ms, now_ms)?;
        if preview.is_some() {
            self.queue_cursor_sync();
        }
        Ok(preview)
    }

    /// Pointer release; returns the reload request when the window changed.
    pub fn pointer_up(&mut self, now_ms: f64) -> Option<FetchRequest> {
        let committed = self.controller.end_drag(now_ms)?;
        Some(self.trigger_reload(committed))
    }

    /// Moves the shared cursor, clamped into the selection window.
    pub fn seek(&mut self, timestamp_ms: f64) -> TimelineResult<Cursor> {
        let cursor = self.controller.seek(timestamp_ms)?;
        self.queue_cursor_sync();
        Ok(cursor)
    }

    /// Programmatic window change, committed immediately.
    pub fn set_window(
        &mut self,
        start_ms: f64,
        end_ms: f64,
    ) -> TimelineResult<Option<FetchRequest>> {
        self.controller.set_window(start_ms, end_ms)?;
        self.queue_cursor_sync();
        Ok(self.controller.commit().map(|window| self.trigger_reload(window)))
    }

    /// Recenters the window on `timestamp_ms`, committed immediately.
    pub fn recenter(&mut self, timestamp_ms: f64) -> TimelineResult<Option<FetchRequest>> {
        self.controller.recenter(timestamp_ms)?;
        self.queue_cursor_sync();
        Ok(self.controller.commit().map(|window| self.trigger_reload(window)))
    }

    /// Forces a commit of any pending preview.
    pub fn commit(&mut self) -> Option<FetchRequest> {
        let window = self.controller.commit()?;
        Some(self.trigger_reload(window))
    }

    /// Animation-frame / timer hook: runs the commit debounce and delivers
    /// throttled cursor updates. Returns a reload request when a debounced
    /// commit fired.
    pub fn tick(&mut self, now_ms: f64) -> Option<FetchRequest> {
        let request = self
            .controller
            .poll_debounce(now_ms)
            .map(|window| self.trigger_reload(window));
        self.sync.on_animation_frame(now_ms);
        request
    }

    /// Delivers a pending cursor update immediately.
    pub fn flush_cursor(&mut self) -> bool {
        self.sync.flush()
    }

    pub(super) fn trigger_reload(&mut self, window: SelectionWindow) -> FetchRequest {
        let version = self.loads.begin();
        let request =
            FetchRequest::for_window(version, &self.config.device_id, &self.timeline, window);
        trace!(
            version,
            start_time = %request.start_time,
            end_time = %request.end_time,
            "reload triggered"
        );
        self.subscriptions.notify_window_commit(&request);
        request
    }

    pub(super) fn queue_cursor_sync(&mut self) {
        let cursor_ms = self.controller.cursor().timestamp_ms;
        self.sync.request(CursorEvent {
            cursor_ms,
            window: self.controller.selection(),
            gps: self.gps.position_at(cursor_ms),
        });
    }
}

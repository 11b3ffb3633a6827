use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::SampleResolution;
use crate::error::{TimelineError, TimelineResult};
use crate::extensions::{CursorConsumer, CursorEvent};

pub const DEFAULT_SYNC_MAX_RATE_HZ: f64 = 30.0;

/// Rate limits for cursor fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncTuning {
    pub max_rate_hz: f64,
    /// Drop cursor moves smaller than the current bucket resolution.
    pub suppress_sub_bucket_moves: bool,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            max_rate_hz: DEFAULT_SYNC_MAX_RATE_HZ,
            suppress_sub_bucket_moves: true,
        }
    }
}

impl SyncTuning {
    pub fn validate(self) -> TimelineResult<Self> {
        if !self.max_rate_hz.is_finite() || self.max_rate_hz <= 0.0 {
            return Err(TimelineError::InvalidConfig(
                "sync max rate must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn frame_interval_ms(self) -> f64 {
        1_000.0 / self.max_rate_hz
    }
}

/// Coalesces cursor updates and fans them out at most once per frame slot.
///
/// Requests only record the latest event; delivery happens on
/// `on_animation_frame`, so pointer handling never waits on consumers.
pub struct SyncBroadcaster {
    tuning: SyncTuning,
    min_delta_ms: f64,
    consumers: Vec<Box<dyn CursorConsumer>>,
    pending: Option<CursorEvent>,
    last_broadcast: Option<CursorEvent>,
    last_frame_ms: Option<f64>,
}

impl SyncBroadcaster {
    #[must_use]
    pub fn new(tuning: SyncTuning) -> Self {
        Self {
            tuning,
            min_delta_ms: SampleResolution::default().bucket_ms(),
            consumers: Vec::new(),
            pending: None,
            last_broadcast: None,
            last_frame_ms: None,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> SyncTuning {
        self.tuning
    }

    #[must_use]
    pub fn min_delta_ms(&self) -> f64 {
        self.min_delta_ms
    }

    pub fn set_min_delta_ms(&mut self, min_delta_ms: f64) {
        self.min_delta_ms = min_delta_ms.max(0.0);
    }

    pub fn register(&mut self, consumer: Box<dyn CursorConsumer>) {
        debug!(consumer = consumer.id(), "register cursor consumer");
        self.consumers.push(consumer);
    }

    /// Removes every consumer with `id`; returns whether any was removed.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.consumers.len();
        self.consumers.retain(|consumer| consumer.id() != id);
        before != self.consumers.len()
    }

    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn last_broadcast(&self) -> Option<CursorEvent> {
        self.last_broadcast
    }

    /// Queues an update; a later request before the next frame replaces it.
    pub fn request(&mut self, event: CursorEvent) {
        self.pending = Some(event);
    }

    /// Delivers the pending update if the frame interval has elapsed.
    ///
    /// Returns `true` when consumers were notified.
    pub fn on_animation_frame(&mut self, now_ms: f64) -> bool {
        if self.pending.is_none() {
            return false;
        }
        if let Some(last_frame) = self.last_frame_ms {
            if now_ms - last_frame < self.tuning.frame_interval_ms() {
                return false;
            }
        }
        let Some(event) = self.pending.take() else {
            return false;
        };
        if self.is_redundant(event) {
            trace!(cursor_ms = event.cursor_ms, "sub-resolution cursor move dropped");
            return false;
        }

        self.last_frame_ms = Some(now_ms);
        self.broadcast(event);
        true
    }

    /// Delivers the pending update immediately, bypassing rate limits.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(event) => {
                self.broadcast(event);
                true
            }
            None => false,
        }
    }

    fn is_redundant(&self, event: CursorEvent) -> bool {
        let Some(last) = self.last_broadcast else {
            return false;
        };
        if last.window != event.window || last.gps != event.gps {
            return false;
        }
        let delta = (event.cursor_ms - last.cursor_ms).abs();
        if self.tuning.suppress_sub_bucket_moves {
            delta < self.min_delta_ms
        } else {
            delta == 0.0
        }
    }

    fn broadcast(&mut self, event: CursorEvent) {
        trace!(
            cursor_ms = event.cursor_ms,
            consumers = self.consumers.len(),
            "broadcast cursor"
        );
        for consumer in &mut self.consumers {
            consumer.on_cursor(event);
        }
        self.last_broadcast = Some(event);
    }
}

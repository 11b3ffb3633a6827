use indexmap::IndexMap;
use tracing::debug;

use crate::core::{
    Cursor, GpsPosition, GpsTrack, LinearScale, ResolutionDetector, ResolvedTimeline,
    SampleResolution, SelectionWindow, Series, ShiftDefinition, TimelineDomain, TimelineResolver,
    Viewport,
};
use crate::error::TimelineResult;
use crate::extensions::{CallbackConsumer, CursorConsumer, CursorEvent};
use crate::interaction::{ControllerPhase, WindowController};

use super::subscriptions::{SubscriptionId, Subscriptions};
use super::{FetchRequest, LoadFailure, LoadTracker, SyncBroadcaster, TimelineEngineConfig};

/// Main orchestration facade consumed by dashboards.
///
/// `TimelineEngine` owns the resolved shift timeline, the window controller,
/// the cursor broadcaster, the normalized series of the last applied load and
/// the GPS track. All mutation happens on the caller's event-loop thread.
pub struct TimelineEngine {
    pub(super) config: TimelineEngineConfig,
    pub(super) timeline: ResolvedTimeline,
    pub(super) controller: WindowController,
    pub(super) sync: SyncBroadcaster,
    pub(super) detector: ResolutionDetector,
    pub(super) resolution: SampleResolution,
    pub(super) series: IndexMap<String, Series>,
    pub(super) gps: GpsTrack,
    pub(super) loads: LoadTracker,
    pub(super) subscriptions: Subscriptions,
}

impl TimelineEngine {
    /// Builds an engine for `shift_descriptor` on `date`.
    pub fn new(
        config: TimelineEngineConfig,
        shift_descriptor: &str,
        date: &str,
    ) -> TimelineResult<Self> {
        Self::with_timeline(config, TimelineResolver::resolve(shift_descriptor, date))
    }

    pub fn with_timeline(
        config: TimelineEngineConfig,
        timeline: ResolvedTimeline,
    ) -> TimelineResult<Self> {
        let config = config.validate()?;
        let controller = WindowController::new(timeline.domain, config.window);
        let sync = SyncBroadcaster::new(config.sync);
        let detector = ResolutionDetector::new(config.resolution_scan_limit);

        Ok(Self {
            config,
            timeline,
            controller,
            sync,
            detector,
            resolution: SampleResolution::default(),
            series: IndexMap::new(),
            gps: GpsTrack::default(),
            loads: LoadTracker::default(),
            subscriptions: Subscriptions::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &TimelineEngineConfig {
        &self.config
    }

    #[must_use]
    pub fn timeline(&self) -> &ResolvedTimeline {
        &self.timeline
    }

    #[must_use]
    pub fn shift(&self) -> ShiftDefinition {
        self.timeline.shift
    }

    #[must_use]
    pub fn domain(&self) -> TimelineDomain {
        self.timeline.domain
    }

    #[must_use]
    pub fn phase(&self) -> ControllerPhase {
        self.controller.phase()
    }

    #[must_use]
    pub fn controller(&self) -> &WindowController {
        &self.controller
    }

    #[must_use]
    pub fn resolution(&self) -> SampleResolution {
        self.resolution
    }

    #[must_use]
    pub fn load_version(&self) -> u64 {
        self.loads.current()
    }

    /// Re-resolves the timeline for a new shift or date.
    ///
    /// Loaded data is dropped, in-flight loads become stale and the window
    /// controller returns to `Initializing`.
    pub fn set_shift(&mut self, shift_descriptor: &str, date: &str) {
        self.apply_timeline(TimelineResolver::resolve(shift_descriptor, date));
    }

    pub fn apply_timeline(&mut self, timeline: ResolvedTimeline) {
        debug!(
            shift = %timeline.shift.canonical_descriptor(),
            base_day = %timeline.base_day,
            "timeline changed"
        );
        self.timeline = timeline;
        self.controller.set_domain(timeline.domain);
        self.series.clear();
        self.gps = GpsTrack::default();
        self.resolution = SampleResolution::default();
        self.sync.set_min_delta_ms(self.resolution.bucket_ms());
        self.loads.invalidate();
    }

    #[must_use]
    pub fn get_normalized_series(&self, channel_id: &str) -> Option<&Series> {
        self.series.get(channel_id)
    }

    /// Series of the last applied load, in source order.
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    #[must_use]
    pub fn get_current_window(&self) -> SelectionWindow {
        self.controller.selection()
    }

    #[must_use]
    pub fn get_cursor(&self) -> Cursor {
        self.controller.cursor()
    }

    #[must_use]
    pub fn gps_track(&self) -> &GpsTrack {
        &self.gps
    }

    #[must_use]
    pub fn get_gps_position_at(&self, cursor_ms: f64) -> Option<GpsPosition> {
        self.gps.position_at(cursor_ms)
    }

    /// Maps a timeline-bar pixel to a timestamp across the full domain.
    pub fn map_pixel_to_time(&self, pixel: f64, viewport: Viewport) -> TimelineResult<f64> {
        self.domain_scale()?.pixel_to_time(pixel, viewport)
    }

    pub fn map_time_to_pixel(&self, timestamp_ms: f64, viewport: Viewport) -> TimelineResult<f64> {
        self.domain_scale()?.time_to_pixel(timestamp_ms, viewport)
    }

    fn domain_scale(&self) -> TimelineResult<LinearScale> {
        let domain = self.timeline.domain;
        LinearScale::new(domain.start_ms, domain.end_ms)
    }

    /// Registers a handler called with the fetch request of every commit.
    pub fn on_window_commit<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&FetchRequest) + 'static,
    {
        let id = self.subscriptions.next_id();
        self.subscriptions.add_window_commit(id, Box::new(handler));
        id
    }

    /// Registers a handler for broadcast cursor updates.
    pub fn on_cursor_change<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(CursorEvent) + 'static,
    {
        let id = self.subscriptions.next_id();
        self.sync
            .register(Box::new(CallbackConsumer::new(id.consumer_key(), handler)));
        id
    }

    pub fn on_load_failed<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&LoadFailure) + 'static,
    {
        let id = self.subscriptions.next_id();
        self.subscriptions.add_load_failed(id, Box::new(handler));
        id
    }

    /// Registers a named cursor consumer (chart crosshair, map marker, ...).
    pub fn register_consumer(&mut self, consumer: Box<dyn CursorConsumer>) {
        self.sync.register(consumer);
    }

    pub fn unregister_consumer(&mut self, id: &str) -> bool {
        self.sync.unregister(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed_handler = self.subscriptions.remove(id);
        let removed_consumer = self.sync.unregister(&id.consumer_key());
        removed_handler || removed_consumer
    }
}

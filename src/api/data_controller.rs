use tracing::{debug, warn};

use crate::core::{GpsTrack, SeriesNormalizer};

use super::payload::{self, TelemetryPayload};
use super::{FetchFailure, LoadFailure, LoadOutcome, TimelineEngine};

impl TimelineEngine {
    /// Hands the result of the fetch for `version` back to the engine.
    ///
    /// Results for superseded versions are dropped without touching state.
    /// A failed fetch clears all series and notifies `on_load_failed`
    /// subscribers; nothing is substituted for the missing data.
    pub fn apply_load(
        &mut self,
        version: u64,
        result: Result<TelemetryPayload, FetchFailure>,
    ) -> LoadOutcome {
        if !self.loads.is_current(version) {
            debug!(
                version,
                current = self.loads.current(),
                "discarding stale load result"
            );
            return LoadOutcome::Stale {
                version,
                current: self.loads.current(),
            };
        }

        match result {
            Ok(payload) => self.apply_payload(version, &payload),
            Err(failure) => self.apply_failure(version, failure),
        }
    }

    fn apply_payload(&mut self, version: u64, payload: &TelemetryPayload) -> LoadOutcome {
        let adapted = payload::adapt(payload, &self.timeline);
        let resolution =
            self.detector
                .detect(&adapted.timestamps_ms, adapted.point_times(), adapted.hint);
        let normalizer = SeriesNormalizer::new(self.timeline, resolution)
            .with_disagreement_ms(self.config.timestamp_disagreement_ms);

        self.series = normalizer.normalize_all(&adapted.channels);
        self.gps = adapted.gps;
        self.resolution = resolution;
        self.sync.set_min_delta_ms(resolution.bucket_ms());
        self.queue_cursor_sync();

        debug!(
            version,
            channels = self.series.len(),
            gps_samples = self.gps.len(),
            ?resolution,
            "applied load"
        );
        LoadOutcome::Applied {
            version,
            channels: self.series.len(),
            resolution,
        }
    }

    fn apply_failure(&mut self, version: u64, failure: FetchFailure) -> LoadOutcome {
        warn!(version, error = %failure, "telemetry load failed");
        self.series.clear();
        self.gps = GpsTrack::default();

        let signal = LoadFailure {
            version,
            reason: failure.reason,
        };
        self.subscriptions.notify_load_failed(&signal);
        LoadOutcome::Failed {
            version: signal.version,
            reason: signal.reason,
        }
    }
}

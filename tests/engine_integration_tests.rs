use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use shift_timeline::api::{FetchFailure, FetchRequest, LoadFailure, LoadOutcome, TelemetryPayload};
use shift_timeline::core::{GpsPosition, SampleResolution, TimelineResolver, Viewport};
use shift_timeline::extensions::CursorEvent;
use shift_timeline::interaction::{ControllerPhase, DragMode};
use shift_timeline::{TimelineEngine, TimelineEngineConfig};

const JAN_15_0600_MS: f64 = 1_736_920_800_000.0;
const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 3_600_000.0;

const PAYLOAD_JSON: &str = r#"{
    "resolution": "minute",
    "timestamps": [
        { "time": "06:00:00", "timestamp": "2025-01-15T06:00:00Z" },
        { "time": "06:01:00", "timestamp": 1736920860000 }
    ],
    "analog": [
        {
            "id": 12,
            "name": "Coolant",
            "unit": "C",
            "resolution": 0.1,
            "offset": -40,
            "yAxisRange": { "min": -40, "max": 150 },
            "points": [
                { "time": "06:00:00", "avg": 1200, "min": 1100, "max": 1300 },
                { "time": "06:01:00", "value": 1210 },
                { "time": "06:02:00", "avg": null }
            ]
        }
    ],
    "digital": [
        { "id": "ignition", "points": [{ "time": "06:00:00", "avg": 1 }] },
        { "id": "hidden", "display": false, "points": [{ "time": "06:00:00", "avg": 1 }] }
    ],
    "gpsPerSecond": [
        { "time": "06:00:00", "lat": 52.1, "lng": 4.3 },
        { "time": "06:01:00", "lat": 52.2, "lng": 4.4 }
    ]
}"#;

fn day_engine() -> TimelineEngine {
    let today = NaiveDate::from_ymd_opt(2030, 6, 1).expect("valid date");
    let timeline = TimelineResolver::resolve_at("6 AM to 6 PM", "2025-01-15", today);
    TimelineEngine::with_timeline(TimelineEngineConfig::new("truck-7"), timeline)
        .expect("engine init")
}

fn payload() -> TelemetryPayload {
    TelemetryPayload::from_json_str(PAYLOAD_JSON).expect("valid payload")
}

#[test]
fn initialize_issues_first_fetch_for_full_shift() {
    let mut engine = day_engine();
    assert_eq!(engine.phase(), ControllerPhase::Initializing);

    let request = engine.initialize();
    assert_eq!(engine.phase(), ControllerPhase::Interactive);
    assert_eq!(request.version, 1);
    assert_eq!(request.device_id, "truck-7");
    assert_eq!(request.date, "2025-01-15");
    assert_eq!(request.shift, "06:00:00to18:00:00");
    assert_eq!(request.start_time, "06:00:00");
    assert_eq!(request.end_time, "18:00:00");
    assert_eq!(engine.load_version(), 1);
}

#[test]
fn applied_payload_yields_transformed_series_and_gps() {
    let mut engine = day_engine();
    let request = engine.initialize();

    let outcome = engine.apply_load(request.version, Ok(payload()));
    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            version: 1,
            channels: 2,
            resolution: SampleResolution::PerMinute,
        }
    );
    assert_eq!(engine.resolution(), SampleResolution::PerMinute);

    let ids: Vec<&str> = engine.series().map(|series| series.id()).collect();
    assert_eq!(ids, vec!["12", "ignition"]);
    assert!(engine.get_normalized_series("hidden").is_none());

    let coolant = engine.get_normalized_series("12").expect("coolant series");
    assert_eq!(coolant.meta.name, "Coolant");
    assert_eq!(coolant.len(), 2);
    assert_eq!(coolant.points[0].timestamp_ms, JAN_15_0600_MS);
    assert!((coolant.points[0].avg - 80.0).abs() <= 1e-9);
    assert!((coolant.points[0].max.expect("max") - 90.0).abs() <= 1e-9);
    assert!((coolant.points[1].avg - 81.0).abs() <= 1e-9);
    let axis = coolant.y_axis_range().expect("configured axis");
    assert_eq!((axis.min, axis.max), (-40.0, 150.0));

    assert_eq!(engine.gps_track().len(), 2);
    assert_eq!(
        engine.get_gps_position_at(JAN_15_0600_MS + 30_000.0),
        Some(GpsPosition { lat: 52.1, lng: 4.3 })
    );
}

const MALFORMED_ROWS_JSON: &str = r#"{
    "timestamps": [
        { "time": null, "timestamp": true },
        { "time": "06:00:00", "timestamp": "2025-01-15T06:00:00Z" }
    ],
    "analog": [
        {
            "id": "speed",
            "points": [
                { "time": null, "avg": 2.0 },
                { "time": "06:00:00", "avg": 40 },
                { "time": "06:01:00", "avg": "n/a" },
                { "time": 361, "avg": 7 },
                { "time": "06:02:00", "avg": "42.5", "min": {} }
            ]
        }
    ],
    "gpsPerSecond": [
        { "time": "06:00:00", "lat": null, "lng": 4.3 },
        { "time": "06:01:00", "lat": 52.2, "lng": 4.4 }
    ]
}"#;

#[test]
fn malformed_points_are_dropped_and_the_rest_of_the_load_survives() {
    let parsed = TelemetryPayload::from_json_str(MALFORMED_ROWS_JSON).expect("lenient payload");
    let mut engine = day_engine();
    let request = engine.initialize();

    let outcome = engine.apply_load(request.version, Ok(parsed));
    assert!(matches!(outcome, LoadOutcome::Applied { channels: 1, .. }));

    let speed = engine.get_normalized_series("speed").expect("speed series");
    let times: Vec<f64> = speed.points.iter().map(|point| point.timestamp_ms).collect();
    assert_eq!(times, vec![JAN_15_0600_MS, JAN_15_0600_MS + 2.0 * MINUTE_MS]);
    assert_eq!(speed.points[1].avg, 42.5);
    assert_eq!(speed.points[1].min, None);

    assert_eq!(engine.gps_track().len(), 1);
    assert_eq!(
        engine.get_gps_position_at(JAN_15_0600_MS),
        Some(GpsPosition { lat: 52.2, lng: 4.4 })
    );
}

#[test]
fn stale_results_are_discarded_without_touching_state() {
    let mut engine = day_engine();
    let first = engine.initialize();
    let second = engine
        .set_window(JAN_15_0600_MS + HOUR_MS, JAN_15_0600_MS + 3.0 * HOUR_MS)
        .expect("valid window")
        .expect("changed window reloads");
    assert!(second.version > first.version);
    assert_eq!(second.start_time, "07:00:00");
    assert_eq!(second.end_time, "09:00:00");

    let outcome = engine.apply_load(first.version, Ok(payload()));
    assert_eq!(
        outcome,
        LoadOutcome::Stale {
            version: first.version,
            current: second.version,
        }
    );
    assert_eq!(engine.series().count(), 0);
    assert!(engine.gps_track().is_empty());

    assert!(engine.apply_load(second.version, Ok(payload())).is_applied());
    assert_eq!(engine.series().count(), 2);
}

#[test]
fn failed_load_clears_data_and_notifies_subscribers() {
    let mut engine = day_engine();
    let failures: Rc<RefCell<Vec<LoadFailure>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&failures);
    engine.on_load_failed(move |failure| sink.borrow_mut().push(failure.clone()));

    let first = engine.initialize();
    engine.apply_load(first.version, Ok(payload()));
    assert_eq!(engine.series().count(), 2);

    let second = engine
        .set_window(JAN_15_0600_MS + HOUR_MS, JAN_15_0600_MS + 3.0 * HOUR_MS)
        .expect("valid window")
        .expect("changed window reloads");
    let outcome = engine.apply_load(second.version, Err(FetchFailure::new("timeout")));

    assert_eq!(
        outcome,
        LoadOutcome::Failed {
            version: second.version,
            reason: "timeout".to_owned(),
        }
    );
    assert_eq!(engine.series().count(), 0);
    assert!(engine.gps_track().is_empty());
    assert_eq!(
        failures.borrow().as_slice(),
        &[LoadFailure {
            version: second.version,
            reason: "timeout".to_owned(),
        }]
    );
}

#[test]
fn window_commit_subscribers_see_every_reload_until_unsubscribed() {
    let mut engine = day_engine();
    let commits: Rc<RefCell<Vec<FetchRequest>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&commits);
    let id = engine.on_window_commit(move |request| sink.borrow_mut().push(request.clone()));

    engine.initialize();
    engine
        .set_window(JAN_15_0600_MS + HOUR_MS, JAN_15_0600_MS + 3.0 * HOUR_MS)
        .expect("valid window");
    assert_eq!(commits.borrow().len(), 2);

    let mode = engine
        .pointer_down(JAN_15_0600_MS + 2.0 * HOUR_MS, 0.0)
        .expect("valid press");
    assert_eq!(mode, DragMode::Move);
    let preview = engine
        .pointer_move(JAN_15_0600_MS + 2.5 * HOUR_MS, 16.0)
        .expect("valid move")
        .expect("dragging");
    assert_eq!(preview.start_ms, JAN_15_0600_MS + 1.5 * HOUR_MS);
    assert_eq!(commits.borrow().len(), 2, "previews never reload");

    let released = engine.pointer_up(32.0).expect("release reloads");
    assert_eq!(released.start_time, "07:30:00");
    assert_eq!(commits.borrow().len(), 3);
    assert_eq!(commits.borrow()[2], released);

    assert!(engine.unsubscribe(id));
    assert!(!engine.unsubscribe(id));
    engine
        .set_window(JAN_15_0600_MS, JAN_15_0600_MS + 2.0 * HOUR_MS)
        .expect("valid window");
    assert_eq!(commits.borrow().len(), 3);
}

#[test]
fn restored_window_does_not_reload_before_initialization() {
    let mut engine = day_engine();
    let commits = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&commits);
    engine.on_window_commit(move |_| *sink.borrow_mut() += 1);

    engine
        .restore_window(JAN_15_0600_MS + HOUR_MS, JAN_15_0600_MS + 2.0 * HOUR_MS)
        .expect("valid window");
    assert_eq!(engine.tick(10_000.0), None);
    assert_eq!(engine.commit(), None);
    assert_eq!(*commits.borrow(), 0);

    let request = engine.initialize();
    assert_eq!(request.start_time, "07:00:00");
    assert_eq!(*commits.borrow(), 1);
}

#[test]
fn cursor_subscribers_receive_throttled_events_with_gps() {
    let mut engine = day_engine();
    let events: Rc<RefCell<Vec<CursorEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.on_cursor_change(move |event| sink.borrow_mut().push(event));

    let request = engine.initialize();
    engine.apply_load(request.version, Ok(payload()));
    engine.tick(0.0);
    assert_eq!(events.borrow().len(), 1);
    assert_eq!(events.borrow()[0].gps, Some(GpsPosition { lat: 52.1, lng: 4.3 }));

    engine.seek(JAN_15_0600_MS + MINUTE_MS).expect("finite");
    engine.tick(5.0);
    assert_eq!(events.borrow().len(), 1, "inside the frame slot");
    engine.tick(50.0);
    assert_eq!(events.borrow().len(), 2);
    let last = events.borrow()[1];
    assert_eq!(last.cursor_ms, JAN_15_0600_MS + MINUTE_MS);
    assert_eq!(last.gps, Some(GpsPosition { lat: 52.2, lng: 4.4 }));

    engine.seek(JAN_15_0600_MS + MINUTE_MS + 1_000.0).expect("finite");
    engine.tick(200.0);
    assert_eq!(events.borrow().len(), 2, "sub-minute move on per-minute data");
    assert_eq!(engine.get_cursor().timestamp_ms, JAN_15_0600_MS + MINUTE_MS + 1_000.0);
}

#[test]
fn shift_change_invalidates_in_flight_loads() {
    let mut engine = day_engine();
    let request = engine.initialize();
    engine.set_shift("6 PM to 6 AM", "2025-01-16");

    assert_eq!(engine.phase(), ControllerPhase::Initializing);
    assert!(engine.shift().crosses_midnight);
    assert_eq!(engine.domain().start_ms, 1_736_964_000_000.0);
    assert_eq!(engine.get_current_window().end_ms, 1_737_007_200_000.0);

    let outcome = engine.apply_load(request.version, Ok(payload()));
    assert!(matches!(outcome, LoadOutcome::Stale { .. }));

    let overnight = engine.initialize();
    assert_eq!(overnight.date, "2025-01-15");
    assert_eq!(overnight.shift, "18:00:00to06:00:00");
}

#[test]
fn timeline_bar_pixels_map_across_full_domain() {
    let engine = day_engine();
    let viewport = Viewport::new(1_200, 40);

    let noon = engine.map_pixel_to_time(600.0, viewport).expect("valid viewport");
    assert!((noon - (JAN_15_0600_MS + 6.0 * HOUR_MS)).abs() <= 1e-3);
    let px = engine
        .map_time_to_pixel(JAN_15_0600_MS + 3.0 * HOUR_MS, viewport)
        .expect("valid viewport");
    assert!((px - 300.0).abs() <= 1e-9);

    assert!(engine.map_pixel_to_time(10.0, Viewport::new(0, 40)).is_err());
}

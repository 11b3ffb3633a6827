use shift_timeline::api::SyncTuning;
use shift_timeline::interaction::WindowTuning;
use shift_timeline::{TimelineEngine, TimelineEngineConfig, TimelineError};

#[test]
fn defaults_match_documented_tuning() {
    let config = TimelineEngineConfig::new("truck-7");
    assert_eq!(config.window.min_range_ms, 3_600_000.0);
    assert_eq!(config.window.default_width_ms, 3_600_000.0);
    assert_eq!(config.window.handle_tolerance_ms, 900_000.0);
    assert_eq!(config.window.commit_debounce_ms, 500.0);
    assert_eq!(config.sync.max_rate_hz, 30.0);
    assert!(config.sync.suppress_sub_bucket_moves);
    assert_eq!(config.resolution_scan_limit, 2_000);
    assert_eq!(config.timestamp_disagreement_ms, 12.0 * 3_600_000.0);
}

#[test]
fn config_json_round_trip_preserves_tuning() {
    let config = TimelineEngineConfig::new("truck-7")
        .with_min_range_ms(1_800_000.0)
        .with_sync_tuning(SyncTuning {
            max_rate_hz: 60.0,
            suppress_sub_bucket_moves: false,
        })
        .with_resolution_scan_limit(500)
        .with_timestamp_disagreement_ms(60_000.0);

    let json = config.to_json_pretty().expect("serialize");
    let parsed = TimelineEngineConfig::from_json_str(&json).expect("parse");
    assert_eq!(parsed, config);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let parsed = TimelineEngineConfig::from_json_str(r#"{ "device_id": "truck-9" }"#)
        .expect("parse minimal config");
    assert_eq!(parsed, TimelineEngineConfig::new("truck-9"));
}

#[test]
fn malformed_json_is_reported_as_invalid_config() {
    let err = TimelineEngineConfig::from_json_str("{ device_id: ").expect_err("malformed");
    assert!(matches!(err, TimelineError::InvalidConfig(_)));
}

#[test]
fn invalid_tuning_is_rejected_at_engine_construction() {
    let bad_configs = [
        TimelineEngineConfig::new("d").with_min_range_ms(0.0),
        TimelineEngineConfig::new("d").with_window_tuning(WindowTuning {
            commit_debounce_ms: -1.0,
            ..WindowTuning::default()
        }),
        TimelineEngineConfig::new("d").with_sync_tuning(SyncTuning {
            max_rate_hz: 0.0,
            suppress_sub_bucket_moves: true,
        }),
        TimelineEngineConfig::new("d").with_resolution_scan_limit(1),
        TimelineEngineConfig::new("d").with_timestamp_disagreement_ms(f64::NAN),
    ];

    for config in bad_configs {
        let result = TimelineEngine::new(config, "6 AM to 6 PM", "2025-01-15");
        assert!(matches!(result, Err(TimelineError::InvalidConfig(_))));
    }
}

#[test]
fn custom_min_range_reaches_the_window_controller() {
    let config = TimelineEngineConfig::new("d").with_min_range_ms(600_000.0);
    let mut engine = TimelineEngine::new(config, "6 AM to 6 PM", "2025-01-15").expect("engine init");
    engine.initialize();

    let start = engine.domain().start_ms;
    engine.set_window(start, start + 1_000.0).expect("valid window");
    assert_eq!(engine.get_current_window().width_ms(), 600_000.0);
}

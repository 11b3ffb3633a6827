use approx::assert_relative_eq;
use chrono::NaiveDate;
use shift_timeline::core::{
    AxisRange, ChannelKind, ChannelMeta, RawChannel, RawReading, ResolvedTimeline,
    SampleResolution, SelectionWindow, SeriesNormalizer, TimelineResolver, UnitTransform,
};

const JAN_15_MIDNIGHT_MS: f64 = 1_736_899_200_000.0;
const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 3_600_000.0;

fn day_timeline() -> ResolvedTimeline {
    let today = NaiveDate::from_ymd_opt(2030, 6, 1).expect("valid date");
    TimelineResolver::resolve_at("6 AM to 6 PM", "2025-01-15", today)
}

fn night_timeline() -> ResolvedTimeline {
    let today = NaiveDate::from_ymd_opt(2030, 6, 1).expect("valid date");
    TimelineResolver::resolve_at("6 PM to 6 AM", "2025-01-16", today)
}

fn channel(id: &str, readings: Vec<RawReading>) -> RawChannel {
    RawChannel {
        meta: ChannelMeta::new(id, ChannelKind::Analog),
        readings,
    }
}

#[test]
fn unit_transform_scales_then_offsets() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let transform = UnitTransform::new(0.1, -40.0);
    let point = normalizer
        .normalize_point(&RawReading::new("06:00:00", Some(1_200.0)), transform)
        .expect("valid point");

    assert_relative_eq!(point.avg, 80.0, epsilon = 1e-9);
    assert_eq!(point.timestamp_ms, JAN_15_MIDNIGHT_MS + 6.0 * HOUR_MS);
}

#[test]
fn envelope_values_share_the_channel_transform() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let reading = RawReading::new("07:00:00", Some(10.0)).with_min_max(Some(8.0), Some(f64::NAN));
    let point = normalizer
        .normalize_point(&reading, UnitTransform::new(2.0, 1.0))
        .expect("valid point");

    assert_relative_eq!(point.avg, 21.0);
    assert_eq!(point.min, Some(17.0));
    assert_eq!(point.max, None);
}

#[test]
fn missing_or_non_finite_average_drops_the_point() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let transform = UnitTransform::default();
    assert!(normalizer.normalize_point(&RawReading::new("07:00:00", None), transform).is_none());
    assert!(
        normalizer
            .normalize_point(&RawReading::new("07:00:00", Some(f64::INFINITY)), transform)
            .is_none()
    );
    assert!(normalizer.normalize_point(&RawReading::new("7 o'clock", Some(1.0)), transform).is_none());
}

#[test]
fn timestamps_are_floor_aligned_to_bucket() {
    let per_minute = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let point = per_minute
        .normalize_point(&RawReading::new("06:00:59", Some(1.0)), UnitTransform::default())
        .expect("valid point");
    assert_eq!(point.timestamp_ms, JAN_15_MIDNIGHT_MS + 6.0 * HOUR_MS);

    let per_second = SeriesNormalizer::new(day_timeline(), SampleResolution::PerSecond);
    let point = per_second
        .normalize_point(&RawReading::new("06:00:59", Some(1.0)), UnitTransform::default())
        .expect("valid point");
    assert_eq!(point.timestamp_ms, JAN_15_MIDNIGHT_MS + 6.0 * HOUR_MS + 59_000.0);
}

#[test]
fn channel_output_is_sorted_and_first_reading_wins_per_bucket() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let raw = channel(
        "rpm",
        vec![
            RawReading::new("06:02:00", Some(3.0)),
            RawReading::new("06:00:10", Some(1.0)),
            RawReading::new("06:00:40", Some(99.0)),
            RawReading::new("06:01:00", None),
            RawReading::new("bad", Some(5.0)),
            RawReading::new("06:01:30", Some(2.0)),
        ],
    );

    let (series, stats) = normalizer
        .normalize_channel_with_stats(&raw)
        .expect("displayable channel");

    let times: Vec<f64> = series.points.iter().map(|p| p.timestamp_ms).collect();
    let start = JAN_15_MIDNIGHT_MS + 6.0 * HOUR_MS;
    assert_eq!(times, vec![start, start + MINUTE_MS, start + 2.0 * MINUTE_MS]);
    assert_eq!(series.points[0].avg, 1.0);
    assert_eq!(series.points[1].avg, 2.0);

    assert_eq!(stats.input, 6);
    assert_eq!(stats.emitted, 3);
    assert_eq!(stats.dropped_invalid_time, 1);
    assert_eq!(stats.dropped_missing_avg, 1);
    assert_eq!(stats.duplicates, 1);
}

#[test]
fn overnight_readings_are_ordered_across_midnight() {
    let normalizer = SeriesNormalizer::new(night_timeline(), SampleResolution::PerMinute);
    let raw = channel(
        "temp",
        vec![
            RawReading::new("02:00:00", Some(2.0)),
            RawReading::new("23:59:00", Some(1.0)),
            RawReading::new("18:00:00", Some(0.0)),
        ],
    );
    let series = normalizer.normalize_channel(&raw).expect("displayable channel");
    let values: Vec<f64> = series.points.iter().map(|p| p.avg).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0]);
}

#[test]
fn non_displayable_channels_are_skipped() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let hidden = RawChannel {
        meta: ChannelMeta::new("hidden", ChannelKind::Digital).with_display(false),
        readings: vec![RawReading::new("07:00:00", Some(1.0))],
    };
    let shown = channel("shown", vec![RawReading::new("07:00:00", Some(1.0))]);

    assert!(normalizer.normalize_channel(&hidden).is_none());
    let all = normalizer.normalize_all([&hidden, &shown]);
    assert_eq!(all.len(), 1);
    assert!(all.contains_key("shown"));
}

#[test]
fn normalize_all_keeps_source_channel_order() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let channels = vec![
        channel("zeta", vec![RawReading::new("07:00:00", Some(1.0))]),
        channel("alpha", vec![]),
        channel("mid", vec![RawReading::new("08:00:00", Some(1.0))]),
    ];
    let all = normalizer.normalize_all(&channels);
    let ids: Vec<&str> = all.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    assert!(all["alpha"].is_empty());
}

#[test]
fn source_timestamp_is_used_when_close_to_timeline() {
    let normalizer = SeriesNormalizer::new(night_timeline(), SampleResolution::PerSecond);
    let derived = night_timeline().hms_to_timeline_ms("02:00:00").expect("valid");

    let close = RawReading::new("02:00:00", Some(1.0)).with_source_timestamp(derived + 3_000.0);
    assert_eq!(normalizer.resolve_timestamp(&close), Some(derived + 3_000.0));

    let a_day_off =
        RawReading::new("02:00:00", Some(1.0)).with_source_timestamp(derived - 24.0 * HOUR_MS);
    assert_eq!(normalizer.resolve_timestamp(&a_day_off), Some(derived));

    let strict = normalizer.with_disagreement_ms(1_000.0);
    assert_eq!(strict.resolve_timestamp(&close), Some(derived));
}

#[test]
fn series_lookup_and_window_slicing() {
    let normalizer = SeriesNormalizer::new(day_timeline(), SampleResolution::PerMinute);
    let raw = channel(
        "speed",
        (0..10)
            .map(|m| RawReading::new(format!("07:{m:02}:00"), Some(f64::from(m))))
            .collect(),
    );
    let series = normalizer.normalize_channel(&raw).expect("displayable channel");
    let seven = JAN_15_MIDNIGHT_MS + 7.0 * HOUR_MS;

    let hit = series.value_at(seven + 2.4 * MINUTE_MS).expect("non-empty series");
    assert_eq!(hit.avg, 2.0);
    let tie = series.value_at(seven + 2.5 * MINUTE_MS).expect("non-empty series");
    assert_eq!(tie.avg, 2.0);
    assert_eq!(series.value_at(0.0).map(|p| p.avg), Some(0.0));

    let window = SelectionWindow::new(seven + 3.0 * MINUTE_MS, seven + 5.0 * MINUTE_MS);
    let slice: Vec<f64> = series.in_window(window).iter().map(|p| p.avg).collect();
    assert_eq!(slice, vec![3.0, 4.0, 5.0]);

    assert_eq!(series.value_range(), Some(AxisRange { min: 0.0, max: 9.0 }));
    assert_eq!(series.y_axis_range(), series.value_range());
}

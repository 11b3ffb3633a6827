//! Telemetry helpers for dashboards embedding `shift-timeline`.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the host. `init_default_tracing` is a convenience for small tools and tests.

/// Directive used when `RUST_LOG` is unset: engine events at `info`, everything
/// else the host links in at `warn`.
pub const DEFAULT_FILTER: &str = "warn,shift_timeline=info";

/// Initializes a compact `tracing` subscriber when the `telemetry` feature is enabled.
///
/// The filter is read from `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]. Per-drag
/// previews log at `trace`, so `RUST_LOG=shift_timeline::interaction=trace` is
/// the usual way to follow a gesture. Returns `false` when the feature is
/// disabled or the host already installed a global subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .without_time()
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}

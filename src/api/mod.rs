mod data_controller;
mod engine;
mod engine_config;
mod load;
pub mod payload;
mod subscriptions;
mod sync;
mod window_coordinator;

pub use engine::TimelineEngine;
pub use engine_config::TimelineEngineConfig;
pub use load::{FetchFailure, FetchRequest, LoadFailure, LoadOutcome, LoadTracker};
pub use payload::{AdaptedLoad, TelemetryPayload};
pub use subscriptions::SubscriptionId;
pub use sync::{DEFAULT_SYNC_MAX_RATE_HZ, SyncBroadcaster, SyncTuning};

//! shift-timeline: shift-aware timeline and window synchronization engine.
//!
//! Resolves operator shifts (including overnight ones) into an absolute
//! timeline, normalizes per-channel telemetry readings onto it, and keeps a
//! selection window and cursor in sync across charts, tables and a GPS track.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod telemetry;

pub use api::{TimelineEngine, TimelineEngineConfig};
pub use error::{TimelineError, TimelineResult};

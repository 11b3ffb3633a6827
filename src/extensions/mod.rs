//! Hook points for components that follow the shared cursor.
//!
//! Consumers observe typed events only; they cannot mutate engine state.

pub mod consumers;

pub use consumers::{CallbackConsumer, CursorConsumer, CursorEvent};

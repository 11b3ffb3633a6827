use serde::{Deserialize, Serialize};

use crate::core::{GpsPosition, SelectionWindow};

/// Cursor update fanned out to every synchronized view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorEvent {
    pub cursor_ms: f64,
    pub window: SelectionWindow,
    /// Nearest GPS fix for `cursor_ms`, when a track is loaded.
    pub gps: Option<GpsPosition>,
}

/// A view that tracks the shared cursor: chart crosshairs, the digital-signal
/// timeline, the table view, the map marker.
pub trait CursorConsumer {
    fn id(&self) -> &str;
    fn on_cursor(&mut self, event: CursorEvent);
}

/// Adapts a closure into a [`CursorConsumer`].
pub struct CallbackConsumer<F>
where
    F: FnMut(CursorEvent),
{
    id: String,
    handler: F,
}

impl<F> CallbackConsumer<F>
where
    F: FnMut(CursorEvent),
{
    #[must_use]
    pub fn new(id: impl Into<String>, handler: F) -> Self {
        Self {
            id: id.into(),
            handler,
        }
    }
}

impl<F> CursorConsumer for CallbackConsumer<F>
where
    F: FnMut(CursorEvent),
{
    fn id(&self) -> &str {
        &self.id
    }

    fn on_cursor(&mut self, event: CursorEvent) {
        (self.handler)(event);
    }
}

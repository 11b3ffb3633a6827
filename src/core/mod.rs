pub mod gps;
pub mod resolution;
pub mod scale;
pub mod series;
pub mod shift;
pub mod timeline;
pub mod types;
pub mod windowing;

pub use gps::{GpsPosition, GpsSample, GpsTrack};
pub use resolution::{ResolutionDetector, ResolutionHint, SampleResolution};
pub use scale::LinearScale;
pub use series::{
    AxisRange, ChannelKind, ChannelMeta, NormalizeStats, NormalizedPoint, RawChannel, RawReading,
    Series, SeriesNormalizer, UnitTransform,
};
pub use shift::ShiftDefinition;
pub use timeline::{DateStyle, ResolvedTimeline, TimelineDomain, TimelineResolver};
pub use types::Viewport;
pub use windowing::{Cursor, SelectionWindow};

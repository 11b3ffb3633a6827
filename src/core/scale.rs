use crate::core::types::Viewport;
use crate::error::{TimelineError, TimelineResult};

/// Linear time-to-pixel mapping across a viewport's width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> TimelineResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(TimelineError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    pub fn time_to_pixel(self, timestamp_ms: f64, viewport: Viewport) -> TimelineResult<f64> {
        validate_viewport(viewport)?;
        if !timestamp_ms.is_finite() {
            return Err(TimelineError::InvalidData(
                "timestamp must be finite".to_owned(),
            ));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = (timestamp_ms - self.domain_start) / span;
        Ok(normalized * f64::from(viewport.width))
    }

    pub fn pixel_to_time(self, pixel: f64, viewport: Viewport) -> TimelineResult<f64> {
        validate_viewport(viewport)?;
        if !pixel.is_finite() {
            return Err(TimelineError::InvalidData("pixel must be finite".to_owned()));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = pixel / f64::from(viewport.width);
        Ok(self.domain_start + normalized * span)
    }
}

fn validate_viewport(viewport: Viewport) -> TimelineResult<()> {
    if viewport.is_valid() {
        Ok(())
    } else {
        Err(TimelineError::InvalidData(format!(
            "invalid viewport size: width={}, height={}",
            viewport.width, viewport.height
        )))
    }
}

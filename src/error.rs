use thiserror::Error;

pub type TimelineResult<T> = Result<T, TimelineError>;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid shift descriptor: {0:?}")]
    InvalidShift(String),

    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    #[error("invalid selection window: start={start}, end={end}")]
    InvalidWindow { start: f64, end: f64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("load {version} failed: {reason}")]
    LoadFailed { version: u64, reason: String },
}

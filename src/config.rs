use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::collector::TimestampKind;
use crate::error::AnalysisError;
use crate::rate::TimeUnit;

pub const DEFAULT_FOLDER: &str = ".";
pub const DEFAULT_EXTENSION: &str = ".sim";
pub const DEFAULT_WINDOW_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => panic!("default window size must be positive"),
};
pub const DEFAULT_TIME_UNIT: TimeUnit = TimeUnit::Hour;
pub const DEFAULT_TIMESTAMP_KIND: TimestampKind = TimestampKind::Creation;
pub const DEFAULT_GAP_FACTOR: f64 = 5.0;

/// Everything one analysis run needs. Built once at startup and passed down.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub folder: PathBuf,
    pub extension: String,
    pub window_size: NonZeroUsize,
    pub time_unit: TimeUnit,
    pub timestamp_kind: TimestampKind,
    pub gap_factor: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from(DEFAULT_FOLDER),
            extension: DEFAULT_EXTENSION.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            time_unit: DEFAULT_TIME_UNIT,
            timestamp_kind: DEFAULT_TIMESTAMP_KIND,
            gap_factor: DEFAULT_GAP_FACTOR,
        }
    }
}

pub fn window_size(value: usize) -> Result<NonZeroUsize, AnalysisError> {
    NonZeroUsize::new(value).ok_or_else(|| AnalysisError::invalid("window size", value, "a positive integer"))
}

pub fn gap_factor(value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AnalysisError::invalid("gap factor", value, "a positive finite number"))
    }
}

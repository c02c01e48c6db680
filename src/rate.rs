use std::fmt;
use std::num::NonZeroUsize;
use std::slice::Windows;
use std::str::FromStr;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;

use crate::collector::TimestampedFile;
use crate::error::AnalysisError;
use crate::segment::Batch;

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
}

impl TimeUnit {
    pub const EXPECTED: &'static str = "one of: second, minute, hour";

    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Second => 1.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Hour => 3600.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "second" => Ok(TimeUnit::Second),
            "minute" => Ok(TimeUnit::Minute),
            "hour" => Ok(TimeUnit::Hour),
            other => Err(AnalysisError::invalid("time unit", other, Self::EXPECTED)),
        }
    }
}

/// Files per time unit over one window.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Rate {
    Finite(f64),
    /// Every file in the window carries the same timestamp.
    Instantaneous,
}

impl Rate {
    pub fn finite(self) -> Option<f64> {
        match self {
            Rate::Finite(v) => Some(v),
            Rate::Instantaneous => None,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Finite(v) => write!(f, "{v:.3}"),
            Rate::Instantaneous => f.write_str("instantaneous"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RateSample {
    /// Seconds since the Unix epoch, halfway between the window's first and last file.
    pub midpoint: f64,
    pub rate: Rate,
    pub batch_index: usize,
}

impl RateSample {
    pub fn midpoint_local(&self) -> DateTime<Local> {
        to_local(self.midpoint)
    }
}

pub fn to_local(epoch_secs: f64) -> DateTime<Local> {
    let secs = epoch_secs.floor();
    let nanos = ((epoch_secs - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
        .unwrap_or_default()
        .with_timezone(&Local)
}

/// Rate over `window` consecutive files spanning `delta` seconds.
pub fn window_rate(window: usize, delta: f64, unit: TimeUnit) -> Rate {
    if delta == 0.0 {
        Rate::Instantaneous
    } else {
        Rate::Finite(window as f64 / (delta / unit.seconds()))
    }
}

/// One sample per window start, consumed once. Yields nothing when the batch
/// holds fewer files than the window.
pub struct RateWindows<'a> {
    windows: Windows<'a, TimestampedFile>,
    size: usize,
    unit: TimeUnit,
    batch_index: usize,
}

impl Iterator for RateWindows<'_> {
    type Item = RateSample;

    fn next(&mut self) -> Option<RateSample> {
        let window = self.windows.next()?;
        let start = window[0].timestamp;
        let end = window[self.size - 1].timestamp;
        Some(RateSample {
            midpoint: (start + end) / 2.0,
            rate: window_rate(self.size, end - start, self.unit),
            batch_index: self.batch_index,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.windows.size_hint()
    }
}

impl ExactSizeIterator for RateWindows<'_> {}

pub fn windowed_rates(batch: &Batch, batch_index: usize, window: NonZeroUsize, unit: TimeUnit) -> RateWindows<'_> {
    RateWindows {
        windows: batch.files().windows(window.get()),
        size: window.get(),
        unit,
        batch_index,
    }
}

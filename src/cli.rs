use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::collector::TimestampKind;
use crate::config::{self, AnalysisConfig};
use crate::error::AnalysisError;
use crate::rate::TimeUnit;

/// Plot file generation speed over time.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder to analyze
    #[arg(short = 'f', long, default_value = config::DEFAULT_FOLDER)]
    pub folder: PathBuf,

    /// File name suffix to analyze
    #[arg(short = 'e', long, default_value = config::DEFAULT_EXTENSION)]
    pub extension: String,

    /// Number of consecutive files per rate window
    #[arg(short = 'w', long, default_value_t = config::DEFAULT_WINDOW_SIZE.get())]
    pub window_size: usize,

    /// Time unit for the rate axis
    #[arg(short = 'u', long, value_enum, default_value_t = config::DEFAULT_TIME_UNIT)]
    pub time_unit: TimeUnit,

    /// Which file timestamp to use
    #[arg(short = 't', long, value_enum, default_value_t = config::DEFAULT_TIMESTAMP_KIND)]
    pub timestamp_type: TimestampKind,

    /// Multiple of the median gap that separates two batches
    #[arg(short = 'g', long, default_value_t = config::DEFAULT_GAP_FACTOR)]
    pub gap_factor: f64,

    /// Output: interactive chart, or a plain text / JSON report on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Chart)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Chart,
    Text,
    Json,
}

impl TryFrom<Cli> for AnalysisConfig {
    type Error = AnalysisError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        Ok(AnalysisConfig {
            folder: cli.folder,
            extension: cli.extension,
            window_size: config::window_size(cli.window_size)?,
            time_unit: cli.time_unit,
            timestamp_kind: cli.timestamp_type,
            gap_factor: config::gap_factor(cli.gap_factor)?,
        })
    }
}

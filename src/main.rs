mod analysis;
mod cli;
mod collector;
mod config;
mod error;
mod rate;
mod report;
mod segment;
mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, OutputFormat};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    // Validate everything before touching the filesystem.
    let config = AnalysisConfig::try_from(cli)?;
    let analysis = analysis::run(&config)?;

    match format {
        OutputFormat::Chart => tui::run_chart(&analysis, &config)?,
        OutputFormat::Text => report::write_text(&mut std::io::stdout().lock(), &analysis, &config)?,
        OutputFormat::Json => report::write_json(&mut std::io::stdout().lock(), &analysis, &config)?,
    }

    if !analysis.has_data() {
        eprintln!("{}", analysis.empty_note(&config));
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        let code = exit_code_for_error(&err);
        eprintln!("error: {err:?}");
        std::process::exit(code);
    }
}

pub(crate) fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    // 2: invalid input, 3: creation time unsupported, 4: folder missing or unreadable, 1: other
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<AnalysisError>() {
            return match e {
                AnalysisError::InvalidInput { .. } => 2,
                AnalysisError::PlatformUnsupported { .. } => 3,
                AnalysisError::Metadata { .. } => 1,
            };
        }
        if let Some(ioe) = cause.downcast_ref::<std::io::Error>() {
            use std::io::ErrorKind::*;
            return match ioe.kind() {
                NotFound | PermissionDenied => 4,
                _ => 1,
            };
        }
    }
    1
}

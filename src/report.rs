use std::io::Write;

use anyhow::Result;
use chrono::SecondsFormat;
use serde::Serialize;

use crate::analysis::Analysis;
use crate::collector::TimestampKind;
use crate::config::AnalysisConfig;
use crate::rate::{to_local, Rate, TimeUnit};

#[derive(Serialize)]
struct ReportOut {
    folder: String,
    extension: String,
    timestamp_kind: TimestampKind,
    time_unit: TimeUnit,
    window_size: usize,
    gap_factor: f64,
    files: usize,
    typical_gap: Option<f64>,
    threshold: Option<f64>,
    batches: Vec<BatchOut>,
}

#[derive(Serialize)]
struct BatchOut {
    batch: usize,
    files: usize,
    start: String,
    end: String,
    samples: Vec<SampleOut>,
}

#[derive(Serialize)]
struct SampleOut {
    midpoint: String,
    midpoint_epoch: f64,
    rate: Rate,
}

fn rfc3339(epoch_secs: f64) -> String {
    to_local(epoch_secs).to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn report_out(analysis: &Analysis, config: &AnalysisConfig) -> ReportOut {
    ReportOut {
        folder: config.folder.display().to_string(),
        extension: config.extension.clone(),
        timestamp_kind: config.timestamp_kind,
        time_unit: config.time_unit,
        window_size: config.window_size.get(),
        gap_factor: config.gap_factor,
        files: analysis.file_count,
        typical_gap: analysis.typical_gap,
        threshold: analysis.threshold,
        batches: analysis
            .batches
            .iter()
            .map(|b| BatchOut {
                batch: b.batch_index + 1,
                files: b.file_count,
                start: rfc3339(b.start),
                end: rfc3339(b.end),
                samples: b
                    .samples
                    .iter()
                    .map(|s| SampleOut {
                        midpoint: s.midpoint_local().to_rfc3339_opts(SecondsFormat::Millis, false),
                        midpoint_epoch: s.midpoint,
                        rate: s.rate,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn write_json(out: &mut impl Write, analysis: &Analysis, config: &AnalysisConfig) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &report_out(analysis, config))?;
    writeln!(out)?;
    Ok(())
}

pub fn write_text(out: &mut impl Write, analysis: &Analysis, config: &AnalysisConfig) -> Result<()> {
    writeln!(
        out,
        "# {} files, {} batch(es), window {} ({} time), files per {}",
        analysis.file_count,
        analysis.batches.len(),
        config.window_size,
        config.timestamp_kind,
        config.time_unit
    )?;
    for series in analysis.plottable() {
        for s in &series.samples {
            writeln!(
                out,
                "{}\t{}\t{}",
                s.batch_index + 1,
                s.midpoint_local().to_rfc3339_opts(SecondsFormat::Millis, false),
                s.rate
            )?;
        }
    }
    Ok(())
}

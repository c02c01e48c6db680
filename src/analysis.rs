use anyhow::Result;
use tracing::{info, warn};

use crate::collector::{collect_timestamps, TimestampedFile};
use crate::config::AnalysisConfig;
use crate::rate::{windowed_rates, RateSample};
use crate::segment::segment;

pub struct BatchSeries {
    /// Zero-based position in chronological batch order.
    pub batch_index: usize,
    pub file_count: usize,
    pub start: f64,
    pub end: f64,
    pub samples: Vec<RateSample>,
}

impl BatchSeries {
    /// Legend label, 1-based.
    pub fn label(&self) -> String {
        format!("Batch {}", self.batch_index + 1)
    }
}

pub struct Analysis {
    pub file_count: usize,
    pub typical_gap: Option<f64>,
    pub threshold: Option<f64>,
    pub batches: Vec<BatchSeries>,
}

impl Analysis {
    /// Batches that produced at least one windowed sample.
    pub fn plottable(&self) -> impl Iterator<Item = &BatchSeries> {
        self.batches.iter().filter(|b| !b.samples.is_empty())
    }

    pub fn has_data(&self) -> bool {
        self.plottable().next().is_some()
    }

    /// Human-readable reason there is nothing to plot.
    pub fn empty_note(&self, config: &AnalysisConfig) -> String {
        if self.file_count == 0 {
            format!(
                "No plottable data: no files ending in '{}' found in {}",
                config.extension,
                config.folder.display()
            )
        } else {
            format!(
                "No plottable data: all {} batch(es) have fewer than {} files",
                self.batches.len(),
                config.window_size
            )
        }
    }
}

/// Collects, segments and estimates in one pass over a fresh directory snapshot.
pub fn run(config: &AnalysisConfig) -> Result<Analysis> {
    let files = collect_timestamps(&config.folder, &config.extension, config.timestamp_kind)?;
    info!(
        folder = %config.folder.display(),
        extension = %config.extension,
        kind = %config.timestamp_kind,
        files = files.len(),
        "Collected files"
    );
    let analysis = analyze(&files, config);
    if !analysis.has_data() {
        warn!("{}", analysis.empty_note(config));
    }
    Ok(analysis)
}

/// `files` must be sorted by ascending timestamp.
pub fn analyze(files: &[TimestampedFile], config: &AnalysisConfig) -> Analysis {
    let segmentation = segment(files, config.gap_factor);
    info!(
        batches = segmentation.batches.len(),
        typical_gap = ?segmentation.typical_gap,
        threshold = ?segmentation.threshold,
        "Segmented files into batches"
    );

    let batches = segmentation
        .batches
        .iter()
        .enumerate()
        .map(|(batch_index, batch)| {
            let samples: Vec<RateSample> =
                windowed_rates(batch, batch_index, config.window_size, config.time_unit).collect();
            if samples.is_empty() {
                info!(
                    batch = batch_index + 1,
                    files = batch.len(),
                    window = config.window_size.get(),
                    "Skipping batch shorter than window"
                );
            }
            BatchSeries {
                batch_index,
                file_count: batch.len(),
                start: batch.first().timestamp,
                end: batch.last().timestamp,
                samples,
            }
        })
        .collect();

    Analysis {
        file_count: files.len(),
        typical_gap: segmentation.typical_gap,
        threshold: segmentation.threshold,
        batches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::TimestampKind;
    use crate::config;
    use crate::rate::{Rate, TimeUnit};
    use std::fs::File;
    use std::time::{Duration, UNIX_EPOCH};

    fn files(ts: &[f64]) -> Vec<TimestampedFile> {
        ts.iter()
            .enumerate()
            .map(|(i, &t)| TimestampedFile::new(format!("{i:03}.sim"), t))
            .collect()
    }

    fn cfg(window: usize) -> AnalysisConfig {
        AnalysisConfig {
            window_size: config::window_size(window).unwrap(),
            time_unit: TimeUnit::Second,
            timestamp_kind: TimestampKind::Modification,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn two_batches_each_with_samples() {
        let input = files(&[0.0, 1.0, 2.0, 3.0, 4.0, 20.0, 21.0, 22.0, 23.0, 24.0]);
        let a = analyze(&input, &cfg(3));
        assert_eq!(a.file_count, 10);
        assert_eq!(a.batches.len(), 2);
        assert_eq!(a.plottable().count(), 2);
        let second = &a.batches[1];
        assert_eq!(second.label(), "Batch 2");
        assert_eq!((second.start, second.end), (20.0, 24.0));
        assert_eq!(second.samples.len(), 3);
        assert!(second.samples.iter().all(|s| s.batch_index == 1 && s.rate == Rate::Finite(1.5)));
    }

    #[test]
    fn short_batches_are_kept_but_not_plottable() {
        // gaps [1, 1, 1, 100, 1]; threshold 5 -> batches of 4 and 2
        let input = files(&[0.0, 1.0, 2.0, 3.0, 103.0, 104.0]);
        let a = analyze(&input, &cfg(3));
        assert_eq!(a.batches.len(), 2);
        let plottable: Vec<_> = a.plottable().map(|b| b.batch_index).collect();
        assert_eq!(plottable, vec![0]);
    }

    #[test]
    fn nothing_plottable_explains_why() {
        let config = cfg(10);
        let a = analyze(&files(&[0.0, 1.0, 2.0]), &config);
        assert!(!a.has_data());
        assert!(a.empty_note(&config).contains("fewer than 10 files"));

        let empty = analyze(&[], &config);
        assert_eq!(empty.file_count, 0);
        assert!(empty.batches.is_empty());
        assert!(empty.empty_note(&config).contains("no files ending in '.sim'"));
    }

    #[test]
    fn run_reads_the_configured_folder() {
        let dir = tempfile::tempdir().unwrap();
        for (i, secs) in [100u64, 101, 102, 103].iter().enumerate() {
            let path = dir.path().join(format!("{i}.sim"));
            let f = File::create(&path).unwrap();
            f.set_modified(UNIX_EPOCH + Duration::from_secs(*secs)).unwrap();
        }
        File::create(dir.path().join("notes.txt")).unwrap();

        let config = AnalysisConfig {
            folder: dir.path().to_path_buf(),
            ..cfg(2)
        };
        let a = run(&config).unwrap();
        assert_eq!(a.file_count, 4);
        assert_eq!(a.batches.len(), 1);
        assert_eq!(a.batches[0].samples.len(), 3);
        assert_eq!(a.batches[0].samples[0].rate, Rate::Finite(2.0));
    }
}

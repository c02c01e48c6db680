//! Splits a chronological run of files into batches separated by idle gaps.
//!
//! The reference scale is the median of all consecutive gaps. Any gap larger
//! than `gap_factor` times that median starts a new batch. For even gap counts
//! the lower-middle element (`sorted[len / 2]`) is used, not an interpolated
//! value.
//!
//! When most files share the exact same timestamp the median gap is zero, so
//! the threshold is zero and every nonzero gap opens a new batch.

use crate::collector::TimestampedFile;

/// Consecutive files whose gaps stay within the threshold. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    files: Vec<TimestampedFile>,
}

impl Batch {
    fn starting_with(first: TimestampedFile) -> Self {
        Self { files: vec![first] }
    }

    #[cfg(test)]
    pub(crate) fn from_files(files: Vec<TimestampedFile>) -> Self {
        assert!(!files.is_empty());
        Self { files }
    }

    pub fn files(&self) -> &[TimestampedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn first(&self) -> &TimestampedFile {
        &self.files[0]
    }

    pub fn last(&self) -> &TimestampedFile {
        &self.files[self.files.len() - 1]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    /// `None` when there were fewer than two files to compare.
    pub typical_gap: Option<f64>,
    pub threshold: Option<f64>,
    pub batches: Vec<Batch>,
}

/// Lower-middle median of the consecutive gaps of `files`.
pub fn typical_gap(files: &[TimestampedFile]) -> Option<f64> {
    if files.len() < 2 {
        return None;
    }
    let mut gaps: Vec<f64> = files.windows(2).map(|w| w[1].timestamp - w[0].timestamp).collect();
    gaps.sort_by(f64::total_cmp);
    Some(gaps[gaps.len() / 2])
}

/// `files` must already be in ascending timestamp order and `gap_factor` positive.
pub fn segment(files: &[TimestampedFile], gap_factor: f64) -> Segmentation {
    debug_assert!(gap_factor > 0.0, "gap factor must be positive");

    let typical = typical_gap(files);
    let threshold = typical.map(|gap| gap_factor * gap);

    let mut batches: Vec<Batch> = Vec::new();
    let mut iter = files.iter();
    let Some(first) = iter.next() else {
        return Segmentation {
            typical_gap: None,
            threshold: None,
            batches,
        };
    };

    let mut current = Batch::starting_with(first.clone());
    let mut previous = first.timestamp;
    for file in iter {
        // `threshold` is always Some here: two or more files exist.
        if threshold.is_some_and(|t| file.timestamp - previous > t) {
            batches.push(std::mem::replace(&mut current, Batch::starting_with(file.clone())));
        } else {
            current.files.push(file.clone());
        }
        previous = file.timestamp;
    }
    batches.push(current);

    Segmentation {
        typical_gap: typical,
        threshold,
        batches,
    }
}

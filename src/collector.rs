use std::fmt;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use crate::error::AnalysisError;

/// Which metadata field a file is timed by.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampKind {
    Creation,
    Modification,
}

impl TimestampKind {
    pub const EXPECTED: &'static str = "one of: creation, modification";

    pub fn as_str(self) -> &'static str {
        match self {
            TimestampKind::Creation => "creation",
            TimestampKind::Modification => "modification",
        }
    }
}

impl fmt::Display for TimestampKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimestampKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creation" => Ok(TimestampKind::Creation),
            "modification" => Ok(TimestampKind::Modification),
            other => Err(AnalysisError::invalid("timestamp kind", other, Self::EXPECTED)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimestampedFile {
    pub path: PathBuf,
    /// Seconds since the Unix epoch, fractional part preserved.
    pub timestamp: f64,
}

impl TimestampedFile {
    pub fn new(path: impl Into<PathBuf>, timestamp: f64) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }
}

/// Lists regular files directly inside `dir` whose name ends with `suffix`,
/// timed by `kind`, sorted by ascending timestamp.
pub fn collect_timestamps(dir: &Path, suffix: &str, kind: TimestampKind) -> Result<Vec<TimestampedFile>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Listing directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Listing directory {}", dir.display()))?;
        if !matches_suffix(&entry.file_name().to_string_lossy(), suffix) {
            continue;
        }
        let path = entry.path();
        // Follows symlinks so a link to a regular file counts as one.
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            // Dangling symlink, or removed since listing.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Skipping vanished entry");
                continue;
            }
            Err(source) => return Err(AnalysisError::Metadata { path, source }.into()),
        };
        if !metadata.is_file() {
            continue;
        }
        let timestamp = timestamp_of(&metadata, kind, &path)?;
        files.push(TimestampedFile::new(path, timestamp));
    }

    sort_chronologically(&mut files);
    debug!(dir = %dir.display(), suffix, kind = %kind, count = files.len(), "Collected timestamps");
    Ok(files)
}

pub(crate) fn matches_suffix(name: &str, suffix: &str) -> bool {
    name.ends_with(suffix)
}

/// Ties on timestamp fall back to path order so repeated runs agree.
pub fn sort_chronologically(files: &mut [TimestampedFile]) {
    files.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp).then_with(|| a.path.cmp(&b.path)));
}

fn timestamp_of(metadata: &Metadata, kind: TimestampKind, path: &Path) -> Result<f64, AnalysisError> {
    let time = match kind {
        TimestampKind::Creation => metadata.created(),
        TimestampKind::Modification => metadata.modified(),
    };
    timestamp_from(time, kind, path)
}

// Creation time the platform cannot provide is an error of its own, never a fallback.
pub(crate) fn timestamp_from(
    time: std::io::Result<SystemTime>,
    kind: TimestampKind,
    path: &Path,
) -> Result<f64, AnalysisError> {
    match time {
        Ok(t) => Ok(epoch_seconds(t)),
        Err(e) if kind == TimestampKind::Creation && e.kind() == ErrorKind::Unsupported => {
            Err(AnalysisError::PlatformUnsupported {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(AnalysisError::Metadata {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn epoch_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn set_mtime(path: &Path, secs: u64, millis: u64) {
        let t = UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_millis(millis);
        File::options().write(true).open(path).unwrap().set_modified(t).unwrap();
    }

    #[test]
    fn suffix_filter_excludes_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.sim");
        touch(dir.path(), "b.sim");
        touch(dir.path(), "c.txt");

        let files = collect_timestamps(dir.path(), ".sim", TimestampKind::Modification).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.path.extension().unwrap() == "sim"));
    }

    #[test]
    fn directories_and_nested_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.sim");
        fs::create_dir(dir.path().join("nested.sim")).unwrap();
        touch(&dir.path().join("nested.sim"), "inner.sim");

        let files = collect_timestamps(dir.path(), ".sim", TimestampKind::Modification).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("top.sim"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "real.sim");
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("broken.sim")).unwrap();

        let files = collect_timestamps(dir.path(), ".sim", TimestampKind::Modification).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("real.sim"));
    }

    #[test]
    fn modification_times_are_sorted_with_fractions() {
        let dir = tempfile::tempdir().unwrap();
        let late = touch(dir.path(), "late.sim");
        let early = touch(dir.path(), "early.sim");
        set_mtime(&late, 1_700_000_100, 0);
        set_mtime(&early, 1_700_000_000, 250);

        let files = collect_timestamps(dir.path(), ".sim", TimestampKind::Modification).unwrap();
        assert_eq!(files[0].path, early);
        assert_eq!(files[1].path, late);
        assert!((files[0].timestamp - 1_700_000_000.25).abs() < 1e-3);
        assert!((files[1].timestamp - 1_700_000_100.0).abs() < 1e-3);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_timestamps(&dir.path().join("gone"), ".sim", TimestampKind::Modification).unwrap_err();
        let io = err.chain().find_map(|c| c.downcast_ref::<std::io::Error>()).unwrap();
        assert_eq!(io.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = collect_timestamps(dir.path(), ".sim", TimestampKind::Modification).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn creation_time_is_read_or_reported_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.sim");
        match collect_timestamps(dir.path(), ".sim", TimestampKind::Creation) {
            Ok(files) => assert_eq!(files.len(), 1),
            Err(err) => assert!(err
                .chain()
                .any(|c| matches!(c.downcast_ref::<AnalysisError>(), Some(AnalysisError::PlatformUnsupported { .. })))),
        }
    }

    #[test]
    fn unsupported_creation_time_is_platform_unsupported() {
        let time = Err(std::io::Error::from(ErrorKind::Unsupported));
        let err = timestamp_from(time, TimestampKind::Creation, Path::new("a.sim")).unwrap_err();
        assert!(matches!(err, AnalysisError::PlatformUnsupported { ref path } if path == Path::new("a.sim")));
        assert!(err.to_string().contains("--timestamp-type modification"));
    }

    #[test]
    fn unsupported_modification_time_is_a_metadata_error() {
        let time = Err(std::io::Error::from(ErrorKind::Unsupported));
        let err = timestamp_from(time, TimestampKind::Modification, Path::new("a.sim")).unwrap_err();
        assert!(matches!(err, AnalysisError::Metadata { ref source, .. } if source.kind() == ErrorKind::Unsupported));
    }

    #[test]
    fn other_creation_time_failures_are_metadata_errors() {
        let time = Err(std::io::Error::from(ErrorKind::PermissionDenied));
        let err = timestamp_from(time, TimestampKind::Creation, Path::new("a.sim")).unwrap_err();
        assert!(matches!(err, AnalysisError::Metadata { ref source, .. } if source.kind() == ErrorKind::PermissionDenied));
    }

    #[test]
    fn readable_time_converts_to_epoch_seconds() {
        let time = Ok(UNIX_EPOCH + Duration::from_millis(1_500));
        assert_eq!(timestamp_from(time, TimestampKind::Creation, Path::new("a.sim")).unwrap(), 1.5);
    }

    #[test]
    fn timestamp_kind_parsing() {
        assert_eq!("creation".parse::<TimestampKind>().unwrap(), TimestampKind::Creation);
        assert_eq!("modification".parse::<TimestampKind>().unwrap(), TimestampKind::Modification);
        let err = "access".parse::<TimestampKind>().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
        assert!(err.to_string().contains("creation, modification"));
    }

    #[test]
    fn ties_are_ordered_by_path() {
        let mut files = vec![
            TimestampedFile::new("b.sim", 5.0),
            TimestampedFile::new("a.sim", 5.0),
            TimestampedFile::new("c.sim", 1.0),
        ];
        sort_chronologically(&mut files);
        let names: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["c.sim", "a.sim", "b.sim"]);
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A user-supplied value is outside its accepted set.
    #[error("invalid {what} '{value}', expected {expected}")]
    InvalidInput {
        what: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("creation time is not available for {} on this platform; use --timestamp-type modification", .path.display())]
    PlatformUnsupported { path: PathBuf },

    #[error("reading metadata for {}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub(crate) fn invalid(what: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::InvalidInput {
            what,
            value: value.to_string(),
            expected,
        }
    }
}

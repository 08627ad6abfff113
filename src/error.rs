//! Error types for mediabatch.
//!
//! Errors fall into three classes that drive control flow:
//!
//! - **Setup errors**: bad source path, invalid configuration. Fatal; they
//!   terminate the process before any file is touched.
//! - **Per-file errors**: codec failures, unreadable inputs, collisions.
//!   Caught at the per-file boundary and recorded in the batch report; the
//!   batch continues.
//! - **Aggregate errors**: PDF merge only. Any constituent failure aborts
//!   the whole merge, because a partial merge is not a partial success.

use std::io;
use std::path::PathBuf;

/// Result type alias for mediabatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediabatch operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input path does not exist or is not readable.
    #[error("Source path not found: {path}")]
    SourceNotFound {
        /// Path that could not be resolved.
        path: PathBuf,
    },

    /// Invalid configuration value or combination.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what is wrong.
        message: String,
    },

    /// No input files were provided for an operation that requires them.
    #[error("No input files specified")]
    NoInputs,

    /// The input format is not in the accepted set for this operation.
    #[error("Unsupported format: {path}")]
    UnsupportedFormat {
        /// Path with the unsupported extension or content.
        path: PathBuf,
    },

    /// The codec could not decode the input file.
    #[error("Failed to decode {path}: {reason}")]
    Decode {
        /// Path to the unreadable input.
        path: PathBuf,
        /// Codec-reported cause.
        reason: String,
    },

    /// The codec could not encode the output file.
    #[error("Failed to encode {path}: {reason}")]
    Encode {
        /// Destination path being produced.
        path: PathBuf,
        /// Codec-reported cause.
        reason: String,
    },

    /// A PDF input could not be loaded.
    #[error("Failed to load PDF {path}: {reason}")]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Output file already exists and the collision policy forbids
    /// overwriting it.
    #[error("Output file already exists: {path} (use --overwrite to replace it)")]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Output file or directory could not be created.
    #[error("Failed to create output at {path}: {source}")]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Write to an output file failed (permissions, disk full, ...).
    #[error("Failed to write {path}: {source}")]
    FailedToWrite {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// PDF merge failed as a whole.
    #[error("Merge failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Generic I/O error without a more specific classification.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::InvalidConfig {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Create a SourceNotFound error.
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Create a Decode error.
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Encode error.
    pub fn encode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify an `image` crate error against the file it concerns.
    ///
    /// Unsupported-format reports map to [`Error::UnsupportedFormat`] so the
    /// batch records them as skipped rather than failed; everything else is
    /// a decode failure.
    pub fn from_image_error(path: &std::path::Path, err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(_) => Self::unsupported(path),
            image::ImageError::IoError(source) => Self::Io { source },
            other => Self::decode(path, other.to_string()),
        }
    }

    /// Whether this error is caught at the per-file boundary.
    ///
    /// Per-file errors become entries in the batch report; the batch
    /// continues past them. Everything else terminates the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::Decode { .. }
                | Self::Encode { .. }
                | Self::FailedToLoadPdf { .. }
                | Self::FailedToWrite { .. }
                | Self::Io { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound { .. } => 2,
            Self::UnsupportedFormat { .. } => 3,
            Self::Decode { .. } => 3,
            Self::Encode { .. } => 3,
            Self::FailedToLoadPdf { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::MergeFailed { .. } => 6,
            Self::NoInputs => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Other { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_not_found_display() {
        let err = Error::source_not_found("/tmp/missing");
        let msg = format!("{err}");
        assert!(msg.contains("not found"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_decode_display() {
        let err = Error::decode("bad.png", "truncated chunk");
        let msg = format!("{err}");
        assert!(msg.contains("bad.png"));
        assert!(msg.contains("truncated chunk"));
    }

    #[test]
    fn test_output_exists_hints_overwrite() {
        let err = Error::OutputExists {
            path: PathBuf::from("out.pdf"),
        };
        assert!(format!("{err}").contains("--overwrite"));
    }

    #[test]
    fn test_is_per_file() {
        assert!(Error::unsupported("x.xyz").is_per_file());
        assert!(Error::decode("x.png", "bad").is_per_file());
        assert!(Error::failed_to_load_pdf("x.pdf", "bad").is_per_file());

        assert!(!Error::NoInputs.is_per_file());
        assert!(!Error::invalid_config("bad").is_per_file());
        assert!(!Error::merge_failed("bad").is_per_file());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::source_not_found("x").exit_code(), 2);
        assert_eq!(Error::decode("x", "bad").exit_code(), 3);
        assert_eq!(
            Error::OutputExists {
                path: PathBuf::from("x")
            }
            .exit_code(),
            4
        );
        assert_eq!(Error::merge_failed("bad").exit_code(), 6);
        assert_eq!(Error::NoInputs.exit_code(), 1);
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_from_anyhow_is_config() {
        let err: Error = anyhow::anyhow!("jobs must be at least 1").into();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}

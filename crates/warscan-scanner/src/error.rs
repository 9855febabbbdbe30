//! Error types for the warscan scanner

use std::path::PathBuf;
use thiserror::Error;

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that abort a scan
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal failed
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A container (the scan root or a nested library) could not be read as an archive
    #[error("Corrupt archive {path}: {source}")]
    CorruptArchive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// The scan root locator does not name a usable directory or file
    #[error("Invalid scan root: {0}")]
    InvalidRoot(String),

    /// A configured root path is not a valid relative path
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Failed to serialize a report
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    pub(crate) fn corrupt(path: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::CorruptArchive {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_root(path: PathBuf) -> Self {
        Self::InvalidRoot(format!("Scan root does not exist: {}", path.display()))
    }
}

/// Validation failures for relative paths
///
/// These never abort a scan on their own: a malformed or escaping
/// `Class-Path` entry is skipped and reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path contains a back-slash separator
    #[error("path '{0}' contains a back-slash")]
    Backslash(String),

    /// Path ends with '/'
    #[error("path '{0}' ends with a separator")]
    TrailingSeparator(String),

    /// Path contains an empty segment ("a//b" or a leading '/')
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Resolving the path would climb above the scan root
    #[error("path '{relative}' escapes the root when resolved against '{base}'")]
    EscapesRoot { base: String, relative: String },
}

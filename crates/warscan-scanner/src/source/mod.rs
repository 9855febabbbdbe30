//! Storage backends for the scanner
//!
//! The scanner sees a scan root only through [`ArchiveSource`]. Three
//! implementations exist:
//! - [`DirectorySource`] for an unpacked tree on disk
//! - [`IndexedContainer`] for a container file on disk, indexed once on open
//! - [`StreamedContainer`] for a container that can only be read front to
//!   back, re-read from the start for every lookup

pub mod container;
pub mod directory;

pub use container::{IndexedContainer, StreamedContainer};
pub use directory::DirectorySource;

use crate::error::{ScanError, ScanResult};
use crate::path::RelativePath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Physical representation of a scan root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Unpacked directory tree
    Directory,
    /// Single compressed container
    Container,
}

/// Kind of an entry inside a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a directory inside a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ChildEntry {
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Seekable reader over an entry's contents
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Reopens a forward-only byte stream from its beginning
pub type StreamOpener = Arc<dyn Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync>;

/// Primitives the scanner needs from a scan root
///
/// Paths are relative to the scan root. Absence is reported as `Ok(None)` or
/// an empty listing; only storage failures are errors.
pub trait ArchiveSource {
    fn kind(&self) -> SourceKind;

    /// Immediate children of `dir`; empty when `dir` does not exist
    fn list_children(&mut self, dir: &RelativePath) -> ScanResult<Vec<ChildEntry>>;

    /// Kind of the entry at `path`, `None` when absent
    fn entry_kind(&mut self, path: &RelativePath) -> ScanResult<Option<EntryKind>>;

    /// Contents of the file at `path`, `None` when absent or not a file
    fn open_file(&mut self, path: &RelativePath) -> ScanResult<Option<Box<dyn ReadSeek>>>;

    /// Every file below `dir` at any depth, relative to `dir`
    fn walk_files(&mut self, dir: &RelativePath) -> ScanResult<Vec<RelativePath>> {
        let mut files = Vec::new();
        let mut pending = vec![RelativePath::root()];

        while let Some(relative) = pending.pop() {
            for child in self.list_children(&dir.join(&relative))? {
                let path = relative.child(&child.name);
                match child.kind {
                    EntryKind::Directory => pending.push(path),
                    EntryKind::File => files.push(path),
                }
            }
        }

        Ok(files)
    }
}

enum RootLocation {
    Path(PathBuf),
    Stream { label: String, opener: StreamOpener },
}

/// The archive a scan runs against
pub struct ScanRoot {
    location: RootLocation,
    kind: SourceKind,
}

impl ScanRoot {
    /// Classify a filesystem path as a directory or a container file
    ///
    /// # Errors
    /// Returns an error if the path does not exist or is neither a directory
    /// nor a regular file
    pub fn from_path(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ScanError::missing_root(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let kind = if metadata.is_dir() {
            SourceKind::Directory
        } else if metadata.is_file() {
            SourceKind::Container
        } else {
            return Err(ScanError::InvalidRoot(format!(
                "Scan root is neither a directory nor a file: {}",
                path.display()
            )));
        };

        Ok(Self {
            location: RootLocation::Path(path.to_path_buf()),
            kind,
        })
    }

    /// A container reachable only as a forward-only stream
    ///
    /// `opener` is called once per lookup and must yield the stream from its
    /// first byte every time.
    pub fn from_stream<F>(label: impl Into<String>, opener: F) -> Self
    where
        F: Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Self {
            location: RootLocation::Stream {
                label: label.into(),
                opener: Arc::new(opener),
            },
            kind: SourceKind::Container,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == SourceKind::Directory
    }

    /// Local filesystem location, if the root has one
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match &self.location {
            RootLocation::Path(path) => Some(path),
            RootLocation::Stream { .. } => None,
        }
    }

    /// Human readable name used in diagnostics and reports
    #[must_use]
    pub fn label(&self) -> String {
        match &self.location {
            RootLocation::Path(path) => path.display().to_string(),
            RootLocation::Stream { label, .. } => label.clone(),
        }
    }

    /// Open the storage strategy matching this root
    ///
    /// A local container file gets the indexed strategy; the streamed one is
    /// used only when no local path exists.
    ///
    /// # Errors
    /// Returns an error if a container root cannot be opened or indexed
    pub fn open(&self) -> ScanResult<Box<dyn ArchiveSource>> {
        match (&self.location, self.kind) {
            (RootLocation::Path(path), SourceKind::Directory) => {
                Ok(Box::new(DirectorySource::new(path.clone())))
            }
            (RootLocation::Path(path), SourceKind::Container) => {
                Ok(Box::new(IndexedContainer::open(path)?))
            }
            (RootLocation::Stream { label, opener }, _) => Ok(Box::new(StreamedContainer::new(
                label.clone(),
                Arc::clone(opener),
            ))),
        }
    }
}

impl fmt::Debug for ScanRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRoot")
            .field("location", &self.label())
            .field("kind", &self.kind)
            .finish()
    }
}

//! Compressed container scan roots
//!
//! Container entries carry full slash-separated names and may omit explicit
//! directory entries, so directories are inferred from file names. Names
//! holding a `.` or `..` segment are never indexed, matching what a directory
//! root can see. When a name occurs twice, lookups serve the entry that the
//! central directory lists last.

use super::{ArchiveSource, ChildEntry, EntryKind, ReadSeek, SourceKind, StreamOpener};
use crate::error::{ScanError, ScanResult};
use crate::path::RelativePath;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Clone)]
struct IndexEntry {
    /// Entry name inside the container; `None` for inferred directories
    name: Option<String>,
    kind: EntryKind,
}

/// Entry-path to metadata map built from one pass over a container
#[derive(Debug, Default)]
struct ContainerIndex {
    entries: BTreeMap<RelativePath, IndexEntry>,
}

impl ContainerIndex {
    fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for name in names {
            index.insert(name);
        }
        index
    }

    fn insert(&mut self, raw_name: &str) {
        let (trimmed, kind) = match raw_name.strip_suffix('/') {
            Some(trimmed) => (trimmed, EntryKind::Directory),
            None => (raw_name, EntryKind::File),
        };
        let path = match RelativePath::parse(trimmed) {
            Ok(path) if path.has_dot_segment() => {
                debug!(name = raw_name, "skipping container entry with dot segment");
                return;
            }
            Ok(path) if !path.is_root() => path,
            Ok(_) => return,
            Err(e) => {
                debug!(name = raw_name, error = %e, "skipping container entry");
                return;
            }
        };

        let mut ancestor = path.parent();
        while let Some(dir) = ancestor.filter(|dir| !dir.is_root()) {
            ancestor = dir.parent();
            self.entries.entry(dir).or_insert(IndexEntry {
                name: None,
                kind: EntryKind::Directory,
            });
        }

        self.entries.insert(
            path,
            IndexEntry {
                name: Some(raw_name.to_string()),
                kind,
            },
        );
    }

    fn kind(&self, path: &RelativePath) -> Option<EntryKind> {
        if path.is_root() {
            return Some(EntryKind::Directory);
        }
        self.entries.get(path).map(|entry| entry.kind)
    }

    /// Container name of the file at `path`
    fn file_name(&self, path: &RelativePath) -> Option<&str> {
        self.entries
            .get(path)
            .filter(|entry| entry.kind == EntryKind::File)
            .and_then(|entry| entry.name.as_deref())
    }

    fn children(&self, dir: &RelativePath) -> Vec<ChildEntry> {
        self.entries
            .iter()
            .filter_map(|(path, entry)| {
                let rest = path.strip_prefix(dir)?;
                match rest.segments() {
                    [name] => Some(ChildEntry {
                        name: name.clone(),
                        kind: entry.kind,
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    fn files_under(&self, dir: &RelativePath) -> Vec<RelativePath> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.kind == EntryKind::File)
            .filter_map(|(path, _)| path.strip_prefix(dir))
            .filter(|rest| !rest.is_root())
            .collect()
    }
}

/// Read the file at `path` through `index`, fully into memory
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: &ContainerIndex,
    label: &str,
    path: &RelativePath,
) -> ScanResult<Option<Box<dyn ReadSeek>>> {
    let Some(name) = index.file_name(path) else {
        return Ok(None);
    };
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ScanError::corrupt(label, e)),
    };

    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(Box::new(Cursor::new(bytes))))
}

/// A container file on local disk
///
/// The entry index is built once when the container is opened and serves
/// every later lookup; contents are read directly through it.
pub struct IndexedContainer {
    label: String,
    archive: ZipArchive<File>,
    index: ContainerIndex,
}

impl IndexedContainer {
    /// Open and index a container file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a valid container
    pub fn open(path: &Path) -> ScanResult<Self> {
        let label = path.display().to_string();
        let file = File::open(path)?;
        let archive = ZipArchive::new(file).map_err(|e| ScanError::corrupt(label.clone(), e))?;
        let index = ContainerIndex::from_names(archive.file_names());
        debug!(container = %label, entries = index.entries.len(), "indexed container");

        Ok(Self {
            label,
            archive,
            index,
        })
    }
}

impl std::fmt::Debug for IndexedContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedContainer")
            .field("label", &self.label)
            .field("entries", &self.index.entries.len())
            .finish()
    }
}

impl ArchiveSource for IndexedContainer {
    fn kind(&self) -> SourceKind {
        SourceKind::Container
    }

    fn list_children(&mut self, dir: &RelativePath) -> ScanResult<Vec<ChildEntry>> {
        Ok(self.index.children(dir))
    }

    fn entry_kind(&mut self, path: &RelativePath) -> ScanResult<Option<EntryKind>> {
        Ok(self.index.kind(path))
    }

    fn open_file(&mut self, path: &RelativePath) -> ScanResult<Option<Box<dyn ReadSeek>>> {
        read_entry(&mut self.archive, &self.index, &self.label, path)
    }

    fn walk_files(&mut self, dir: &RelativePath) -> ScanResult<Vec<RelativePath>> {
        Ok(self.index.files_under(dir))
    }
}

/// A container available only as a forward-only stream
///
/// Nothing is retained between lookups: each one reopens the stream, reads
/// it to the end and indexes that copy. Entries written with trailing data
/// descriptors, as streaming jar writers produce, are served like any other.
pub struct StreamedContainer {
    label: String,
    opener: StreamOpener,
}

impl StreamedContainer {
    #[must_use]
    pub fn new(label: String, opener: StreamOpener) -> Self {
        Self { label, opener }
    }

    fn reopen(&self) -> ScanResult<(ZipArchive<Cursor<Vec<u8>>>, ContainerIndex)> {
        let mut bytes = Vec::new();
        (self.opener)()?.read_to_end(&mut bytes)?;

        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ScanError::corrupt(self.label.clone(), e))?;
        let index = ContainerIndex::from_names(archive.file_names());
        Ok((archive, index))
    }
}

impl std::fmt::Debug for StreamedContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedContainer")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ArchiveSource for StreamedContainer {
    fn kind(&self) -> SourceKind {
        SourceKind::Container
    }

    fn list_children(&mut self, dir: &RelativePath) -> ScanResult<Vec<ChildEntry>> {
        Ok(self.reopen()?.1.children(dir))
    }

    fn entry_kind(&mut self, path: &RelativePath) -> ScanResult<Option<EntryKind>> {
        Ok(self.reopen()?.1.kind(path))
    }

    fn open_file(&mut self, path: &RelativePath) -> ScanResult<Option<Box<dyn ReadSeek>>> {
        let (mut archive, index) = self.reopen()?;
        read_entry(&mut archive, &index, &self.label, path)
    }

    fn walk_files(&mut self, dir: &RelativePath) -> ScanResult<Vec<RelativePath>> {
        Ok(self.reopen()?.1.files_under(dir))
    }
}

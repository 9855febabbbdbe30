//! Unpacked directory trees

use super::{ArchiveSource, ChildEntry, EntryKind, ReadSeek, SourceKind};
use crate::error::ScanResult;
use crate::path::RelativePath;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A scan root that is a directory on disk
///
/// Listings are cheap and repeatable, so nothing is cached.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative path onto the filesystem
    ///
    /// A literal `.` or `..` segment is never handed to the OS: such a path
    /// is treated as absent, as it is inside a container.
    fn fs_path(&self, path: &RelativePath) -> Option<PathBuf> {
        if path.has_dot_segment() {
            debug!(%path, "refusing path with dot segment");
            return None;
        }
        let mut full = self.root.clone();
        for segment in path.segments() {
            full.push(segment);
        }
        Some(full)
    }
}

fn absent_if_not_found<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl ArchiveSource for DirectorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn list_children(&mut self, dir: &RelativePath) -> ScanResult<Vec<ChildEntry>> {
        let Some(full) = self.fs_path(dir) else {
            return Ok(Vec::new());
        };
        if !full.is_dir() {
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                debug!(path = ?entry.path(), "skipping non UTF-8 name");
                continue;
            };
            // Follows symlinks, like the rest of the lookups
            let kind = if entry.path().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            children.push(ChildEntry { name, kind });
        }

        Ok(children)
    }

    fn entry_kind(&mut self, path: &RelativePath) -> ScanResult<Option<EntryKind>> {
        let Some(full) = self.fs_path(path) else {
            return Ok(None);
        };
        let metadata = absent_if_not_found(fs::metadata(full))?;
        Ok(metadata.map(|metadata| {
            if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            }
        }))
    }

    fn open_file(&mut self, path: &RelativePath) -> ScanResult<Option<Box<dyn ReadSeek>>> {
        let Some(full) = self.fs_path(path) else {
            return Ok(None);
        };
        if full.is_dir() {
            return Ok(None);
        }
        let file = absent_if_not_found(File::open(full))?;
        Ok(file.map(|file| Box::new(file) as Box<dyn ReadSeek>))
    }

    fn walk_files(&mut self, dir: &RelativePath) -> ScanResult<Vec<RelativePath>> {
        let Some(base) = self.fs_path(dir) else {
            return Ok(Vec::new());
        };
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        // Symlinks are followed here as in `list_children`
        for entry in WalkDir::new(&base).follow_links(true).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    debug!(error = %e, "skipping symlink loop");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !entry.path().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&base) else {
                continue;
            };
            let mut path = RelativePath::root();
            let mut valid = true;
            for component in relative.components() {
                match component.as_os_str().to_str() {
                    Some(segment) => path = path.child(segment),
                    None => {
                        valid = false;
                        break;
                    }
                }
            }
            if valid {
                files.push(path);
            } else {
                debug!(path = ?entry.path(), "skipping non UTF-8 path");
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn p(text: &str) -> RelativePath {
        RelativePath::parse(text).unwrap()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("classes/foo/deep")).unwrap();
        fs::write(base.join("classes/foo/Bar.class"), b"x").unwrap();
        fs::write(base.join("classes/foo/deep/Baz.class"), b"x").unwrap();
        fs::create_dir_all(base.join("lib")).unwrap();
        fs::write(base.join("lib/one.jar"), b"jar").unwrap();
        dir
    }

    #[test]
    fn test_list_children() {
        let dir = fixture();
        let mut source = DirectorySource::new(dir.path().to_path_buf());

        let children = source.list_children(&p("classes/foo")).unwrap();
        let names: HashSet<_> = children
            .iter()
            .map(|c| (c.name.as_str(), c.is_directory()))
            .collect();
        assert_eq!(names, HashSet::from([("Bar.class", false), ("deep", true)]));

        assert!(source.list_children(&p("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_walk_files_matches_default_walk() {
        let dir = fixture();
        let mut source = DirectorySource::new(dir.path().to_path_buf());

        let walked: HashSet<_> = source.walk_files(&p("classes")).unwrap().into_iter().collect();
        assert_eq!(
            walked,
            HashSet::from([p("foo/Bar.class"), p("foo/deep/Baz.class")])
        );

        struct Plain(DirectorySource);
        impl ArchiveSource for Plain {
            fn kind(&self) -> SourceKind {
                self.0.kind()
            }
            fn list_children(&mut self, dir: &RelativePath) -> ScanResult<Vec<ChildEntry>> {
                self.0.list_children(dir)
            }
            fn entry_kind(&mut self, path: &RelativePath) -> ScanResult<Option<EntryKind>> {
                self.0.entry_kind(path)
            }
            fn open_file(
                &mut self,
                path: &RelativePath,
            ) -> ScanResult<Option<Box<dyn ReadSeek>>> {
                self.0.open_file(path)
            }
        }

        let mut plain = Plain(DirectorySource::new(dir.path().to_path_buf()));
        let default_walk: HashSet<_> = plain.walk_files(&p("classes")).unwrap().into_iter().collect();
        assert_eq!(walked, default_walk);
    }

    #[test]
    fn test_entry_kind_and_open() {
        let dir = fixture();
        let mut source = DirectorySource::new(dir.path().to_path_buf());

        assert_eq!(source.entry_kind(&p("lib")).unwrap(), Some(EntryKind::Directory));
        assert_eq!(source.entry_kind(&p("lib/one.jar")).unwrap(), Some(EntryKind::File));
        assert_eq!(source.entry_kind(&p("lib/two.jar")).unwrap(), None);

        assert!(source.open_file(&p("lib/one.jar")).unwrap().is_some());
        assert!(source.open_file(&p("lib")).unwrap().is_none());
        assert!(source.open_file(&p("lib/two.jar")).unwrap().is_none());
    }

    #[test]
    fn test_current_dir_segment_is_absent() {
        let dir = fixture();
        let mut source = DirectorySource::new(dir.path().to_path_buf());
        let dotted = p("lib/./one.jar");
        assert_eq!(source.entry_kind(&dotted).unwrap(), None);
        assert!(source.open_file(&dotted).unwrap().is_none());
        assert!(source.list_children(&p("classes/./foo")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_follows_symlinked_directories() {
        let dir = fixture();
        std::os::unix::fs::symlink(
            dir.path().join("classes/foo/deep"),
            dir.path().join("classes/linked"),
        )
        .unwrap();
        // A loop back to an ancestor is skipped, not fatal
        std::os::unix::fs::symlink(
            dir.path().join("classes"),
            dir.path().join("classes/foo/back"),
        )
        .unwrap();
        let mut source = DirectorySource::new(dir.path().to_path_buf());

        let walked: HashSet<_> = source.walk_files(&p("classes")).unwrap().into_iter().collect();
        assert_eq!(
            walked,
            HashSet::from([
                p("foo/Bar.class"),
                p("foo/deep/Baz.class"),
                p("linked/Baz.class"),
            ])
        );

        let children = source.list_children(&p("classes")).unwrap();
        assert!(children
            .iter()
            .any(|c| c.name == "linked" && c.is_directory()));
    }

    #[test]
    fn test_parent_segment_is_never_followed() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("lib/x")).unwrap();
        let mut source = DirectorySource::new(dir.path().join("lib"));
        let sneaky = p("x/../../classes/foo/Bar.class");
        assert!(sneaky.has_dot_segment());
        assert_eq!(source.entry_kind(&sneaky).unwrap(), None);
        assert!(source.open_file(&sneaky).unwrap().is_none());
    }
}

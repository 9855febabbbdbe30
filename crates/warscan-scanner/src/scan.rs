//! Main scanner implementation

use crate::callback::{ScanCallback, ScanReport, SkipReason, SkippedEntry};
use crate::error::{ScanError, ScanResult};
use crate::manifest;
use crate::path::RelativePath;
use crate::source::{ArchiveSource, EntryKind, ScanRoot};
use crate::types::{ClassDiscovery, DiscoveryOrigin, LibraryDiscovery, LibraryReference};
use crate::visited::VisitedSet;
use std::vec;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Suffix of compiled class resources
pub const CLASS_SUFFIX: &str = ".class";

/// Suffix of library archives under the libraries root, compared case-insensitively
pub const LIBRARY_SUFFIX: &str = ".jar";

/// Scan configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Root of individually compiled classes
    pub classes_root: RelativePath,
    /// Directory whose immediate children are the libraries
    pub libraries_root: RelativePath,
    /// Also report the classes contained in every scanned library
    pub nested_classes: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        let web_inf = RelativePath::root().child("WEB-INF");
        Self {
            classes_root: web_inf.child("classes"),
            libraries_root: web_inf.child("lib"),
            nested_classes: false,
        }
    }
}

impl ScanOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_classes_root(mut self, root: RelativePath) -> Self {
        self.classes_root = root;
        self
    }

    #[must_use]
    pub fn with_libraries_root(mut self, root: RelativePath) -> Self {
        self.libraries_root = root;
        self
    }

    #[must_use]
    pub fn with_nested_classes(mut self, include: bool) -> Self {
        self.nested_classes = include;
        self
    }
}

/// The main scanner struct
///
/// Holds configuration only. Every call to [`Scanner::scan`] builds its own
/// visited set and source state and drops them on return, so one scanner may
/// serve any number of scans, including concurrent ones.
#[derive(Debug, Default, Clone)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    /// Create a new scanner with default roots
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `root`, reporting every discovery to `callback`
    ///
    /// # Errors
    /// Returns an error if the root or any discovered library cannot be read
    /// as an archive, or on I/O failure. Problems with `Class-Path` entries
    /// are not errors.
    pub fn scan(&self, root: &ScanRoot, callback: &mut dyn ScanCallback) -> ScanResult<()> {
        debug!(root = %root.label(), kind = ?root.kind(), "starting scan");
        let mut source = root.open()?;
        self.scan_source(source.as_mut(), callback)
    }

    /// Scan an already opened source
    ///
    /// # Errors
    /// Same as [`Scanner::scan`]
    pub fn scan_source(
        &self,
        source: &mut dyn ArchiveSource,
        callback: &mut dyn ScanCallback,
    ) -> ScanResult<()> {
        let mut run = ScanRun {
            options: &self.options,
            source,
            callback,
            visited: VisitedSet::new(),
            classes: 0,
            libraries: 0,
        };

        run.scan_classes()?;
        run.scan_libraries()?;

        info!(
            classes = run.classes,
            libraries = run.libraries,
            "scan complete"
        );
        Ok(())
    }

    /// Scan `root` into a [`ScanReport`]
    ///
    /// # Errors
    /// Same as [`Scanner::scan`]
    pub fn scan_report(&self, root: &ScanRoot) -> ScanResult<ScanReport> {
        let mut report = ScanReport::new(root.label(), root.kind());
        self.scan(root, &mut report)?;
        Ok(report)
    }
}

/// A library whose `Class-Path` entries are still being followed
struct Frame {
    library: LibraryReference,
    entries: vec::IntoIter<String>,
}

/// State owned by a single scan call
struct ScanRun<'a> {
    options: &'a ScanOptions,
    source: &'a mut dyn ArchiveSource,
    callback: &'a mut dyn ScanCallback,
    visited: VisitedSet,
    classes: usize,
    libraries: usize,
}

impl ScanRun<'_> {
    fn scan_classes(&mut self) -> ScanResult<()> {
        let root = &self.options.classes_root;
        let files = self.source.walk_files(root)?;
        debug!(%root, files = files.len(), "walked classes root");

        for path in files {
            if is_class_name(&path) {
                self.report_class(path, DiscoveryOrigin::Root);
            }
        }
        Ok(())
    }

    fn scan_libraries(&mut self) -> ScanResult<()> {
        let root = self.options.libraries_root.clone();
        for child in self.source.list_children(&root)? {
            if child.is_directory() || !is_library_name(&child.name) {
                continue;
            }
            let library = LibraryReference::new(root.child(&child.name));
            if !self.visited.add(&library) {
                debug!(%library, "library already visited");
                continue;
            }
            self.report_library(&library, DiscoveryOrigin::Root);
            self.follow_class_path(library)?;
        }
        Ok(())
    }

    /// Depth-first walk over `Class-Path` declarations starting at `start`
    ///
    /// Uses an explicit stack so hostile declaration chains cannot exhaust
    /// the thread's stack; visiting order is that of plain recursion.
    fn follow_class_path(&mut self, start: LibraryReference) -> ScanResult<()> {
        let mut stack = vec![self.open_library(start)?];

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let library = frame.library.clone();

            let Some(target) = self.resolve_entry(&library, &entry)? else {
                continue;
            };
            if !self.visited.add(&target) {
                debug!(%library, %target, "class path target already visited");
                continue;
            }
            self.report_library(&target, DiscoveryOrigin::Nested);
            stack.push(self.open_library(target)?);
        }
        Ok(())
    }

    /// Read a library's declaration, reporting its classes when asked to
    fn open_library(&mut self, library: LibraryReference) -> ScanResult<Frame> {
        let label = library.to_string();
        let Some(reader) = self.source.open_file(library.path())? else {
            warn!(%library, "library disappeared during scan");
            return Ok(Frame {
                library,
                entries: Vec::new().into_iter(),
            });
        };

        let mut archive = ZipArchive::new(reader).map_err(|e| ScanError::corrupt(label.clone(), e))?;
        let entries = manifest::read_class_path(&mut archive, &label)?;
        debug!(%library, entries = entries.len(), "read class path");

        if self.options.nested_classes {
            let classes: Vec<RelativePath> = archive
                .file_names()
                .filter(|name| !name.ends_with('/') && name.ends_with(CLASS_SUFFIX))
                .filter_map(|name| match RelativePath::parse(name) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        debug!(%library, error = %e, "skipping library entry");
                        None
                    }
                })
                .collect();
            for class in classes {
                self.report_class(class, DiscoveryOrigin::Nested);
            }
        }

        Ok(Frame {
            library,
            entries: entries.into_iter(),
        })
    }

    /// Resolve one declared entry to an existing library file
    ///
    /// `Ok(None)` means the entry was skipped; the callback has been told why.
    fn resolve_entry(
        &mut self,
        library: &LibraryReference,
        entry: &str,
    ) -> ScanResult<Option<LibraryReference>> {
        let resolved = RelativePath::parse(entry)
            .and_then(|relative| library.directory().resolve(&relative));
        let target = match resolved {
            Ok(target) => target,
            Err(e) => {
                warn!(%library, entry, error = %e, "skipping class path entry");
                self.skip(library, entry, None, SkipReason::Invalid(e.to_string()));
                return Ok(None);
            }
        };

        match self.source.entry_kind(&target)? {
            Some(EntryKind::File) => Ok(Some(LibraryReference::new(target))),
            Some(EntryKind::Directory) => {
                debug!(%library, %target, "class path entry is a directory");
                self.skip(library, entry, Some(target), SkipReason::Directory);
                Ok(None)
            }
            None => {
                debug!(%library, %target, "class path entry not found");
                self.skip(library, entry, Some(target), SkipReason::NotFound);
                Ok(None)
            }
        }
    }

    fn report_class(&mut self, path: RelativePath, origin: DiscoveryOrigin) {
        self.classes += 1;
        self.callback.class_found(&ClassDiscovery { path, origin });
    }

    fn report_library(&mut self, library: &LibraryReference, origin: DiscoveryOrigin) {
        self.libraries += 1;
        self.callback.library_found(&LibraryDiscovery {
            path: library.path().clone(),
            origin,
        });
    }

    fn skip(
        &mut self,
        library: &LibraryReference,
        entry: &str,
        resolved: Option<RelativePath>,
        reason: SkipReason,
    ) {
        self.callback.entry_skipped(&SkippedEntry {
            library: library.path().clone(),
            entry: entry.to_string(),
            resolved,
            reason,
        });
    }
}

fn is_class_name(path: &RelativePath) -> bool {
    path.file_name()
        .is_some_and(|name| name.ends_with(CLASS_SUFFIX))
}

fn is_library_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(LIBRARY_SUFFIX)
}

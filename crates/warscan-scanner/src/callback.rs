//! Discovery sinks
//!
//! The scanner reports through [`ScanCallback`]. [`ScanReport`] is the
//! collecting implementation used by the CLI and by most callers that just
//! want the result sets.

use crate::path::RelativePath;
use crate::source::SourceKind;
use crate::types::{ClassDiscovery, DiscoveryOrigin, LibraryDiscovery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Receives discoveries from a single scan, on the scanning thread
///
/// Implementations must not fail: anything that can go wrong downstream is
/// deferred until the scan has returned.
pub trait ScanCallback {
    fn class_found(&mut self, class: &ClassDiscovery);

    fn library_found(&mut self, library: &LibraryDiscovery);

    /// A `Class-Path` entry that was not followed
    fn entry_skipped(&mut self, _skipped: &SkippedEntry) {}
}

/// Why a `Class-Path` entry was not followed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum SkipReason {
    /// Malformed, or resolves above the scan root
    Invalid(String),
    /// Nothing exists at the resolved path
    NotFound,
    /// The resolved path is a directory
    Directory,
}

/// A `Class-Path` entry the scanner skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Library whose manifest declared the entry
    pub library: RelativePath,
    /// The entry as written in the manifest
    pub entry: String,
    /// Resolved location, when resolution succeeded
    pub resolved: Option<RelativePath>,
    pub reason: SkipReason,
}

/// Collected results of one scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Scan root label
    pub root: String,
    /// Representation of the scan root
    pub kind: SourceKind,
    /// Classes under the classes root, relative to it
    pub classes: BTreeSet<RelativePath>,
    /// Classes found inside libraries, relative to their library
    #[serde(default)]
    pub library_classes: BTreeSet<RelativePath>,
    /// Libraries, relative to the scan root
    pub libraries: BTreeSet<RelativePath>,
    /// Libraries first reached through a `Class-Path` declaration
    ///
    /// A library both listed in the libraries root and declared by a sibling
    /// lands here or not depending on listing order.
    #[serde(default)]
    pub transitive_libraries: BTreeSet<RelativePath>,
    /// Entries that were not followed
    #[serde(default)]
    pub skipped: Vec<SkippedEntry>,
    /// When the scan was performed
    pub scanned_at: DateTime<Utc>,
}

impl ScanReport {
    #[must_use]
    pub fn new(root: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            root: root.into(),
            kind,
            classes: BTreeSet::new(),
            library_classes: BTreeSet::new(),
            libraries: BTreeSet::new(),
            transitive_libraries: BTreeSet::new(),
            skipped: Vec::new(),
            scanned_at: Utc::now(),
        }
    }

    /// Whether the two reports found the same classes and libraries
    ///
    /// Origins are not compared since they depend on listing order.
    #[must_use]
    pub fn same_discoveries(&self, other: &ScanReport) -> bool {
        self.classes == other.classes
            && self.library_classes == other.library_classes
            && self.libraries == other.libraries
    }
}

impl ScanCallback for ScanReport {
    fn class_found(&mut self, class: &ClassDiscovery) {
        match class.origin {
            DiscoveryOrigin::Root => self.classes.insert(class.path.clone()),
            DiscoveryOrigin::Nested => self.library_classes.insert(class.path.clone()),
        };
    }

    fn library_found(&mut self, library: &LibraryDiscovery) {
        self.libraries.insert(library.path.clone());
        if library.origin == DiscoveryOrigin::Nested {
            self.transitive_libraries.insert(library.path.clone());
        }
    }

    fn entry_skipped(&mut self, skipped: &SkippedEntry) {
        self.skipped.push(skipped.clone());
    }
}

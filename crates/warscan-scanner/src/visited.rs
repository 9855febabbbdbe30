//! Per-scan deduplication of library references

use crate::types::LibraryReference;
use std::collections::HashSet;

/// Libraries already reported or being scanned during one scan call
///
/// Grows monotonically; there is no removal.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<LibraryReference>,
}

impl VisitedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `library`; `false` means it was already visited and must be skipped
    pub fn add(&mut self, library: &LibraryReference) -> bool {
        if self.seen.contains(library) {
            return false;
        }
        self.seen.insert(library.clone())
    }

    #[must_use]
    pub fn contains(&self, library: &LibraryReference) -> bool {
        self.seen.contains(library)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

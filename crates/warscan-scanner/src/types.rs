//! Shared types for the warscan scanner

use crate::path::RelativePath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a discovery came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryOrigin {
    /// Directly under the classes root or the libraries root
    Root,
    /// Reached through a library's `Class-Path` declaration, or found inside a library
    Nested,
}

/// A compiled class resource
///
/// Classes under the classes root are relative to that root; classes found
/// inside a library are relative to the library itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDiscovery {
    pub path: RelativePath,
    pub origin: DiscoveryOrigin,
}

/// A library archive, relative to the scan root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryDiscovery {
    pub path: RelativePath,
    pub origin: DiscoveryOrigin,
}

/// A nested library location inside the scan root
///
/// Two references are the same library iff their resolved paths are equal,
/// which is what cycle detection keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryReference(RelativePath);

impl LibraryReference {
    #[must_use]
    pub fn new(path: RelativePath) -> Self {
        Self(path)
    }

    #[must_use]
    pub fn path(&self) -> &RelativePath {
        &self.0
    }

    /// Directory `Class-Path` entries of this library are resolved against
    #[must_use]
    pub fn directory(&self) -> RelativePath {
        self.0.parent().unwrap_or_default()
    }
}

impl fmt::Display for LibraryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

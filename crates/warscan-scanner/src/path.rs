//! Slash-separated relative paths inside a scan root
//!
//! A [`RelativePath`] is the only path representation the scanner uses for
//! archive entries, whatever the backing storage. Resolution of `Class-Path`
//! entries happens here and is the single place that stops a declaration
//! from climbing above the scan root.

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '/';
const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";

/// An immutable, validated sequence of non-empty path segments
///
/// Equality and hashing are structural over the segments, so `./a/b` and
/// `a/b` are the same path once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// The empty path, naming the scan root itself
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and validate a textual path
    ///
    /// A leading run of `.` segments is dropped. A `.` anywhere after the
    /// first real segment is kept as-is, and so is any `..`; only
    /// [`RelativePath::resolve`] gives `..` a meaning.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        if text.contains('\\') {
            return Err(PathError::Backslash(text.to_string()));
        }
        if text.ends_with(SEPARATOR) {
            return Err(PathError::TrailingSeparator(text.to_string()));
        }

        let mut segments = Vec::new();
        for segment in text.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(text.to_string()));
            }
            if segments.is_empty() && segment == CURRENT_DIR {
                continue;
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Resolve `relative` against this path taken as a directory
    ///
    /// Each leading `..` of `relative` removes one trailing segment of the
    /// base; what remains of `relative` is appended. Fails when a `..` is
    /// left over after the base is used up. A `.` that ends up leading the
    /// result is dropped, as [`RelativePath::parse`] would drop it.
    pub fn resolve(&self, relative: &RelativePath) -> Result<RelativePath, PathError> {
        let mut segments = self.segments.clone();
        let mut rest = relative.segments.iter().peekable();

        while rest.next_if(|segment| *segment == PARENT_DIR).is_some() {
            if segments.pop().is_none() {
                return Err(PathError::EscapesRoot {
                    base: self.to_string(),
                    relative: relative.to_string(),
                });
            }
        }
        segments.extend(rest.cloned());
        let leading = segments
            .iter()
            .take_while(|segment| *segment == CURRENT_DIR)
            .count();
        segments.drain(..leading);

        Ok(Self { segments })
    }

    /// The directory containing this path; the root for a single segment
    ///
    /// Returns `None` only for the root itself.
    #[must_use]
    pub fn parent(&self) -> Option<RelativePath> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.to_vec(),
        })
    }

    /// Last segment, if any
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a single listing name
    #[must_use]
    pub fn child(&self, name: &str) -> RelativePath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Append all segments of `other`
    #[must_use]
    pub fn join(&self, other: &RelativePath) -> RelativePath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Remove `prefix` from the front of this path
    #[must_use]
    pub fn strip_prefix(&self, prefix: &RelativePath) -> Option<RelativePath> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| Self {
                segments: rest.to_vec(),
            })
    }

    /// Whether `prefix` names this path or one of its ancestors
    #[must_use]
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Whether any `.` or `..` segment survived parsing and resolution
    ///
    /// Storage backends treat such paths as absent.
    #[must_use]
    pub fn has_dot_segment(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| segment == CURRENT_DIR || segment == PARENT_DIR)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for RelativePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.to_string()
    }
}

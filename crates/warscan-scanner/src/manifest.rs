//! Jar manifest reader
//!
//! Only the main section is parsed, and the scanner only ever asks it for
//! the `Class-Path` attribute.

use crate::error::{ScanError, ScanResult};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Location of the manifest inside a jar
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Attribute naming the libraries a jar depends on
pub const CLASS_PATH: &str = "Class-Path";

/// Main-section attributes of a manifest, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest bytes
    ///
    /// Lines may end in CRLF, LF or CR. A line starting with a single space
    /// continues the previous value. The main section ends at the first
    /// blank line following a header.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        let mut raw: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

        for line in split_lines(bytes) {
            if line.is_empty() {
                if raw.is_empty() {
                    continue;
                }
                break;
            }

            if let Some(continuation) = line.strip_prefix(b" ") {
                if let Some((_, value)) = raw.last_mut() {
                    value.extend_from_slice(continuation);
                }
                continue;
            }

            let Some(colon) = line.iter().position(|&b| b == b':') else {
                debug!(line = %String::from_utf8_lossy(line), "ignoring malformed manifest line");
                continue;
            };
            let (name, value) = line.split_at(colon);
            let value = value[1..].strip_prefix(b" ").unwrap_or(&value[1..]);
            if name.is_empty() {
                continue;
            }
            raw.push((name.to_vec(), value.to_vec()));
        }

        let attributes = raw
            .into_iter()
            .map(|(name, value)| {
                (
                    String::from_utf8_lossy(&name).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect();

        Self { attributes }
    }

    /// Look up a main attribute; names compare ASCII case-insensitively
    #[must_use]
    pub fn main_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whitespace-separated `Class-Path` entries, empty when absent
    #[must_use]
    pub fn class_path(&self) -> Vec<String> {
        self.main_attribute(CLASS_PATH)
            .map(|value| value.split_ascii_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Read the `Class-Path` declaration of an opened jar
///
/// A jar without a manifest declares nothing. Failing to read a manifest
/// that is present is an error.
pub fn read_class_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    library: &str,
) -> ScanResult<Vec<String>> {
    let Some(name) = manifest_entry_name(archive) else {
        debug!(library, "no manifest");
        return Ok(Vec::new());
    };

    let mut entry = match archive.by_name(&name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(Vec::new()),
        Err(e) => return Err(ScanError::corrupt(library, e)),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;

    Ok(Manifest::parse(&bytes).class_path())
}

/// Read the `Class-Path` declaration of a jar on the local filesystem
///
/// # Errors
/// Returns an error if the file cannot be opened or is not an archive
pub fn read_jar_class_path(path: &Path) -> ScanResult<Vec<String>> {
    let label = path.display().to_string();
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ScanError::corrupt(label.clone(), e))?;
    read_class_path(&mut archive, &label)
}

fn manifest_entry_name<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .find(|name| *name == MANIFEST_PATH)
        .or_else(|| {
            archive
                .file_names()
                .find(|name| name.eq_ignore_ascii_case(MANIFEST_PATH))
        })
        .map(String::from)
}

fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(&bytes[start..index]);
                start = index + 1;
            }
            b'\r' => {
                lines.push(&bytes[start..index]);
                if bytes.get(index + 1) == Some(&b'\n') {
                    index += 1;
                }
                start = index + 1;
            }
            _ => {}
        }
        index += 1;
    }
    if start < bytes.len() {
        lines.push(&bytes[start..]);
    }

    lines
}

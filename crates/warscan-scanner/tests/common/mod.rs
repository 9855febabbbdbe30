//! Fixture builders shared by the scanner integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use warscan_scanner::callback::SkippedEntry;
use warscan_scanner::{
    ClassDiscovery, LibraryDiscovery, RelativePath, ScanCallback, ScanOptions, ScanRoot,
};
use zip::write::FileOptions;
use zip::ZipWriter;

pub fn p(text: &str) -> RelativePath {
    RelativePath::parse(text).expect("valid test path")
}

/// Build jar bytes with an optional `Class-Path` and some class entries
pub fn jar_bytes(class_path: Option<&str>, classes: &[&str]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    let mut manifest = String::from("Manifest-Version: 1.0\r\n");
    if let Some(class_path) = class_path {
        manifest.push_str(&format!("Class-Path: {class_path}\r\n"));
    }
    manifest.push_str("\r\n");
    writer
        .start_file("META-INF/MANIFEST.MF", options)
        .expect("Failed to start manifest");
    writer
        .write_all(manifest.as_bytes())
        .expect("Failed to write manifest");

    for class in classes {
        writer.start_file(*class, options).expect("Failed to start class");
        writer
            .write_all(b"\xca\xfe\xba\xbe")
            .expect("Failed to write class");
    }

    writer.finish().expect("Failed to finish jar").into_inner()
}

/// Write a jar at `base/relative`, creating parent directories
pub fn write_jar(base: &Path, relative: &str, class_path: Option<&str>, classes: &[&str]) {
    write_file(base, relative, &jar_bytes(class_path, classes));
}

pub fn write_file(base: &Path, relative: &str, content: &[u8]) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().expect("file has a parent"))
        .expect("Failed to create parent directory");
    fs::write(path, content).expect("Failed to write file");
}

/// Relative file names and contents below `source_dir`, sorted by name
fn collect_files(source_dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.expect("Failed to walk fixture");
        if !entry.path().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(source_dir)
            .expect("entry below source")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let content = fs::read(entry.path()).expect("Failed to read fixture file");
        files.push((name, content));
    }
    files
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// Container bytes laid out the way a non-seekable writer produces them
///
/// Every local header has general purpose flag bit 3 set and zero sizes;
/// the real CRC and sizes follow the data in a data descriptor and are
/// repeated in the central directory. Entries are stored uncompressed.
pub fn descriptor_zip_bytes(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    const FLAGS: u16 = 1 << 3;
    const VERSION: u16 = 20;
    const DOS_DATE: u16 = (1 << 5) | 1;

    let mut out = Vec::new();
    let mut central = Vec::new();
    for (name, data) in entries {
        let offset = u32::try_from(out.len()).expect("fixture fits in 4 GiB");
        let crc = crc32(data);
        let size = u32::try_from(data.len()).expect("fixture entry fits in 4 GiB");
        let name_len = u16::try_from(name.len()).expect("short entry name");

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&FLAGS.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&0u16.to_le_bytes()); // time
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&[0u8; 12]); // crc and sizes, deferred
        out.extend_from_slice(&name_len.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
        out.extend_from_slice(&0x0807_4b50u32.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&VERSION.to_le_bytes()); // made by
        central.extend_from_slice(&VERSION.to_le_bytes()); // needed
        central.extend_from_slice(&FLAGS.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&DOS_DATE.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&name_len.to_le_bytes());
        central.extend_from_slice(&[0u8; 8]); // extra, comment, disk, internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let count = u16::try_from(entries.len()).expect("few fixture entries");
    let central_offset = u32::try_from(out.len()).expect("fixture fits in 4 GiB");
    let central_size = u32::try_from(central.len()).expect("fixture fits in 4 GiB");
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // disk numbers
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&central_size.to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

/// Pack a directory tree with trailing data descriptors, files only
pub fn pack_dir_with_descriptors(source_dir: &Path, output_path: &Path) {
    fs::write(output_path, descriptor_zip_bytes(&collect_files(source_dir)))
        .expect("Failed to write container");
}

/// Pack a directory tree into a container file, files only
pub fn pack_dir(source_dir: &Path, output_path: &Path) {
    let file = File::create(output_path).expect("Failed to create container");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default();

    for (name, content) in collect_files(source_dir) {
        zip.start_file(name, options).expect("Failed to start entry");
        zip.write_all(&content).expect("Failed to write entry");
    }

    zip.finish().expect("Failed to finish container");
}

/// The three ways a scan root can be presented
pub struct Representations {
    pub dir: TempDir,
    pub unpacked: PathBuf,
    pub packed: PathBuf,
}

impl Representations {
    /// Lay out a tree with `build` and also pack it
    pub fn new(build: impl FnOnce(&Path)) -> Self {
        Self::packed_with(build, pack_dir)
    }

    /// Like [`Representations::new`], packing with `pack`
    pub fn packed_with(build: impl FnOnce(&Path), pack: impl FnOnce(&Path, &Path)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let unpacked = dir.path().join("app");
        fs::create_dir_all(&unpacked).expect("Failed to create app directory");
        build(&unpacked);

        let packed = dir.path().join("app.war");
        pack(&unpacked, &packed);

        Self {
            dir,
            unpacked,
            packed,
        }
    }

    pub fn directory_root(&self) -> ScanRoot {
        ScanRoot::from_path(&self.unpacked).expect("directory root")
    }

    pub fn container_root(&self) -> ScanRoot {
        ScanRoot::from_path(&self.packed).expect("container root")
    }

    pub fn stream_root(&self) -> ScanRoot {
        let packed = self.packed.clone();
        ScanRoot::from_stream("app.war (stream)", move || {
            Ok(Box::new(File::open(&packed)?) as Box<dyn Read + Send>)
        })
    }

    pub fn all_roots(&self) -> Vec<ScanRoot> {
        vec![
            self.directory_root(),
            self.container_root(),
            self.stream_root(),
        ]
    }
}

/// The layout from the scanner's documentation: classes and lib roots at the
/// top, with a library reaching outside `lib/` through its `Class-Path`
pub fn documented_layout(base: &Path) {
    write_file(base, "classes/foo/Bar.class", b"\xca\xfe\xba\xbe");
    write_jar(base, "lib/one.jar", Some("../extra/two.jar"), &[]);
    write_jar(base, "extra/two.jar", None, &[]);
}

pub fn top_level_options() -> ScanOptions {
    ScanOptions::new()
        .with_classes_root(p("classes"))
        .with_libraries_root(p("lib"))
}

/// Records every callback invocation in order
#[derive(Debug, Default)]
pub struct Recorder {
    pub classes: Vec<ClassDiscovery>,
    pub libraries: Vec<LibraryDiscovery>,
    pub skipped: Vec<SkippedEntry>,
}

impl Recorder {
    pub fn class_set(&self) -> HashSet<String> {
        self.classes.iter().map(|c| c.path.to_string()).collect()
    }

    pub fn library_set(&self) -> HashSet<String> {
        self.libraries.iter().map(|l| l.path.to_string()).collect()
    }

    pub fn library_order(&self) -> Vec<String> {
        self.libraries.iter().map(|l| l.path.to_string()).collect()
    }

    pub fn times_found(&self, library: &str) -> usize {
        self.libraries
            .iter()
            .filter(|l| l.path.to_string() == library)
            .count()
    }
}

impl ScanCallback for Recorder {
    fn class_found(&mut self, class: &ClassDiscovery) {
        self.classes.push(class.clone());
    }

    fn library_found(&mut self, library: &LibraryDiscovery) {
        self.libraries.push(library.clone());
    }

    fn entry_skipped(&mut self, skipped: &SkippedEntry) {
        self.skipped.push(skipped.clone());
    }
}

pub fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

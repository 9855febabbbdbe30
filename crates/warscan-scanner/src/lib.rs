//! warscan scanner - recursive web-archive classpath discovery
//!
//! This crate walks a deployable web archive, either unpacked on disk or
//! packed into a single container file, and reports the compiled classes
//! under its classes root plus every library archive reachable from its
//! libraries root, following each library's `Class-Path` declaration.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::single_match_else,
    clippy::match_same_arms,
    clippy::unnecessary_debug_formatting,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::manual_let_else
)]

pub mod callback;
pub mod error;
pub mod manifest;
pub mod output;
pub mod path;
pub mod scan;
pub mod source;
pub mod types;
pub mod visited;

pub use callback::{ScanCallback, ScanReport, SkippedEntry};
pub use error::{PathError, ScanError, ScanResult};
pub use path::RelativePath;
pub use scan::{ScanOptions, Scanner};
pub use source::{ArchiveSource, ScanRoot, SourceKind};
pub use types::{ClassDiscovery, DiscoveryOrigin, LibraryDiscovery, LibraryReference};
pub use visited::VisitedSet;

//! Markdown output formatter

use crate::callback::{ScanReport, SkipReason};
use crate::path::RelativePath;
use crate::source::SourceKind;
use std::collections::BTreeSet;

/// Convert a scan report to a Markdown document
#[must_use]
pub fn to_markdown(report: &ScanReport) -> String {
    let mut output = String::new();

    output.push_str("# warscan Report\n\n");
    output.push_str(&format!("**Root:** {}\n\n", report.root));
    output.push_str(&format!(
        "**Kind:** {}\n\n",
        match report.kind {
            SourceKind::Directory => "directory",
            SourceKind::Container => "container",
        }
    ));
    output.push_str(&format!(
        "**Scanned at:** {}\n\n",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Summary
    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Classes:** {}\n", report.classes.len()));
    output.push_str(&format!("- **Libraries:** {}\n", report.libraries.len()));
    output.push_str(&format!(
        "- **Transitive libraries:** {}\n",
        report.transitive_libraries.len()
    ));
    if !report.library_classes.is_empty() {
        output.push_str(&format!(
            "- **Library classes:** {}\n",
            report.library_classes.len()
        ));
    }
    output.push_str(&format!("- **Skipped entries:** {}\n\n", report.skipped.len()));

    // Libraries
    output.push_str("## Libraries\n\n");
    if report.libraries.is_empty() {
        output.push_str("_No libraries found_\n\n");
    } else {
        for library in &report.libraries {
            if report.transitive_libraries.contains(library) {
                output.push_str(&format!("- `{library}` (via Class-Path)\n"));
            } else {
                output.push_str(&format!("- `{library}`\n"));
            }
        }
        output.push('\n');
    }

    push_path_section(&mut output, "Classes", &report.classes, "_No classes found_");
    if !report.library_classes.is_empty() {
        push_path_section(&mut output, "Library Classes", &report.library_classes, "");
    }

    // Skipped
    if !report.skipped.is_empty() {
        output.push_str("## Skipped Class-Path Entries\n\n");
        for skipped in &report.skipped {
            let reason = match &skipped.reason {
                SkipReason::Invalid(message) => format!("invalid: {message}"),
                SkipReason::NotFound => "not found".to_string(),
                SkipReason::Directory => "is a directory".to_string(),
            };
            output.push_str(&format!(
                "- `{}` in `{}` ({reason})\n",
                skipped.entry, skipped.library
            ));
        }
        output.push('\n');
    }

    output
}

fn push_path_section(output: &mut String, title: &str, paths: &BTreeSet<RelativePath>, empty: &str) {
    output.push_str(&format!("## {title}\n\n"));
    if paths.is_empty() {
        output.push_str(empty);
        output.push_str("\n\n");
        return;
    }
    for path in paths {
        output.push_str(&format!("- `{path}`\n"));
    }
    output.push('\n');
}

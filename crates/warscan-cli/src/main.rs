//! warscan CLI - Command-line interface for the web archive scanner
//!
//! Provides `warscan scan`, `warscan classpath` and `warscan resolve`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use warscan_scanner::callback::SkipReason;
use warscan_scanner::manifest::read_jar_class_path;
use warscan_scanner::output::{json::to_json, markdown::to_markdown};
use warscan_scanner::{RelativePath, ScanOptions, ScanReport, ScanRoot, Scanner};

#[derive(Parser)]
#[command(name = "warscan")]
#[command(about = "warscan - find the classes and libraries of a Java web application")]
#[command(version)]
struct Cli {
    /// Log scanner decisions to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an unpacked or packed web application
    Scan {
        /// Directory or archive to scan
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Also report the classes inside every library
        #[arg(long)]
        nested_classes: bool,

        /// Root of compiled classes, relative to ROOT
        #[arg(long, value_name = "PATH", default_value = "WEB-INF/classes")]
        classes_root: String,

        /// Directory holding the libraries, relative to ROOT
        #[arg(long, value_name = "PATH", default_value = "WEB-INF/lib")]
        lib_root: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the Class-Path entries declared by a jar
    Classpath {
        /// Jar file to read
        #[arg(value_name = "JAR")]
        jar: PathBuf,
    },
    /// Resolve a relative path against a base directory
    Resolve {
        /// Base directory, relative to a scan root
        base: String,
        /// Path to resolve, as written in a Class-Path entry
        relative: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Markdown,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli.command);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Scan {
            root,
            nested_classes,
            classes_root,
            lib_root,
            format,
            output,
        } => {
            let options = ScanOptions::new()
                .with_classes_root(parse_root("--classes-root", &classes_root)?)
                .with_libraries_root(parse_root("--lib-root", &lib_root)?)
                .with_nested_classes(nested_classes);
            run_scan(&root, options, format, output.as_deref())
        }
        Commands::Classpath { jar } => run_classpath(&jar),
        Commands::Resolve { base, relative } => run_resolve(&base, &relative),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Parse a configured root, refusing anything above the scan root
fn parse_root(flag: &str, value: &str) -> Result<RelativePath> {
    RelativePath::parse(value)
        .and_then(|path| RelativePath::root().resolve(&path))
        .with_context(|| format!("Invalid {flag} value: {value}"))
}

fn run_scan(
    root: &Path,
    options: ScanOptions,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let scan_root =
        ScanRoot::from_path(root).with_context(|| format!("Cannot scan {}", root.display()))?;
    debug!(root = %root.display(), ?options, "scanning");

    let report = Scanner::with_options(options)
        .scan_report(&scan_root)
        .with_context(|| format!("Scan of {} failed", root.display()))?;

    let rendered = match format {
        OutputFormat::Json => to_json(&report)?,
        OutputFormat::Markdown => to_markdown(&report),
        OutputFormat::Text => to_text(&report),
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// One line per discovery, suitable for piping
fn to_text(report: &ScanReport) -> String {
    let mut out = String::new();
    for library in &report.libraries {
        let _ = writeln!(out, "library {library}");
    }
    for class in &report.classes {
        let _ = writeln!(out, "class {class}");
    }
    for class in &report.library_classes {
        let _ = writeln!(out, "library-class {class}");
    }
    for skipped in &report.skipped {
        let reason = match &skipped.reason {
            SkipReason::Invalid(detail) => format!("invalid ({detail})"),
            SkipReason::NotFound => "not found".to_string(),
            SkipReason::Directory => "directory".to_string(),
        };
        let _ = writeln!(
            out,
            "skipped {} {}: {reason}",
            skipped.library, skipped.entry
        );
    }
    out
}

fn run_classpath(jar: &Path) -> Result<()> {
    let entries = read_jar_class_path(jar)
        .with_context(|| format!("Cannot read manifest of {}", jar.display()))?;
    for entry in entries {
        println!("{entry}");
    }
    Ok(())
}

fn run_resolve(base: &str, relative: &str) -> Result<()> {
    let base_path = RelativePath::parse(base).with_context(|| format!("Invalid base: {base}"))?;
    let relative_path =
        RelativePath::parse(relative).with_context(|| format!("Invalid path: {relative}"))?;
    let resolved = base_path
        .resolve(&relative_path)
        .with_context(|| format!("Cannot resolve {relative} against {base}"))?;
    println!("{resolved}");
    Ok(())
}

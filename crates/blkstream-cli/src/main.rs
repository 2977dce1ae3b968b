//! blkstream - Walk the records of magic-delimited block files
//!
//! This tool scans `blk*.dat` style files for record markers and lists each
//! record's position and declared length, without interpreting its contents.

use anyhow::{bail, Context, Result};
use blkstream_core::{DecoderConfig, Error as DecodeError, RawRecord};
use clap::{Args, Parser, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Walk the records of magic-delimited block files
#[derive(Parser, Debug)]
#[command(name = "blkstream")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Record start marker as hex, e.g. 0xD9B4BEF9
    #[arg(long, value_parser = parse_magic, default_value = "0xD9B4BEF9", env = "BLKSTREAM_MAGIC")]
    magic: u32,

    /// Number of 4-byte words a marker scan may read before giving up
    #[arg(long, default_value = "50000")]
    max_attempts: usize,

    /// Scan for markers without an attempt limit
    #[arg(long)]
    unbounded: bool,

    /// Maximum number of records to read per file (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_records: usize,

    /// Number of leading body bytes to print as hex
    #[arg(long, default_value = "0")]
    preview: usize,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single block file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of block files
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for the record listing
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per record
    Table,
    /// Per-file totals only
    Summary,
}

/// Counters for one file or a whole run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Totals {
    files: usize,
    records: usize,
    body_bytes: u64,
    scanned_bytes: u64,
    errors: usize,
}

impl Totals {
    fn add(&mut self, other: Totals) {
        self.files += other.files;
        self.records += other.records;
        self.body_bytes += other.body_bytes;
        self.scanned_bytes += other.scanned_bytes;
        self.errors += other.errors;
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} files, {} records, {} body bytes, {} bytes scanned, {} errors",
            self.files, self.records, self.body_bytes, self.scanned_bytes, self.errors
        );
    }
}

fn parse_magic(s: &str) -> std::result::Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid magic '{}': {}", s, e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let totals = if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file)?
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)?
    } else {
        bail!("Either --file or --directory must be specified")
    };

    totals.print_summary();
    Ok(())
}

fn decoder_config(cli: &Cli) -> DecoderConfig {
    DecoderConfig::new()
        .magic(cli.magic)
        .max_magic_attempts(cli.max_attempts)
        .bounded_scan(!cli.unbounded)
}

/// Process a single block file
fn process_single_file(cli: &Cli, file: &Path) -> Result<Totals> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    process_block_file(cli, file)
}

/// Process every block file under a directory, in name order
fn process_directory(cli: &Cli, directory: &Path) -> Result<Totals> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut totals = Totals::default();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_likely_block_file(path, cli.magic) {
            trace!("Skipping non-block file: {}", path.display());
            continue;
        }

        debug!("Processing block file: {}", path.display());
        match process_block_file(cli, path) {
            Ok(file_totals) => totals.add(file_totals),
            Err(e) => {
                // Log error but continue with other files
                warn!("Error processing {}: {:#}", path.display(), e);
                totals.errors += 1;
            }
        }
    }

    Ok(totals)
}

/// Heuristic: `blk*.dat` by name, or a file opening with the marker
fn is_likely_block_file(path: &Path, magic: u32) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.starts_with("blk") && name.ends_with(".dat") {
        return true;
    }

    if let Ok(mut file) = fs::File::open(path) {
        let mut head = [0u8; 4];
        if file.read_exact(&mut head).is_ok() {
            return u32::from_le_bytes(head) == magic;
        }
    }

    false
}

/// Walk one file's records, printing them to stdout
fn process_block_file(cli: &Cli, path: &Path) -> Result<Totals> {
    let stdout = io::stdout();
    list_records(cli, path, &mut stdout.lock())
}

/// Walk one file's records, writing them to `out` as configured
fn list_records(cli: &Cli, path: &Path, out: &mut impl Write) -> Result<Totals> {
    let reader = blkstream_core::open_file_with_config(path, decoder_config(cli))
        .with_context(|| format!("Failed to open block file: {}", path.display()))?;

    let mut totals = Totals {
        files: 1,
        ..Totals::default()
    };

    for result in reader {
        if cli.max_records > 0 && totals.records >= cli.max_records {
            debug!("Record limit reached in {}", path.display());
            break;
        }

        match result {
            Ok(record) => {
                if let OutputFormat::Table = cli.format {
                    let line = format_record(path, totals.records, &record, cli.preview);
                    writeln!(out, "{}", line)?;
                }

                totals.records += 1;
                totals.body_bytes += u64::from(record.declared_len);
                totals.scanned_bytes += record.scanned;
            }
            Err(e @ DecodeError::MagicNotFound { .. }) => {
                warn!("{}: {}", path.display(), e);
                totals.errors += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read record {} of {}", totals.records, path.display())
                });
            }
        }
    }

    if let OutputFormat::Summary = cli.format {
        writeln!(
            out,
            "{}\trecords={}\tbytes={}\tscanned={}",
            path.display(),
            totals.records,
            totals.body_bytes,
            totals.scanned_bytes
        )?;
    }

    Ok(totals)
}

fn format_record(path: &Path, index: usize, record: &RawRecord, preview: usize) -> String {
    let mut line = format!(
        "{}\t#{}\toffset={}\tlen={}",
        path.display(),
        index,
        record.offset,
        record.declared_len
    );
    if preview > 0 {
        let shown = &record.body[..preview.min(record.body.len())];
        line.push('\t');
        line.push_str(&hex::encode(shown));
    }
    line
}

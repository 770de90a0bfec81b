//! Command-line argument definition.

use clap::Parser;
use std::path::PathBuf;

/// Block-level delta-transfer file synchronization.
#[derive(Parser, Debug)]
#[command(name = "blocksync", version, about)]
pub struct Args {
    /// Recurse into directories.
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Compress outgoing messages above the minimum size threshold.
    #[arg(short = 'z', long)]
    pub compress: bool,

    /// Delete destination paths that no longer exist on the source.
    #[arg(long)]
    pub delete: bool,

    /// Force the checksum-based sync decision instead of trusting size and
    /// modification time.
    #[arg(short = 'c', long)]
    pub checksum: bool,

    /// Skip paths matching this glob (may be repeated).
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,

    /// Increase logging verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run as the receiver end of a session, speaking the wire protocol over
    /// stdin/stdout. In this mode only one positional path is accepted (the
    /// receiver's root) and it is read into `src`.
    #[arg(long)]
    pub server: bool,

    /// Source path. The receiver root when `--server` is given.
    #[arg(value_name = "SRC")]
    pub src: Option<PathBuf>,

    /// Destination path. Absent when `--server` is given.
    #[arg(value_name = "DST")]
    pub dst: Option<PathBuf>,
}

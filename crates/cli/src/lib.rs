#![deny(missing_docs)]

//! # Overview
//!
//! The thin command-line front end: argument parsing, directory walking
//! into [`protocol::FileEntry`] lists, exclude-pattern filtering, and wiring
//! an [`engine::run_sender`]/[`engine::run_receiver`] pair to the transport
//! the destination calls for. It contains no delta-transfer logic of its
//! own; that all lives in [`engine`].
//!
//! [`run`] is the entry point a binary's `main` calls, mirroring the
//! argument-iterator-plus-output-handles shape used elsewhere in this
//! workspace so tests can drive it without touching real stdio.
//!
//! A destination of the form `host:path` is treated as remote-shaped: this
//! process spawns `ssh host blocksync --server path` and speaks the
//! protocol over that child's stdio. Any other destination is local, and is
//! reached through an in-process [`duplex`] pipe, with the sender and
//! receiver roles running on their own threads. No subprocess, no network.

mod args;
mod duplex;
mod walk;

pub use args::Args;

use clap::Parser;
use globset::{Glob, GlobSet, GlobSetBuilder};
use protocol::FileEntry;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, ExitCode};
use transport::Transport;

/// Everything that can go wrong running a session from the command line.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// An exclude pattern was not a valid glob.
    #[error("invalid --exclude pattern {pattern:?}: {source}")]
    BadExclude {
        /// The offending pattern, verbatim.
        pattern: String,
        /// The underlying parse error.
        #[source]
        source: globset::Error,
    },
    /// `--server` was combined with a `DST` positional, or a non-`--server`
    /// invocation was missing `SRC`.
    #[error("{0}")]
    BadUsage(String),
    /// Directory walking or metadata lookup failed.
    #[error("walking the file tree failed: {0}")]
    Walk(#[from] io::Error),
    /// The sender or receiver protocol role failed.
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}

/// Runs one invocation to completion, writing diagnostics to `stderr` and
/// returning the process exit status.
///
/// Never panics on malformed input; parse and usage failures are reported
/// through `stderr` and surfaced as a non-zero status via [`exit_code_from`].
pub fn run<I, O, E>(args: I, stdout: &mut O, stderr: &mut E) -> i32
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    O: Write,
    E: Write,
{
    let parsed = match Args::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(err) => {
            use clap::error::ErrorKind;
            let status = err.exit_code();
            match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(stdout, "{err}");
                }
                _ => {
                    let _ = write!(stderr, "{err}");
                }
            }
            return status;
        }
    };

    logging::init(parsed.verbose);

    match run_parsed(parsed) {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(stderr, "blocksync: {err}");
            1
        }
    }
}

/// Maps a [`run`] status to a process [`ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> ExitCode {
    u8::try_from(status.clamp(0, i32::from(u8::MAX))).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn run_parsed(args: Args) -> Result<(), CliError> {
    if args.server {
        if args.dst.is_some() {
            return Err(CliError::BadUsage(
                "--server takes a single path, not SRC and DST".into(),
            ));
        }
        let root = args
            .src
            .ok_or_else(|| CliError::BadUsage("--server requires a path".into()))?;
        let excludes = build_excludes(&args.excludes)?;
        return run_server(&root, &excludes, args.recursive, args.checksum, args.delete);
    }

    let src = args
        .src
        .ok_or_else(|| CliError::BadUsage("SRC is required".into()))?;
    let dst = args
        .dst
        .ok_or_else(|| CliError::BadUsage("DST is required".into()))?;

    let excludes = build_excludes(&args.excludes)?;
    let source_entries = walk::walk(&src, args.recursive, &excludes)?;

    if let Some((host, remote_path)) = split_remote(&dst) {
        run_remote(
            &src,
            host,
            remote_path,
            &source_entries,
            args.recursive,
            &args.excludes,
            args.compress,
            args.checksum,
            args.delete,
        )
    } else {
        run_local(
            &src,
            &dst,
            &source_entries,
            args.recursive,
            &excludes,
            args.compress,
            args.checksum,
            args.delete,
        )
    }
}

fn build_excludes(patterns: &[String]) -> Result<GlobSet, CliError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| CliError::BadExclude {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| CliError::BadExclude {
        pattern: patterns.join(","),
        source,
    })
}

/// Splits a `host:path` destination into its remote-shaped parts. A leading
/// single-letter host before `:` on its own (e.g. a Windows drive letter) is
/// not treated as remote; this mirrors rsync's own heuristic closely enough
/// for the shapes this CLI accepts.
fn split_remote(dst: &Path) -> Option<(&str, &str)> {
    let raw = dst.to_str()?;
    let (host, path) = raw.split_once(':')?;
    if host.is_empty() || host.len() == 1 {
        return None;
    }
    Some((host, path))
}

fn run_server(
    root: &Path,
    excludes: &GlobSet,
    recursive: bool,
    checksum: bool,
    delete: bool,
) -> Result<(), CliError> {
    let local_entries = walk::walk(root, recursive, excludes)?;
    let mut transport = Transport::stdio(false);
    engine::run_receiver(&mut transport, root, &local_entries, checksum, delete)?;
    Ok(())
}

fn run_remote(
    src: &Path,
    host: &str,
    remote_path: &str,
    source_entries: &[FileEntry],
    recursive: bool,
    excludes: &[String],
    compress: bool,
    checksum: bool,
    delete: bool,
) -> Result<(), CliError> {
    let mut command = Command::new("ssh");
    command.arg(host).arg("blocksync").arg("--server");
    if recursive {
        command.arg("--recursive");
    }
    if checksum {
        command.arg("--checksum");
    }
    if delete {
        command.arg("--delete");
    }
    for pattern in excludes {
        command.arg("--exclude").arg(pattern);
    }
    command.arg(remote_path);
    let (mut transport, mut child) = Transport::spawn(&mut command, compress)?;

    let src = src.to_path_buf();
    let entries = source_entries.to_vec();
    engine::run_sender(&mut transport, &src, &entries, delete)?;

    let _ = child.wait();
    Ok(())
}

fn run_local(
    src: &Path,
    dst: &Path,
    source_entries: &[FileEntry],
    recursive: bool,
    excludes: &GlobSet,
    compress: bool,
    checksum: bool,
    delete: bool,
) -> Result<(), CliError> {
    std::fs::create_dir_all(dst)?;
    let dest_entries = walk::walk(dst, recursive, excludes)?;

    let (sender_side, receiver_side) = duplex::pair();
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    let entries = source_entries.to_vec();

    let sender_thread = std::thread::spawn(move || {
        let (input, output) = split(sender_side);
        let mut transport = Transport::new(input, output, compress);
        engine::run_sender(&mut transport, &src, &entries, delete)
    });

    let (input, output) = split(receiver_side);
    let mut transport = Transport::new(input, output, compress);
    let receiver_result = engine::run_receiver(&mut transport, &dst, &dest_entries, checksum, delete);

    let sender_result = sender_thread
        .join()
        .unwrap_or_else(|_| panic!("sender thread panicked"));

    sender_result?;
    receiver_result?;
    Ok(())
}

/// Splits a [`duplex::DuplexPipe`] into a read half and a write half so each
/// can be moved into a [`Transport`] independently (`Transport` wants
/// separate `R`/`W` type parameters, not one handle implementing both).
fn split(pipe: duplex::DuplexPipe) -> (impl Read, impl Write) {
    let shared = std::sync::Arc::new(std::sync::Mutex::new(pipe));
    (SharedRead(shared.clone()), SharedWrite(shared))
}

struct SharedRead(std::sync::Arc<std::sync::Mutex<duplex::DuplexPipe>>);
struct SharedWrite(std::sync::Arc<std::sync::Mutex<duplex::DuplexPipe>>);

impl Read for SharedRead {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().unwrap().read(buf)
    }
}

impl Write for SharedWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_flag_reports_success() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["blocksync", "--version"], &mut stdout, &mut stderr);
        assert_eq!(status, 0);
        assert!(!stdout.is_empty(), "version output should not be empty");
        assert!(stderr.is_empty(), "version flag should not write to stderr");
    }

    #[test]
    fn missing_destination_is_a_usage_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["blocksync", "src-only"], &mut stdout, &mut stderr);
        assert_ne!(status, 0);
    }

    #[test]
    fn split_remote_recognizes_host_colon_path() {
        assert_eq!(split_remote(Path::new("example.com:/data")), Some(("example.com", "/data")));
    }

    #[test]
    fn split_remote_treats_drive_letters_as_local() {
        assert_eq!(split_remote(Path::new("C:/data")), None);
    }

    #[test]
    fn split_remote_treats_plain_paths_as_local() {
        assert_eq!(split_remote(Path::new("/data/dst")), None);
    }

    #[test]
    fn local_sync_copies_a_new_file_end_to_end() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::write(src_dir.path().join("hello.txt"), b"hello, world").unwrap();

        let excludes = build_excludes(&[]).unwrap();
        let entries = walk::walk(src_dir.path(), true, &excludes).unwrap();
        run_local(src_dir.path(), dst_dir.path(), &entries, true, &excludes, false, false, false).unwrap();

        let copied = std::fs::read(dst_dir.path().join("hello.txt")).unwrap();
        assert_eq!(copied, b"hello, world");
    }

    #[test]
    fn local_sync_with_delete_removes_stale_destination_files() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::write(src_dir.path().join("keep.txt"), b"keep").unwrap();
        std::fs::write(dst_dir.path().join("stale.txt"), b"stale").unwrap();

        let excludes = build_excludes(&[]).unwrap();
        let entries = walk::walk(src_dir.path(), true, &excludes).unwrap();
        run_local(src_dir.path(), dst_dir.path(), &entries, true, &excludes, false, false, true).unwrap();

        assert!(dst_dir.path().join("keep.txt").exists());
        assert!(!dst_dir.path().join("stale.txt").exists());
    }

    #[test]
    fn local_sync_with_delete_and_no_stale_files_completes() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::write(src_dir.path().join("keep.txt"), b"keep").unwrap();

        let excludes = build_excludes(&[]).unwrap();
        let entries = walk::walk(src_dir.path(), true, &excludes).unwrap();
        run_local(src_dir.path(), dst_dir.path(), &entries, true, &excludes, false, false, true).unwrap();

        assert!(dst_dir.path().join("keep.txt").exists());
    }
}

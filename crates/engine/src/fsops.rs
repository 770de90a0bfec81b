//! Filesystem collaborators the protocol roles need: memory-mapped reads of
//! basis and source files, atomic whole-file writes, directory/symlink
//! application, metadata restoration, and deletion-phase path ordering.
//!
//! None of this is part of the wire protocol itself, but a role that
//! cannot actually touch disk isn't a complete implementation, so it lives
//! alongside the roles rather than being pushed entirely onto the `cli`
//! crate.

use filetime::FileTime;
use memmap2::Mmap;
use protocol::FileEntry;
use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::Path;

/// A file's contents, memory-mapped read-only when non-empty.
///
/// `memmap2` refuses to map a zero-length file, so empty files are
/// represented directly rather than mapped; either way the data is exposed
/// as a plain `&[u8]` via `Deref`.
pub enum MappedFile {
    /// A non-empty file, mapped read-only. Unmapped when this value drops.
    Mapped(Mmap),
    /// A zero-length file (or a basis that does not exist).
    Empty,
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(m) => &m[..],
            Self::Empty => &[],
        }
    }
}

/// Memory-maps `path` read-only for hashing or patch extraction.
///
/// Returns [`MappedFile::Empty`] for a zero-length file rather than
/// attempting (and failing) to map it.
pub fn map_file(path: &Path) -> io::Result<MappedFile> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(MappedFile::Empty);
    }
    // SAFETY: the mapped region is only ever read; concurrent external
    // writers racing this map is a pre-existing hazard of mmap-based I/O
    // that every caller in this codebase accepts for basis/source files.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(MappedFile::Mapped(mmap))
}

/// Writes `data` to `path` via a temporary file in the same directory,
/// renamed into place only on success (never leave a
/// partially written destination file visible at a permanent path).
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    io::Write::write_all(&mut tmp, data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Applies a directory or symlink descriptor at `path` (symlink/directory
/// semantics): a directory is created if absent; a symlink replaces any
/// existing entry at the target path and points at `link_target` verbatim,
/// unresolved.
pub fn apply_descriptor(path: &Path, entry: &FileEntry) -> io::Result<()> {
    if entry.is_dir {
        fs::create_dir_all(path)?;
        return Ok(());
    }
    if entry.is_link {
        if path.symlink_metadata().is_ok() {
            if path.is_dir() && !path.is_symlink() {
                fs::remove_dir_all(path)?;
            } else {
                fs::remove_file(path)?;
            }
        } else if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        symlink(&entry.link_target, path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    // Best-effort: this workspace does not distinguish file vs. directory
    // symlinks on the wire, so a file-type link is assumed on Windows.
    std::os::windows::fs::symlink_file(target, link)
}

/// Restores the mtime (and, on Unix, the permission bits) a descriptor
/// names, after the file's content has been written.
pub fn apply_metadata(path: &Path, entry: &FileEntry) -> io::Result<()> {
    let secs = entry.mtime.trunc() as i64;
    let nanos = ((entry.mtime.fract()).max(0.0) * 1_000_000_000.0) as u32;
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, nanos))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if entry.mode != 0 {
            let perms = fs::Permissions::from_mode(entry.mode & 0o7777);
            fs::set_permissions(path, perms)?;
        }
    }
    Ok(())
}

/// Sorts deletion-phase paths in reverse lexicographic order, the ordering
/// the receiver applies before removing them: for a
/// well-formed tree this guarantees a directory is empty by the time its
/// own entry is reached.
pub fn sort_for_deletion(paths: &mut [String]) {
    paths.sort_by(|a, b| b.cmp(a));
}

/// Removes a single deletion-phase path: a directory (which must be empty)
/// via `remove_dir`, anything else (file or symlink) via `remove_file`.
pub fn delete_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

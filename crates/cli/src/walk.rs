//! Directory walking: turns a root path on disk into the [`FileEntry`] list
//! the engine's sender and receiver roles compare against each other.

use globset::GlobSet;
use protocol::FileEntry;
use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Walks `root`, producing one [`FileEntry`] per path found relative to it.
///
/// `root` itself is not included. When `recursive` is false, only `root`'s
/// immediate children are visited (directories among them are still recorded,
/// just not descended into). `excludes` is matched against each entry's
/// relative, forward-slashed path; a match skips the entry and, for
/// directories, everything beneath it.
pub fn walk(root: &Path, recursive: bool, excludes: &GlobSet) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    if root.is_dir() {
        walk_dir(root, Path::new(""), recursive, excludes, &mut entries)?;
    } else {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !excludes.is_match(&name) {
            entries.push(describe(root, &name)?);
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn walk_dir(
    root: &Path,
    rel: &Path,
    recursive: bool,
    excludes: &GlobSet,
    out: &mut Vec<FileEntry>,
) -> io::Result<()> {
    let dir = root.join(rel);
    for child in fs::read_dir(dir)? {
        let child = child?;
        let rel_path = rel.join(child.file_name());
        let rel_str = to_forward_slash(&rel_path);
        if excludes.is_match(&rel_str) {
            continue;
        }
        let full = root.join(&rel_path);
        let entry = describe(&full, &rel_str)?;
        let is_dir = entry.is_dir;
        out.push(entry);
        if is_dir && recursive {
            walk_dir(root, &rel_path, recursive, excludes, out)?;
        }
    }
    Ok(())
}

fn describe(path: &Path, rel: &str) -> io::Result<FileEntry> {
    let meta = fs::symlink_metadata(path)?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs_f64());

    #[cfg(unix)]
    let mode = std::os::unix::fs::PermissionsExt::mode(&meta.permissions());
    #[cfg(not(unix))]
    let mode: u32 = if meta.permissions().readonly() { 0o444 } else { 0o644 };

    if meta.file_type().is_symlink() {
        let target = fs::read_link(path)?;
        return Ok(FileEntry::symlink(rel, to_forward_slash(&target), mtime));
    }
    if meta.is_dir() {
        return Ok(FileEntry::directory(rel, mtime, mode));
    }
    Ok(FileEntry::file(rel, meta.len(), mtime, mode))
}

fn to_forward_slash(path: &Path) -> String {
    let mut out = String::new();
    for (i, component) in path.components().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

//! The per-file sync decision predicate.
//!
//! This predicate is the one piece of business logic this crate treats as
//! an "external collaborator" interface rather than core algorithm, but a
//! complete, runnable engine still needs exactly one implementation of it to
//! drive the receiver's `NEED` computation, so it lives here rather than
//! being left to the caller to reinvent per binary.

use protocol::FileEntry;

/// What the receiver should do about one path, given the sender's and (if
/// any) the receiver's own descriptor for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The receiver's copy is already current; do nothing.
    Skip,
    /// Transfer the whole item (no usable basis, or a directory/symlink).
    Data,
    /// Run the signature/delta/patch exchange against the receiver's basis.
    Delta,
}

/// Decides what the receiver should do about `source` (the sender's
/// descriptor for a path), given `dest` (the receiver's own descriptor for
/// the same path, if it has one) and whether checksum mode is enabled.
///
/// The decision table:
///
/// 1. no destination -> `Data`
/// 2. directory vs directory -> `Skip`; directory vs anything else -> `Data`
/// 3. symlink matching in target -> `Skip`; symlink mismatch -> `Data`
/// 4. size mismatch -> `Data`
/// 5. checksum mode set -> `Delta`
/// 6. source mtime <= destination mtime -> `Skip`
/// 7. otherwise -> `Delta`
#[must_use]
pub fn decide(source: &FileEntry, dest: Option<&FileEntry>, checksum_mode: bool) -> Decision {
    let Some(dest) = dest else {
        return Decision::Data;
    };

    if source.is_dir && dest.is_dir {
        return Decision::Skip;
    }
    if source.is_dir || dest.is_dir {
        return Decision::Data;
    }

    if source.is_link {
        return if dest.is_link && dest.link_target == source.link_target {
            Decision::Skip
        } else {
            Decision::Data
        };
    }

    if source.size != dest.size {
        return Decision::Data;
    }
    if checksum_mode {
        return Decision::Delta;
    }
    if source.mtime <= dest.mtime {
        return Decision::Skip;
    }
    Decision::Delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: u64, mtime: f64) -> FileEntry {
        FileEntry::file(path, size, mtime, 0o644)
    }

    #[test]
    fn no_destination_is_data() {
        let src = file("a", 10, 1.0);
        assert_eq!(decide(&src, None, false), Decision::Data);
    }

    #[test]
    fn matching_directories_skip() {
        let src = FileEntry::directory("d", 1.0, 0o755);
        let dst = FileEntry::directory("d", 2.0, 0o755);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Skip);
    }

    #[test]
    fn directory_vs_file_is_data() {
        let src = FileEntry::directory("d", 1.0, 0o755);
        let dst = file("d", 10, 1.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Data);
        assert_eq!(decide(&dst, Some(&src), false), Decision::Data);
    }

    #[test]
    fn matching_symlinks_skip() {
        let src = FileEntry::symlink("l", "target", 1.0);
        let dst = FileEntry::symlink("l", "target", 5.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Skip);
    }

    #[test]
    fn mismatched_symlink_target_is_data() {
        let src = FileEntry::symlink("l", "target-a", 1.0);
        let dst = FileEntry::symlink("l", "target-b", 1.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Data);
    }

    #[test]
    fn size_mismatch_is_data() {
        let src = file("a", 10, 1.0);
        let dst = file("a", 20, 1.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Data);
    }

    #[test]
    fn checksum_mode_forces_delta_even_with_older_source_mtime() {
        let src = file("a", 10, 1.0);
        let dst = file("a", 10, 99.0);
        assert_eq!(decide(&src, Some(&dst), true), Decision::Delta);
    }

    #[test]
    fn unchanged_mtime_skips() {
        let src = file("a", 10, 5.0);
        let dst = file("a", 10, 5.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Skip);
    }

    #[test]
    fn older_source_mtime_skips() {
        let src = file("a", 10, 3.0);
        let dst = file("a", 10, 5.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Skip);
    }

    #[test]
    fn newer_source_mtime_is_delta() {
        let src = file("a", 10, 6.0);
        let dst = file("a", 10, 5.0);
        assert_eq!(decide(&src, Some(&dst), false), Decision::Delta);
    }
}

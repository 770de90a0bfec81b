//! The receiver role: echoes `HELLO`, computes `NEED` from a comparison of
//! the sender's `FILES` list against the local tree, then drives the
//! signature/delta, data, and deletion phases in `NEED`'s own order.

use crate::decision::{decide, Decision};
use crate::error::EngineError;
use crate::fsops;
use crate::SessionStats;
use protocol::descriptor::DataPayload;
use protocol::{descriptor, version, wire, FileEntry, MessageTag, NeedSet};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;
use transport::Transport;

/// Runs the receiver side of one session to completion.
///
/// `local_entries` is the already-walked descriptor list for the receiver's
/// own copy of `root`, used both to decide each path's [`Decision`] and
/// (with `delete` set) to find paths the sender no longer has.
pub fn run_receiver<R: Read, W: Write>(
    transport: &mut Transport<R, W>,
    root: &Path,
    local_entries: &[FileEntry],
    checksum_mode: bool,
    delete: bool,
) -> Result<SessionStats, EngineError> {
    let hello = expect(transport, MessageTag::Hello)?;
    version::decode_hello(&hello)?;
    transport.send(MessageTag::Hello, &version::encode_hello())?;

    let files_payload = expect(transport, MessageTag::Files)?;
    let sender_entries = descriptor::decode_files(&files_payload)?;

    let local_by_path: HashMap<&str, &FileEntry> =
        local_entries.iter().map(|e| (e.path.as_str(), e)).collect();
    let sender_paths: HashSet<&str> = sender_entries.iter().map(|e| e.path.as_str()).collect();

    let mut need = NeedSet::default();
    for entry in &sender_entries {
        let dest = local_by_path.get(entry.path.as_str()).copied();
        let mut decision = decide(entry, dest, checksum_mode);
        // Invariant: files below the minimum block
        // threshold always take the whole-file path, even if the decision
        // table above would otherwise call for a delta.
        if decision == Decision::Delta && signature::block_size(entry.size) == 0 {
            decision = Decision::Data;
        }
        match decision {
            Decision::Skip => {}
            Decision::Data => need.data.push(entry.path.clone()),
            Decision::Delta => need.delta.push(entry.path.clone()),
        }
    }
    if delete {
        for local in local_entries {
            if !sender_paths.contains(local.path.as_str()) {
                need.delete.push(local.path.clone());
            }
        }
    }

    transport.send(MessageTag::Need, &descriptor::encode_need(&need)?)?;

    let sender_by_path: HashMap<&str, &FileEntry> =
        sender_entries.iter().map(|e| (e.path.as_str(), e)).collect();

    for path in &need.delta {
        let full = root.join(path);
        let basis = fsops::map_file(&full)?;
        let mut block_size = signature::block_size(basis.len() as u64);
        if block_size == 0 {
            block_size = signature::MISSING_BASIS_BLOCK_SIZE;
        }
        let sigs = signature::signatures(&basis, block_size);
        transport.send(MessageTag::Sigs, &wire::encode_signatures(block_size, &sigs))?;

        let delta_payload = expect(transport, MessageTag::Delta)?;
        let instructions = wire::decode_delta(&delta_payload)?;
        let patched = matching::patch(&basis, &instructions, block_size)?;
        drop(basis);

        fsops::write_atomic(&full, &patched)?;
        if let Some(entry) = sender_by_path.get(path.as_str()) {
            fsops::apply_metadata(&full, entry)?;
        }
        tracing::debug!(%path, "file patched");
    }

    for path in &need.data {
        let payload = expect(transport, MessageTag::Data)?;
        let full = root.join(path);
        match descriptor::decode_data(&payload) {
            DataPayload::Bytes(bytes) => {
                fsops::write_atomic(&full, &bytes)?;
                if let Some(entry) = sender_by_path.get(path.as_str()) {
                    fsops::apply_metadata(&full, entry)?;
                }
            }
            DataPayload::Descriptor(entry) => {
                fsops::apply_descriptor(&full, &entry)?;
            }
        }
        tracing::debug!(%path, "data applied");
    }

    if delete {
        let del_payload = expect(transport, MessageTag::Del)?;
        let mut to_delete = descriptor::decode_delete_list(&del_payload)?;
        fsops::sort_for_deletion(&mut to_delete);
        for path in &to_delete {
            fsops::delete_path(&root.join(path))?;
            tracing::debug!(%path, "deleted");
        }
    }

    expect(transport, MessageTag::Done)?;
    transport.send(MessageTag::Done, &[])?;

    tracing::info!(
        sent = transport.bytes_sent(),
        received = transport.bytes_received(),
        "receiver session complete"
    );
    Ok(SessionStats {
        bytes_sent: transport.bytes_sent(),
        bytes_received: transport.bytes_received(),
    })
}

fn expect<R: Read, W: Write>(
    transport: &mut Transport<R, W>,
    expected: MessageTag,
) -> Result<Vec<u8>, EngineError> {
    let (tag, payload) = transport.recv()?;
    if tag != expected {
        return Err(EngineError::UnexpectedTag { expected, got: tag });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn builds_need_from_descriptor_diff() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("unchanged"), b"same").unwrap();
        std::fs::write(dir.path().join("stale"), b"old!!").unwrap();

        let local_entries = vec![
            FileEntry::file("unchanged", 4, 10.0, 0o644),
            FileEntry::file("stale", 5, 1.0, 0o644),
            FileEntry::file("only-local", 3, 1.0, 0o644),
        ];
        let sender_entries = vec![
            FileEntry::file("unchanged", 4, 10.0, 0o644),
            FileEntry::file("stale", 5, 5.0, 0o644),
            FileEntry::file("new-remote", 2, 1.0, 0o644),
        ];

        let codec = compress::Codec::default();
        let mut wire_in = Vec::new();
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Hello,
            &version::encode_hello(),
            false,
            &codec,
        ));
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Files,
            &descriptor::encode_files(&sender_entries).unwrap(),
            false,
            &codec,
        ));
        // Nothing follows FILES in the fixture; the receiver is expected to
        // fail once it tries to read SIGS for "stale" -- this test only
        // inspects the NEED it emitted before that happens.
        let mut wire_out = Vec::new();
        let mut transport = Transport::new(Cursor::new(wire_in), &mut wire_out, false);
        let err = run_receiver(&mut transport, dir.path(), &local_entries, false, true).unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));

        let mut replay = Transport::new(Cursor::new(wire_out), Vec::new(), false);
        let (tag, _) = replay.recv().unwrap();
        assert_eq!(tag, MessageTag::Hello);
        let (tag, need_payload) = replay.recv().unwrap();
        assert_eq!(tag, MessageTag::Need);
        let need = descriptor::decode_need(&need_payload).unwrap();

        assert_eq!(need.delta, vec!["stale".to_string()]);
        assert_eq!(need.data, vec!["new-remote".to_string()]);
        assert_eq!(need.delete, vec!["only-local".to_string()]);
    }
}

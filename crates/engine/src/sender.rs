//! The sender role: drives `HELLO`, `FILES`, then answers the receiver's
//! `NEED` with the signature/delta exchange and whole-item transfers, in
//! the order `NEED` names them.

use crate::error::EngineError;
use crate::fsops;
use crate::SessionStats;
use protocol::{descriptor, version, wire, FileEntry, MessageTag};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use transport::Transport;

/// Runs the sender side of one session to completion.
///
/// `entries` is the full, already-walked descriptor list for `root` (the
/// directory walk itself is the caller's job).
pub fn run_sender<R: Read, W: Write>(
    transport: &mut Transport<R, W>,
    root: &Path,
    entries: &[FileEntry],
    delete: bool,
) -> Result<SessionStats, EngineError> {
    transport.send(MessageTag::Hello, &version::encode_hello())?;
    let hello = expect(transport, MessageTag::Hello)?;
    version::decode_hello(&hello)?;

    transport.send(MessageTag::Files, &descriptor::encode_files(entries)?)?;
    let need_payload = expect(transport, MessageTag::Need)?;
    let need = descriptor::decode_need(&need_payload)?;

    let by_path: HashMap<&str, &FileEntry> =
        entries.iter().map(|e| (e.path.as_str(), e)).collect();

    for path in &need.delta {
        let sigs_payload = expect(transport, MessageTag::Sigs)?;
        let (block_size, sigs) = wire::decode_signatures(&sigs_payload)?;

        let source = fsops::map_file(&root.join(path))?;
        let instructions = matching::delta(&source, &sigs, block_size);
        transport.send(MessageTag::Delta, &wire::encode_delta(&instructions))?;
        tracing::debug!(%path, instructions = instructions.len(), "delta computed");
    }

    for path in &need.data {
        let entry = by_path
            .get(path.as_str())
            .ok_or_else(|| EngineError::UnknownPath(path.clone()))?;
        if entry.is_dir || entry.is_link {
            transport.send(MessageTag::Data, &descriptor::encode_data_descriptor(entry)?)?;
        } else {
            let bytes = fsops::map_file(&root.join(path))?;
            transport.send(MessageTag::Data, &bytes)?;
        }
    }

    if delete {
        transport.send(MessageTag::Del, &descriptor::encode_delete_list(&need.delete)?)?;
    }

    transport.send(MessageTag::Done, &[])?;
    expect(transport, MessageTag::Done)?;

    tracing::info!(
        sent = transport.bytes_sent(),
        received = transport.bytes_received(),
        "sender session complete"
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
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn unknown_need_data_path_is_an_error() {
        let dir = tempdir().unwrap();
        let entries = vec![FileEntry::file("known", 1, 0.0, 0o644)];

        // Build a transport whose HELLO/FILES/NEED leg is satisfied inline
        // by pre-seeding the read side with exactly the bytes the sender
        // expects to receive back.
        let mut wire_in = Vec::new();
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Hello,
            &version::encode_hello(),
            false,
            &compress::Codec::default(),
        ));
        let need = protocol::NeedSet {
            delta: vec![],
            data: vec!["missing".to_string()],
            delete: vec![],
        };
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Need,
            &descriptor::encode_need(&need).unwrap(),
            false,
            &compress::Codec::default(),
        ));

        let mut transport = Transport::new(Cursor::new(wire_in), Vec::new(), false);
        let err = run_sender(&mut transport, dir.path(), &entries, false).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPath(p) if p == "missing"));
    }

    #[test]
    fn sends_del_message_when_delete_enabled_even_with_nothing_to_delete() {
        let dir = tempdir().unwrap();
        let codec = compress::Codec::default();

        let mut wire_in = Vec::new();
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Hello,
            &version::encode_hello(),
            false,
            &codec,
        ));
        let need = protocol::NeedSet::default();
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Need,
            &descriptor::encode_need(&need).unwrap(),
            false,
            &codec,
        ));
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Done,
            &[],
            false,
            &codec,
        ));

        let mut wire_out = Vec::new();
        let mut transport = Transport::new(Cursor::new(wire_in), &mut wire_out, false);
        run_sender(&mut transport, dir.path(), &[], true).unwrap();

        let mut replay = Transport::new(Cursor::new(wire_out), Vec::new(), false);
        let (tag, _) = replay.recv().unwrap(); // HELLO
        assert_eq!(tag, MessageTag::Hello);
        let (tag, _) = replay.recv().unwrap(); // FILES
        assert_eq!(tag, MessageTag::Files);
        let (tag, payload) = replay.recv().unwrap(); // DEL, even though empty
        assert_eq!(tag, MessageTag::Del);
        assert_eq!(descriptor::decode_delete_list(&payload).unwrap(), Vec::<String>::new());
        let (tag, _) = replay.recv().unwrap(); // DONE
        assert_eq!(tag, MessageTag::Done);
    }

    #[test]
    fn version_mismatch_on_hello_aborts_session() {
        let dir = tempdir().unwrap();
        let mut wire_in = Vec::new();
        wire_in.extend(protocol::envelope::encode_message(
            MessageTag::Hello,
            &99u32.to_be_bytes(),
            false,
            &compress::Codec::default(),
        ));
        let mut transport = Transport::new(Cursor::new(wire_in), Vec::new(), false);
        let err = run_sender(&mut transport, dir.path(), &[], false).unwrap_err();
        assert!(matches!(err, EngineError::Version(_)));
        let _ = fs::metadata(dir.path());
    }
}

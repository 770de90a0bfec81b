//! JSON-encoded message bodies: file descriptor records, the `NEED` set, and
//! the `DATA`-payload disambiguation between raw bytes and a
//! directory/symlink descriptor.
//!
//! These three shapes all ride inside a framed message's payload (see
//! [`crate::envelope`]) as plain UTF-8 JSON, unlike the binary signature
//! list and delta stream encodings in [`crate::wire`].

use serde::{Deserialize, Serialize};

/// A file descriptor record, as built by the directory walker and exchanged
/// in the `FILES` message and (for directories and symlinks) embedded in a
/// `DATA` message.
///
/// Treated as opaque by the core beyond the fields listed here: callers are
/// free to attach additional metadata of their own before walking, but only
/// these fields cross the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the tree root, forward-slashed regardless of
    /// platform.
    pub path: String,
    /// File size in bytes. Meaningless for directories.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: f64,
    /// Platform file-mode bits.
    pub mode: u32,
    /// Whether this entry is a directory.
    pub is_dir: bool,
    /// Whether this entry is a symbolic link.
    pub is_link: bool,
    /// Symlink target, verbatim and unresolved. Empty unless `is_link`.
    #[serde(default)]
    pub link_target: String,
}

impl FileEntry {
    /// Builds a descriptor for a regular file.
    #[must_use]
    pub fn file(path: impl Into<String>, size: u64, mtime: f64, mode: u32) -> Self {
        Self {
            path: path.into(),
            size,
            mtime,
            mode,
            is_dir: false,
            is_link: false,
            link_target: String::new(),
        }
    }

    /// Builds a descriptor for a directory.
    #[must_use]
    pub fn directory(path: impl Into<String>, mtime: f64, mode: u32) -> Self {
        Self {
            path: path.into(),
            size: 0,
            mtime,
            mode,
            is_dir: true,
            is_link: false,
            link_target: String::new(),
        }
    }

    /// Builds a descriptor for a symbolic link.
    #[must_use]
    pub fn symlink(path: impl Into<String>, link_target: impl Into<String>, mtime: f64) -> Self {
        Self {
            path: path.into(),
            size: 0,
            mtime,
            mode: 0,
            is_dir: false,
            is_link: true,
            link_target: link_target.into(),
        }
    }
}

/// The receiver's response to `FILES`: the three path sets that drive the
/// rest of the session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedSet {
    /// Paths the receiver already has a basis for; sender should run the
    /// signature/delta exchange for each, in this order.
    #[serde(default)]
    pub delta: Vec<String>,
    /// Paths the receiver wants transmitted whole (no basis, or a
    /// directory/symlink), in this order.
    #[serde(default)]
    pub data: Vec<String>,
    /// Paths present on the receiver but not the sender, to be deleted (only
    /// populated when the session has `--delete` enabled).
    #[serde(default)]
    pub delete: Vec<String>,
}

/// Errors produced while encoding or decoding a JSON message body.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// `serde_json` failed to serialize or deserialize the payload.
    #[error("malformed JSON message body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes a `FILES` payload: a JSON array of [`FileEntry`] records.
pub fn encode_files(entries: &[FileEntry]) -> Result<Vec<u8>, DescriptorError> {
    Ok(serde_json::to_vec(entries)?)
}

/// Decodes a `FILES` payload.
pub fn decode_files(payload: &[u8]) -> Result<Vec<FileEntry>, DescriptorError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encodes a `NEED` payload.
pub fn encode_need(need: &NeedSet) -> Result<Vec<u8>, DescriptorError> {
    Ok(serde_json::to_vec(need)?)
}

/// Decodes a `NEED` payload.
pub fn decode_need(payload: &[u8]) -> Result<NeedSet, DescriptorError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encodes a `DEL` payload: a JSON array of paths, sender order.
pub fn encode_delete_list(paths: &[String]) -> Result<Vec<u8>, DescriptorError> {
    Ok(serde_json::to_vec(paths)?)
}

/// Decodes a `DEL` payload.
pub fn decode_delete_list(payload: &[u8]) -> Result<Vec<String>, DescriptorError> {
    Ok(serde_json::from_slice(payload)?)
}

/// A decoded `DATA` message body: either bulk file bytes, or a descriptor
/// instructing the receiver to create a directory or symlink.
///
/// See the module docs for the ambiguity this overload
/// introduces: a file whose contents happen to parse as a [`FileEntry`]
/// would be misread as a descriptor. This crate preserves that behavior
/// rather than silently fixing it, per the design notes.
#[derive(Clone, Debug, PartialEq)]
pub enum DataPayload {
    /// Raw file bytes to write at the target path.
    Bytes(Vec<u8>),
    /// A directory or symlink to create at the target path.
    Descriptor(FileEntry),
}

/// Encodes a `DATA` payload carrying bulk file bytes.
#[must_use]
pub fn encode_data_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.to_vec()
}

/// Encodes a `DATA` payload carrying a directory/symlink descriptor.
pub fn encode_data_descriptor(entry: &FileEntry) -> Result<Vec<u8>, DescriptorError> {
    Ok(serde_json::to_vec(entry)?)
}

/// Disambiguates a `DATA` payload: attempts to parse it as UTF-8 JSON
/// matching [`FileEntry`]; on failure, treats it as raw bytes.
#[must_use]
pub fn decode_data(payload: &[u8]) -> DataPayload {
    if let Ok(text) = std::str::from_utf8(payload) {
        if let Ok(entry) = serde_json::from_str::<FileEntry>(text) {
            return DataPayload::Descriptor(entry);
        }
    }
    DataPayload::Bytes(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_entry_round_trips_through_json() {
        let entry = FileEntry::file("a/b.txt", 42, 123.5, 0o644);
        let encoded = encode_files(std::slice::from_ref(&entry)).unwrap();
        let decoded = decode_files(&encoded).unwrap();
        assert_eq!(decoded, vec![entry]);
    }

    #[test]
    fn need_set_round_trips() {
        let need = NeedSet {
            delta: vec!["a".into()],
            data: vec!["b".into(), "c".into()],
            delete: vec!["d".into()],
        };
        let encoded = encode_need(&need).unwrap();
        assert_eq!(decode_need(&encoded).unwrap(), need);
    }

    #[test]
    fn need_set_defaults_missing_fields_to_empty() {
        let need = decode_need(b"{}").unwrap();
        assert!(need.delta.is_empty());
        assert!(need.data.is_empty());
        assert!(need.delete.is_empty());
    }

    #[test]
    fn delete_list_round_trips() {
        let paths = vec!["z/y".to_string(), "a".to_string()];
        let encoded = encode_delete_list(&paths).unwrap();
        assert_eq!(decode_delete_list(&encoded).unwrap(), paths);
    }

    #[test]
    fn data_payload_parses_raw_bytes_as_bytes() {
        let payload = b"\x00\x01\xff binary junk";
        assert_eq!(decode_data(payload), DataPayload::Bytes(payload.to_vec()));
    }

    #[test]
    fn data_payload_parses_descriptor_json_as_descriptor() {
        let entry = FileEntry::directory("some/dir", 0.0, 0o755);
        let encoded = encode_data_descriptor(&entry).unwrap();
        assert_eq!(decode_data(&encoded), DataPayload::Descriptor(entry));
    }

    #[test]
    fn data_payload_treats_unrelated_json_as_bytes() {
        let payload = br#"{"hello":"world"}"#;
        assert_eq!(decode_data(payload), DataPayload::Bytes(payload.to_vec()));
    }

    #[test]
    fn symlink_descriptor_carries_link_target() {
        let entry = FileEntry::symlink("link", "target/path", 10.0);
        let encoded = encode_data_descriptor(&entry).unwrap();
        match decode_data(&encoded) {
            DataPayload::Descriptor(e) => assert_eq!(e.link_target, "target/path"),
            DataPayload::Bytes(_) => panic!("expected descriptor"),
        }
    }
}

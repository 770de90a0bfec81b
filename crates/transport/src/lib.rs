#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! A bidirectional framed-message transport over two owned byte handles,
//! with per-direction byte counters and a per-transport "compress outgoing"
//! flag.
//!
//! [`Transport`] is generic over its input and output handle types so the
//! same type serves both realizations this crate supports: direct stdio pipes
//! (for a local subprocess or a test harness) and the stdin/stdout of a
//! spawned remote subprocess booting a peer in server mode. [`Transport::stdio`]
//! and [`Transport::spawn`] build the two respectively.
//!
//! Compression is a per-message property carried in the frame header, not a
//! per-session negotiation: each side decides independently whether to
//! compress what it sends, and the other always decodes based on the flag
//! it reads (see `protocol::envelope`).

use compress::Codec;
use protocol::envelope::{decode_payload, encode_message, EnvelopeError, FrameHeader, HEADER_LEN};
use protocol::MessageTag;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Errors produced while sending or receiving a message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the stream before a new message began. A clean
    /// end-of-stream, not a framing error.
    #[error("end of stream")]
    EndOfStream,
    /// A header or payload was malformed, truncated mid-message, or failed
    /// to decompress.
    #[error("framing error: {0}")]
    Framing(#[from] EnvelopeError),
    /// The underlying handle failed to read or write.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A bidirectional transport owning one input handle and one output handle.
///
/// Every `send` frames and writes a message, flushes, and updates the sent
/// counter; every `recv` reads a complete framed message, decompressing the
/// payload if its flag says so, and updates the received counter. Both
/// counters are readable at any time, including after a failed `send`/`recv`
/// (they only advance past bytes actually transferred).
pub struct Transport<R, W> {
    input: R,
    output: W,
    codec: Codec,
    compress_outgoing: bool,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<R: Read, W: Write> Transport<R, W> {
    /// Builds a transport over the given handles with the default zstd
    /// codec.
    pub fn new(input: R, output: W, compress_outgoing: bool) -> Self {
        Self::with_codec(input, output, compress_outgoing, Codec::default())
    }

    /// Builds a transport with an explicit compression codec (e.g. a
    /// non-default zstd level).
    pub fn with_codec(input: R, output: W, compress_outgoing: bool, codec: Codec) -> Self {
        Self {
            input,
            output,
            codec,
            compress_outgoing,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Frames `payload` under `tag`, compressing it first if this
    /// transport's outgoing-compression flag is set and the payload clears
    /// [`compress::MIN_COMPRESS_LEN`], writes it, and flushes.
    pub fn send(&mut self, tag: MessageTag, payload: &[u8]) -> Result<(), TransportError> {
        let encoded = encode_message(tag, payload, self.compress_outgoing, &self.codec);
        self.output.write_all(&encoded)?;
        self.output.flush()?;
        self.bytes_sent += encoded.len() as u64;
        tracing::debug!(tag = %tag, bytes = encoded.len(), "sent message");
        Ok(())
    }

    /// Reads one complete framed message, decompressing its payload if the
    /// header's flag requires it.
    ///
    /// Returns [`TransportError::EndOfStream`] if the peer closed the stream
    /// cleanly before any bytes of a new header arrived; a mid-header or
    /// mid-payload close is a [`TransportError::Framing`] error instead.
    pub fn recv(&mut self) -> Result<(MessageTag, Vec<u8>), TransportError> {
        let mut header_buf = [0u8; HEADER_LEN];
        let got = read_fully(&mut self.input, &mut header_buf)?;
        if got == 0 {
            return Err(TransportError::EndOfStream);
        }
        if got < HEADER_LEN {
            return Err(EnvelopeError::UnexpectedEof.into());
        }
        let header = FrameHeader::decode(&header_buf)?;

        let mut payload = vec![0u8; header.payload_len() as usize];
        let got = read_fully(&mut self.input, &mut payload)?;
        if got != payload.len() {
            return Err(EnvelopeError::TruncatedPayload {
                expected: header.payload_len(),
                actual: got,
            }
            .into());
        }
        self.bytes_received += (HEADER_LEN + payload.len()) as u64;

        let decoded = decode_payload(&header, &payload, &self.codec)?;
        tracing::debug!(tag = %header.tag(), bytes = decoded.len(), "received message");
        Ok((header.tag(), decoded))
    }

    /// Total bytes written to the output handle so far (framed, i.e.
    /// including headers and any compression).
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes read from the input handle so far.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Whether this transport compresses outgoing payloads that clear the
    /// minimum-size threshold.
    #[must_use]
    pub fn compress_outgoing(&self) -> bool {
        self.compress_outgoing
    }
}

/// Reads into `buf` until it is full or the source reaches end-of-stream,
/// returning the number of bytes actually filled. Unlike `read_exact`, a
/// short read because of a clean EOF is not an error; the caller
/// distinguishes "zero bytes" (clean end-of-stream) from "some but not all"
/// (truncation) itself.
fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl Transport<io::Stdin, io::Stdout> {
    /// Builds a transport directly over this process's stdio, the
    /// realization used when this process *is* the remote peer spawned in
    /// server mode.
    #[must_use]
    pub fn stdio(compress_outgoing: bool) -> Self {
        Self::new(io::stdin(), io::stdout(), compress_outgoing)
    }
}

impl Transport<ChildStdout, ChildStdin> {
    /// Spawns `command` with piped stdin/stdout and wraps them in a
    /// transport, the realization used to reach a remote host through a
    /// subprocess that boots a peer in server mode.
    ///
    /// The handshake script that decides what `command` actually is (local
    /// binary re-invoked with `--server`, or an SSH-wrapped remote
    /// invocation) is external to this crate; this constructor only wires
    /// up the pipes once the caller has built the `Command`.
    ///
    /// Returns the transport and the [`Child`] handle so the caller can
    /// wait-and-reap it after the session ends.
    pub fn spawn(command: &mut Command, compress_outgoing: bool) -> io::Result<(Self, Child)> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        Ok((Self::new(stdout, stdin, compress_outgoing), child))
    }
}

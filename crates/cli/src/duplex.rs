//! An in-process bidirectional pipe, used to run a sender and a receiver
//! against each other on the same machine without spawning a subprocess.
//!
//! The workspace's minimum supported Rust version predates `std::io::pipe`,
//! and nothing in the dependency stack offers a ready-made duplex byte pipe,
//! so this is a small `mpsc`-backed `Read`/`Write` adapter: each direction is
//! a channel of byte chunks, with a leftover buffer on the read side for
//! chunks only partially consumed by one `read` call.

use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, Sender};

/// One end of an in-process duplex pipe.
pub struct DuplexPipe {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl Read for DuplexPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.pending = chunk,
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl Write for DuplexPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "duplex peer dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds a pair of [`DuplexPipe`]s wired to each other: writes on one side
/// arrive as reads on the other, in both directions.
#[must_use]
pub fn pair() -> (DuplexPipe, DuplexPipe) {
    let (tx_a, rx_a) = std::sync::mpsc::channel();
    let (tx_b, rx_b) = std::sync::mpsc::channel();
    (
        DuplexPipe { tx: tx_a, rx: rx_b, pending: Vec::new() },
        DuplexPipe { tx: tx_b, rx: rx_a, pending: Vec::new() },
    )
}

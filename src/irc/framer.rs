//! Stream-to-line reassembly.
//!
//! Bytes arrive from a non-blocking socket in arbitrary chunks. [`LineFramer`]
//! buffers them and hands back every complete `\r\n`-terminated line, keeping
//! the unterminated tail for the next read.

use tracing::warn;

const TERMINATOR: &[u8] = b"\r\n";

/// Reassembles CRLF-terminated lines from a byte stream.
///
/// By default the pending fragment may grow without limit when a peer never
/// sends a terminator. [`LineFramer::with_max_len`] bounds it.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
    /// Index of the next byte to check for a terminator
    next_index: usize,
    max_len: Option<usize>,
    /// Set after an oversized fragment was dropped; input is skipped up to
    /// and including the next terminator.
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a framer that drops any line longer than `max_len` bytes. The
    /// rest of a dropped line is skipped when it arrives.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    /// Feed newly received bytes and collect every line they complete.
    ///
    /// Returned lines have the terminator stripped. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        // A CR at the end of the previous chunk may pair with a LF in this one.
        let mut scan = self.next_index.saturating_sub(1);

        if self.discarding {
            match find_terminator(&self.buf, scan) {
                Some(end) => {
                    self.buf.drain(..end + TERMINATOR.len());
                    self.discarding = false;
                    scan = 0;
                }
                None => {
                    let keep = usize::from(self.buf.last() == Some(&b'\r'));
                    let cut = self.buf.len() - keep;
                    self.buf.drain(..cut);
                    self.next_index = self.buf.len();
                    return Vec::new();
                }
            }
        }

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(end) = find_terminator(&self.buf, scan) {
            lines.push(String::from_utf8_lossy(&self.buf[start..end]).into_owned());
            start = end + TERMINATOR.len();
            scan = start;
        }

        self.buf.drain(..start);
        self.next_index = self.buf.len();

        if let Some(max_len) = self.max_len {
            if self.buf.len() > max_len {
                warn!(
                    pending = self.buf.len(),
                    limit = max_len,
                    "discarding unterminated line over length limit"
                );
                self.clear();
                self.discarding = true;
            }
        }

        lines
    }

    /// Bytes currently held as an unterminated fragment.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_index = 0;
        self.discarding = false;
    }
}

/// Offset of the first terminator at or after `from`.
fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map(|offset| from + offset)
}

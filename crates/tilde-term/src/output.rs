// SPDX-License-Identifier: MIT
//
// Frame buffer for terminal output.
//
// Everything one refresh sends (hide cursor, home, each text row, the status
// row, the final cursor move) is appended here first, then written to the
// terminal with a single write_all. Redraws rewrite rows in place with
// erase-to-end-of-line, so the user never sees a blank screen between
// frames.

use std::io::{self, Write};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Bytes of the frame being composed.
///
/// The allocation is kept across frames; `flush_to` empties the buffer but
/// not its capacity.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

/// Roughly one 80x24 screen of text plus escape sequences.
const FRAME_CAPACITY: usize = 4 * 1024;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(FRAME_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The composed bytes, not yet sent.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn push_char(&mut self, ch: char) {
        let mut utf8 = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut utf8));
    }

    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// Append `byte` `count` times; used for padding rows.
    #[inline]
    pub fn push_repeated(&mut self, byte: u8, count: usize) {
        self.bytes.resize(self.bytes.len() + count, byte);
    }

    /// Drop the composed frame without sending it.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Send the frame to `sink` in one `write_all`, then empty the buffer.
    /// An empty buffer sends nothing.
    ///
    /// # Errors
    ///
    /// Any error from `sink`. The frame stays in the buffer on error.
    pub fn flush_to(&mut self, sink: &mut impl Write) -> io::Result<()> {
        if self.bytes.is_empty() {
            return Ok(());
        }
        sink.write_all(&self.bytes)?;
        sink.flush()?;
        self.bytes.clear();
        Ok(())
    }
}

// Lets the `ansi` helpers write straight into a frame.
impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

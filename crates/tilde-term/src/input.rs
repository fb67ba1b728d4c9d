// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns the raw byte stream into logical keys, one key per call:
//
// - Escape sequences for arrows, Home/End, Page Up/Down and Delete, in
//   both the CSI (`ESC [`) and SS3 (`ESC O`) encodings terminals use
// - Control bytes, with Ctrl-Q reserved as the quit key
// - UTF-8 multi-byte characters
//
// # Design
//
// Escape decoding is a lookup table plus a bounded lookahead buffer. After
// an ESC byte the reader pulls follow-up bytes one read tick at a time and
// asks the `EscapeMatcher` whether the bytes so far are a complete table
// entry, a prefix of one, or neither. No byte-by-byte branching, and the
// matcher is a pure value that tests drive directly.
//
// The grace window for a lone ESC is one read tick per follow-up byte:
// terminals deliver a whole sequence in one burst, while a human pressing
// Escape leaves the line quiet.

use crate::error::Result;
use crate::reader::ByteSource;

// ─── Key ────────────────────────────────────────────────────────────────────

/// The escape byte that starts every multi-byte key sequence.
pub const ESC: u8 = 0x1B;

/// The byte a terminal sends for Ctrl + `letter`.
#[inline]
#[must_use]
pub const fn ctrl_key(letter: u8) -> u8 {
    letter & 0x1F
}

/// Ctrl-Q. Always decodes to [`Key::Quit`], whatever the editor mode.
pub const QUIT_KEY: u8 = ctrl_key(b'q');

/// A logical key, produced once per keypress and consumed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character.
    Char(char),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    /// Forward delete (`ESC [ 3 ~`).
    Delete,
    /// The DEL byte (0x7F) most terminals send for the Backspace key.
    Backspace,
    Enter,
    Escape,
    /// Any other byte below 0x20, carried verbatim.
    ControlChar(u8),
    /// The reserved [`QUIT_KEY`].
    Quit,
}

impl Key {
    /// True if this is Ctrl + `letter`.
    #[inline]
    #[must_use]
    pub const fn is_ctrl(self, letter: u8) -> bool {
        matches!(self, Self::ControlChar(c) if c == ctrl_key(letter))
    }
}

/// Decode a single byte that is not part of an escape sequence or a UTF-8
/// multi-byte character.
#[must_use]
pub const fn classify_byte(byte: u8) -> Key {
    match byte {
        QUIT_KEY => Key::Quit,
        b'\r' => Key::Enter,
        0x7F => Key::Backspace,
        ESC => Key::Escape,
        b @ 0x00..=0x1F => Key::ControlChar(b),
        b => Key::Char(b as char),
    }
}

// ─── Escape Sequences ───────────────────────────────────────────────────────

/// Every recognized sequence, without the leading ESC.
const ESCAPE_SEQUENCES: &[(&[u8], Key)] = &[
    (b"[A", Key::ArrowUp),
    (b"[B", Key::ArrowDown),
    (b"[C", Key::ArrowRight),
    (b"[D", Key::ArrowLeft),
    (b"[H", Key::Home),
    (b"[F", Key::End),
    (b"[1~", Key::Home),
    (b"[7~", Key::Home),
    (b"[4~", Key::End),
    (b"[8~", Key::End),
    (b"[3~", Key::Delete),
    (b"[5~", Key::PageUp),
    (b"[6~", Key::PageDown),
    (b"OA", Key::ArrowUp),
    (b"OB", Key::ArrowDown),
    (b"OC", Key::ArrowRight),
    (b"OD", Key::ArrowLeft),
    (b"OH", Key::Home),
    (b"OF", Key::End),
];

/// Longest entry in [`ESCAPE_SEQUENCES`].
pub const MAX_SEQUENCE_LEN: usize = 3;

/// Upper bound on bytes discarded after an unrecognized CSI sequence.
const MAX_CSI_DISCARD: usize = 16;

/// Outcome of matching the bytes seen after ESC against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMatch {
    /// The bytes are exactly one table entry.
    Complete(Key),
    /// The bytes are a proper prefix of at least one entry.
    Partial,
    /// No entry starts with these bytes.
    Unknown,
}

/// Match `seq` (the bytes after ESC) against the escape table.
#[must_use]
pub fn match_escape(seq: &[u8]) -> EscapeMatch {
    if let Some(&(_, key)) = ESCAPE_SEQUENCES.iter().find(|(s, _)| *s == seq) {
        EscapeMatch::Complete(key)
    } else if ESCAPE_SEQUENCES.iter().any(|(s, _)| s.starts_with(seq)) {
        EscapeMatch::Partial
    } else {
        EscapeMatch::Unknown
    }
}

/// Bounded lookahead buffer for the bytes following an ESC.
#[derive(Debug, Clone, Default)]
pub struct EscapeMatcher {
    buf: [u8; MAX_SEQUENCE_LEN],
    len: usize,
}

impl EscapeMatcher {
    /// An empty matcher, as right after the ESC byte.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_SEQUENCE_LEN],
            len: 0,
        }
    }

    /// Append one byte and match the sequence so far.
    pub fn feed(&mut self, byte: u8) -> EscapeMatch {
        if self.len == MAX_SEQUENCE_LEN {
            return EscapeMatch::Unknown;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        match_escape(self.bytes())
    }

    /// The bytes collected so far.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

// ─── KeyReader ──────────────────────────────────────────────────────────────

/// Pulls bytes from a [`ByteSource`] and decodes them into [`Key`]s.
///
/// A byte read as lookahead that turns out to start the next key is kept
/// in `pending` and decoded first on the next call.
pub struct KeyReader<S> {
    source: S,
    pending: Option<u8>,
}

impl<S: ByteSource> KeyReader<S> {
    /// Decode keys from `source`.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            pending: None,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        match self.pending.take() {
            Some(byte) => Ok(Some(byte)),
            None => self.source.read_byte(),
        }
    }

    /// Hand `byte` back so the next key starts with it.
    const fn unread(&mut self, byte: u8) {
        self.pending = Some(byte);
    }

    /// Wait until a key arrives and return it.
    ///
    /// Read ticks with no input are retried; they are polling, not errors.
    ///
    /// # Errors
    ///
    /// Propagates fatal read errors from the source.
    pub fn next_key(&mut self) -> Result<Key> {
        loop {
            if let Some(key) = self.poll_key()? {
                return Ok(key);
            }
        }
    }

    /// Make one timed attempt to read a key.
    ///
    /// Returns `Ok(None)` if the read tick elapsed with no input, or if the
    /// bytes that arrived decode to nothing (an unrecognized escape
    /// sequence, invalid UTF-8).
    ///
    /// # Errors
    ///
    /// Propagates fatal read errors from the source.
    pub fn poll_key(&mut self) -> Result<Option<Key>> {
        let Some(byte) = self.next_byte()? else {
            return Ok(None);
        };

        match byte {
            ESC => self.read_escape(),
            0x80..=0xFF => self.read_utf8(byte),
            b => Ok(Some(classify_byte(b))),
        }
    }

    /// Decode what follows an ESC byte.
    fn read_escape(&mut self) -> Result<Option<Key>> {
        let mut matcher = EscapeMatcher::new();
        loop {
            let Some(byte) = self.next_byte()? else {
                // Nothing followed within the grace window: a real Escape.
                return Ok(Some(Key::Escape));
            };
            if byte == ESC {
                // A new key started before this one completed.
                self.unread(byte);
                return Ok(Some(Key::Escape));
            }
            match matcher.feed(byte) {
                EscapeMatch::Complete(key) => return Ok(Some(key)),
                EscapeMatch::Partial => {}
                EscapeMatch::Unknown => {
                    tracing::trace!(
                        seq = ?matcher.bytes(),
                        "discarding unrecognized escape sequence"
                    );
                    if matcher.bytes() == b"[[" {
                        // Linux console F1-F5: ESC [ [ A..E.
                        self.discard_one()?;
                    } else if matcher.bytes().first() == Some(&b'[') && !is_csi_final(byte) {
                        self.discard_csi_tail()?;
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Drop the rest of an unrecognized CSI sequence (for example the
    /// `;5A` of a Ctrl+Arrow) so its parameters are not typed as text.
    fn discard_csi_tail(&mut self) -> Result<()> {
        for _ in 0..MAX_CSI_DISCARD {
            match self.next_byte()? {
                Some(ESC) => {
                    self.unread(ESC);
                    return Ok(());
                }
                Some(b) if is_csi_final(b) => return Ok(()),
                Some(_) => {}
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Drop one byte, unless it starts a new escape sequence.
    fn discard_one(&mut self) -> Result<()> {
        if let Some(ESC) = self.next_byte()? {
            self.unread(ESC);
        }
        Ok(())
    }

    /// Complete a UTF-8 character from its lead byte.
    fn read_utf8(&mut self, lead: u8) -> Result<Option<Key>> {
        let len = utf8_char_len(lead);
        if len < 2 {
            return Ok(None);
        }

        let mut buf = [lead, 0, 0, 0];
        for slot in &mut buf[1..len] {
            match self.next_byte()? {
                Some(b) if b & 0xC0 == 0x80 => *slot = b,
                Some(b) => {
                    // Not a continuation byte: it begins the next key.
                    self.unread(b);
                    return Ok(None);
                }
                None => return Ok(None),
            }
        }

        Ok(std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char))
    }

    /// The underlying byte source.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// CSI final bytes are in `0x40..=0x7E`.
const fn is_csi_final(byte: u8) -> bool {
    matches!(byte, 0x40..=0x7E)
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for bytes that cannot start a multi-byte character.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

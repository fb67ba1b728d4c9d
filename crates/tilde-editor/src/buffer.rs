//! The document being edited.
//!
//! A [`Document`] wraps a [`ropey::Rope`] and presents it as an ordered,
//! never-empty sequence of lines addressed by [`Position`].
//!
//! # Representation
//!
//! - The rope holds the lines joined by `\n` with **no** trailing
//!   terminator, so `len_lines()` is exactly the line count and an empty
//!   rope is the one-empty-line document. ropey is built without its
//!   Unicode/CR line-break features, so `\n` is the only separator it sees.
//!
//! - Line endings are normalized to `\n` on load. The detected convention
//!   is kept in [`LineEnding`] and applied again by [`Document::serialize`],
//!   so a CRLF file is saved back as CRLF.
//!
//! - Columns are char offsets. Byte offsets never leave this module.
//!
//! - Edits that land on an out-of-range position are clamped first. The
//!   controller keeps the cursor valid, but the document does not rely on
//!   that to stay consistent.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ropey::{Rope, RopeSlice};
use tempfile::NamedTempFile;

use crate::error::{FileError, Result};
use crate::position::Position;

// ---------------------------------------------------------------------------
// Line endings
// ---------------------------------------------------------------------------

/// Line-ending convention of a file.
///
/// Detected from the first terminator on load; `Lf` for new documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineEnding {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// The convention of the first terminator in `text`, or `Lf` if there
    /// is none.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) if bytes[i] == b'\n' => Self::Lf,
            Some(i) if bytes.get(i + 1) == Some(&b'\n') => Self::CrLf,
            Some(_) => Self::Cr,
            None => Self::Lf,
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lf => "LF",
            Self::CrLf => "CRLF",
            Self::Cr => "CR",
        })
    }
}

/// Rewrite every `\r\n` and lone `\r` in `text` as `\n`.
fn normalize_to_lf(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An ordered, never-empty sequence of lines plus file metadata.
pub struct Document {
    rope: Rope,
    path: Option<PathBuf>,
    modified: bool,
    line_ending: LineEnding,
    /// Set when the file was not valid UTF-8 and was decoded lossily.
    lossy: bool,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// A document with one empty line and no file name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            path: None,
            modified: false,
            line_ending: LineEnding::Lf,
            lossy: false,
        }
    }

    /// A document holding `text`, parsed as by
    /// [`load_from_text`](Self::load_from_text).
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        doc.load_from_text(text);
        doc
    }

    /// Open `path`.
    ///
    /// A file that does not exist yields an empty document bound to `path`,
    /// created on the first save. Invalid UTF-8 is replaced with U+FFFD and
    /// flagged (see [`was_lossy`](Self::was_lossy)).
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Load`] if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "new file");
                let mut doc = Self::new();
                doc.path = Some(path.to_path_buf());
                return Ok(doc);
            }
            Err(source) => {
                return Err(FileError::Load {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let (text, lossy) = match String::from_utf8(bytes) {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!(path = %path.display(), "file is not valid UTF-8, decoding lossily");
                (String::from_utf8_lossy(e.as_bytes()).into_owned(), true)
            }
        };

        let mut doc = Self::from_text(&text);
        doc.path = Some(path.to_path_buf());
        doc.lossy = lossy;
        tracing::info!(
            path = %path.display(),
            lines = doc.line_count(),
            line_ending = %doc.line_ending,
            "loaded"
        );
        Ok(doc)
    }

    /// Replace the whole content with `text`.
    ///
    /// Lines are split on LF, CRLF or CR. A single trailing terminator
    /// ends the last line rather than starting a new one. The document is
    /// left unmodified.
    pub fn load_from_text(&mut self, text: &str) {
        self.line_ending = LineEnding::detect(text);
        let normalized = normalize_to_lf(text);
        let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
        self.rope = Rope::from_str(body);
        self.modified = false;
    }

    // -- Text access --------------------------------------------------------

    /// Number of lines; at least 1.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Index of the last line.
    #[inline]
    #[must_use]
    pub fn last_line(&self) -> usize {
        self.line_count() - 1
    }

    /// The text of line `row` without its terminator, or `None` past the
    /// end.
    #[must_use]
    pub fn line(&self, row: usize) -> Option<RopeSlice<'_>> {
        if row >= self.line_count() {
            return None;
        }
        let line = self.rope.line(row);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            Some(line.slice(..len - 1))
        } else {
            Some(line)
        }
    }

    /// Length of line `row` in chars, 0 past the end.
    #[must_use]
    pub fn line_len(&self, row: usize) -> usize {
        self.line(row).map_or(0, |l| l.len_chars())
    }

    /// Total number of chars, separators included.
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Nearest valid position to `pos`.
    #[must_use]
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        Position::new(line, pos.col.min(self.line_len(line)))
    }

    fn char_idx(&self, pos: Position) -> usize {
        self.rope.line_to_char(pos.line) + pos.col
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `ch` at `pos`; returns the position just after it.
    ///
    /// A line separator (`\n` or `\r`) splits the line instead, as
    /// [`insert_newline`](Self::insert_newline) does.
    pub fn insert_char(&mut self, pos: Position, ch: char) -> Position {
        if ch == '\n' || ch == '\r' {
            return self.insert_newline(pos);
        }
        let pos = self.clamp(pos);
        self.rope.insert_char(self.char_idx(pos), ch);
        self.modified = true;
        Position::new(pos.line, pos.col + 1)
    }

    /// Split line `pos.line` at `pos.col`; returns the start of the new
    /// line.
    pub fn insert_newline(&mut self, pos: Position) -> Position {
        let pos = self.clamp(pos);
        self.rope.insert_char(self.char_idx(pos), '\n');
        self.modified = true;
        Position::new(pos.line + 1, 0)
    }

    /// Backspace at `pos`.
    ///
    /// Removes the char before `pos.col`, or at column 0 joins the line onto
    /// the previous one. Returns where the cursor belongs afterwards, or
    /// `None` (and changes nothing) at the start of the document.
    pub fn delete_char(&mut self, pos: Position) -> Option<Position> {
        let pos = self.clamp(pos);
        if pos.is_zero() {
            return None;
        }

        let idx = self.char_idx(pos);
        let cursor = if pos.col == 0 {
            Position::new(pos.line - 1, self.line_len(pos.line - 1))
        } else {
            Position::new(pos.line, pos.col - 1)
        };
        self.rope.remove(idx - 1..idx);
        self.modified = true;
        Some(cursor)
    }

    /// Forward delete at `pos`.
    ///
    /// Removes the char under `pos`, or at the end of a line joins the next
    /// line onto it. Returns `false` (and changes nothing) at the end of
    /// the document.
    pub fn delete_forward(&mut self, pos: Position) -> bool {
        let pos = self.clamp(pos);
        let idx = self.char_idx(pos);
        if idx >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(idx..=idx);
        self.modified = true;
        true
    }

    // -- Serialization ------------------------------------------------------

    /// The whole document as file content: every line terminated with the
    /// document's line ending. A document that is one empty line
    /// serializes to the empty string.
    #[must_use]
    pub fn serialize(&self) -> String {
        if self.rope.len_chars() == 0 {
            return String::new();
        }
        let eol = self.line_ending.as_str();
        let mut out = String::with_capacity(self.rope.len_bytes() + self.line_count() * eol.len());
        for row in 0..self.line_count() {
            if let Some(line) = self.line(row) {
                for chunk in line.chunks() {
                    out.push_str(chunk);
                }
            }
            out.push_str(eol);
        }
        out
    }

    // -- Metadata -----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// True if the content changed since it was loaded or last saved.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// True for a document with no text that has never been edited; the
    /// renderer shows the welcome banner for it.
    #[inline]
    #[must_use]
    pub fn is_untouched_empty(&self) -> bool {
        !self.modified && self.rope.len_chars() == 0
    }

    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    #[inline]
    pub const fn set_line_ending(&mut self, ending: LineEnding) {
        self.line_ending = ending;
    }

    /// True if the file was not valid UTF-8 and was decoded lossily.
    #[inline]
    #[must_use]
    pub const fn was_lossy(&self) -> bool {
        self.lossy
    }

    // -- File I/O -----------------------------------------------------------

    /// Write [`serialize`](Self::serialize) to the document's path.
    ///
    /// The content goes to a temporary file in the same directory, which
    /// then replaces the target in one rename, so a failed save never
    /// leaves a truncated file behind. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`FileError::NoPath`] if the document has no file name,
    /// [`FileError::Save`] if any step of the write fails. The document is
    /// unchanged (still modified) on error.
    pub fn save(&mut self) -> Result<usize> {
        let path = self.path.clone().ok_or(FileError::NoPath)?;
        let content = self.serialize();

        write_atomically(&path, content.as_bytes())
            .map_err(|source| FileError::Save {
                path: path.clone(),
                source,
            })?;

        self.modified = false;
        tracing::info!(path = %path.display(), bytes = content.len(), "saved");
        Ok(content.len())
    }
}

/// Write `bytes` to a temp file next to `path`, then rename it over `path`.
/// An existing file's permissions carry over.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.line_count())
            .field("chars", &self.len_chars())
            .field("modified", &self.modified)
            .field("line_ending", &self.line_ending)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn lines(doc: &Document) -> Vec<String> {
        (0..doc.line_count())
            .map(|row| doc.line(row).unwrap().to_string())
            .collect()
    }

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    // -- LineEnding ---------------------------------------------------------

    #[test]
    fn detect_line_endings() {
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\rb\r"), LineEnding::Cr);
        assert_eq!(LineEnding::detect("no newline"), LineEnding::Lf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }

    #[test]
    fn line_ending_display() {
        assert_eq!(LineEnding::CrLf.to_string(), "CRLF");
        assert_eq!(LineEnding::Lf.as_str(), "\n");
    }

    #[test]
    fn normalize_mixed_endings() {
        assert_eq!(normalize_to_lf("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert!(matches!(normalize_to_lf("plain\n"), Cow::Borrowed(_)));
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_document_is_one_empty_line() {
        let doc = Document::new();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line_len(0), 0);
        assert!(doc.is_untouched_empty());
        assert!(!doc.is_modified());
    }

    #[test]
    fn load_from_text_drops_one_trailing_terminator() {
        let doc = Document::from_text("abc\n\nde\n");
        assert_eq!(lines(&doc), vec!["abc", "", "de"]);
    }

    #[test]
    fn load_from_text_without_trailing_terminator() {
        let doc = Document::from_text("abc\nde");
        assert_eq!(lines(&doc), vec!["abc", "de"]);
    }

    #[test]
    fn load_from_text_crlf_and_cr() {
        assert_eq!(lines(&Document::from_text("a\r\nb\r\n")), vec!["a", "b"]);
        assert_eq!(lines(&Document::from_text("a\rb\r")), vec!["a", "b"]);
        assert_eq!(Document::from_text("a\r\nb").line_ending(), LineEnding::CrLf);
    }

    #[test]
    fn load_from_text_keeps_blank_last_line() {
        let doc = Document::from_text("abc\n\n");
        assert_eq!(lines(&doc), vec!["abc", ""]);
    }

    #[test]
    fn load_from_text_resets_modified() {
        let mut doc = Document::new();
        doc.insert_char(Position::ZERO, 'x');
        doc.load_from_text("fresh");
        assert!(!doc.is_modified());
        assert_eq!(lines(&doc), vec!["fresh"]);
    }

    #[test]
    fn line_past_end_is_none() {
        let doc = Document::from_text("one\ntwo");
        assert!(doc.line(2).is_none());
        assert_eq!(doc.line_len(2), 0);
    }

    #[test]
    fn columns_are_chars() {
        let doc = Document::from_text("café 中文");
        assert_eq!(doc.line_len(0), 7);
    }

    // -- Serialization ------------------------------------------------------

    #[test]
    fn serialize_terminates_every_line() {
        let doc = Document::from_text("abc\n\nde\n");
        assert_eq!(doc.serialize(), "abc\n\nde\n");
        assert_eq!(Document::from_text("abc").serialize(), "abc\n");
    }

    #[test]
    fn serialize_empty_document_is_empty() {
        assert_eq!(Document::new().serialize(), "");
    }

    #[test]
    fn serialize_preserves_crlf() {
        let doc = Document::from_text("a\r\nb\r\n");
        assert_eq!(doc.serialize(), "a\r\nb\r\n");
    }

    #[test]
    fn serialize_uses_configured_ending() {
        let mut doc = Document::from_text("a\nb\n");
        doc.set_line_ending(LineEnding::CrLf);
        assert_eq!(doc.serialize(), "a\r\nb\r\n");
    }

    // -- insert_char / insert_newline ----------------------------------------

    #[test]
    fn insert_char_in_middle() {
        let mut doc = Document::from_text("hllo");
        assert_eq!(doc.insert_char(p(0, 1), 'e'), p(0, 2));
        assert_eq!(lines(&doc), vec!["hello"]);
        assert!(doc.is_modified());
        assert!(!doc.is_untouched_empty());
    }

    #[test]
    fn insert_char_at_end_of_line() {
        let mut doc = Document::from_text("ab\ncd");
        doc.insert_char(p(0, 2), '!');
        assert_eq!(lines(&doc), vec!["ab!", "cd"]);
    }

    #[test]
    fn insert_char_out_of_range_is_clamped() {
        let mut doc = Document::from_text("ab");
        assert_eq!(doc.insert_char(p(5, 9), 'z'), p(0, 3));
        assert_eq!(lines(&doc), vec!["abz"]);
    }

    #[test]
    fn insert_separator_char_splits_line() {
        let mut doc = Document::from_text("ab");
        assert_eq!(doc.insert_char(p(0, 1), '\n'), p(1, 0));
        assert_eq!(lines(&doc), vec!["a", "b"]);
    }

    #[test]
    fn insert_newline_splits() {
        let mut doc = Document::from_text("hello world");
        assert_eq!(doc.insert_newline(p(0, 5)), p(1, 0));
        assert_eq!(lines(&doc), vec!["hello", " world"]);
    }

    #[test]
    fn insert_newline_at_end_adds_empty_line() {
        let mut doc = Document::from_text("abc");
        doc.insert_newline(p(0, 3));
        assert_eq!(lines(&doc), vec!["abc", ""]);
        assert_eq!(doc.serialize(), "abc\n\n");
    }

    #[test]
    fn insert_newline_in_empty_document() {
        let mut doc = Document::new();
        doc.insert_newline(Position::ZERO);
        assert_eq!(doc.line_count(), 2);
    }

    // -- delete_char -------------------------------------------------------

    #[test]
    fn delete_char_removes_previous() {
        let mut doc = Document::from_text("abc");
        assert_eq!(doc.delete_char(p(0, 2)), Some(p(0, 1)));
        assert_eq!(lines(&doc), vec!["ac"]);
    }

    #[test]
    fn delete_char_at_line_start_merges() {
        let mut doc = Document::from_text("ab\ncd");
        assert_eq!(doc.delete_char(p(1, 0)), Some(p(0, 2)));
        assert_eq!(lines(&doc), vec!["abcd"]);
    }

    #[test]
    fn delete_char_at_origin_is_noop() {
        let mut doc = Document::from_text("abc");
        assert_eq!(doc.delete_char(Position::ZERO), None);
        assert_eq!(lines(&doc), vec!["abc"]);
        assert!(!doc.is_modified());
    }

    #[test]
    fn delete_char_multibyte() {
        let mut doc = Document::from_text("a中b");
        assert_eq!(doc.delete_char(p(0, 2)), Some(p(0, 1)));
        assert_eq!(lines(&doc), vec!["ab"]);
    }

    #[test]
    fn delete_last_char_keeps_one_line() {
        let mut doc = Document::from_text("x");
        doc.delete_char(p(0, 1));
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line_len(0), 0);
        assert!(!doc.is_untouched_empty());
    }

    // -- delete_forward ----------------------------------------------------

    #[test]
    fn delete_forward_removes_under_cursor() {
        let mut doc = Document::from_text("abc");
        assert!(doc.delete_forward(p(0, 1)));
        assert_eq!(lines(&doc), vec!["ac"]);
    }

    #[test]
    fn delete_forward_at_line_end_joins() {
        let mut doc = Document::from_text("ab\ncd");
        assert!(doc.delete_forward(p(0, 2)));
        assert_eq!(lines(&doc), vec!["abcd"]);
    }

    #[test]
    fn delete_forward_at_document_end_is_noop() {
        let mut doc = Document::from_text("ab\ncd");
        assert!(!doc.delete_forward(p(1, 2)));
        assert!(!doc.is_modified());
    }

    // -- clamp ---------------------------------------------------------------

    #[test]
    fn clamp_limits_line_and_column() {
        let doc = Document::from_text("abc\nd");
        assert_eq!(doc.clamp(p(0, 10)), p(0, 3));
        assert_eq!(doc.clamp(p(9, 9)), p(1, 1));
        assert_eq!(doc.clamp(p(1, 0)), p(1, 0));
    }

    // -- File I/O -------------------------------------------------------------

    #[test]
    fn load_missing_file_binds_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.path(), Some(path.as_path()));
        assert!(doc.is_untouched_empty());
    }

    #[test]
    fn load_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Document::load(dir.path()),
            Err(FileError::Load { .. })
        ));
    }

    #[test]
    fn load_invalid_utf8_is_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.txt");
        fs::write(&path, b"ok\n\xff\xfe\n").unwrap();

        let doc = Document::load(&path).unwrap();
        assert!(doc.was_lossy());
        assert_eq!(lines(&doc), vec!["ok", "\u{fffd}\u{fffd}"]);
    }

    #[test]
    fn save_writes_and_clears_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut doc = Document::load(&path).unwrap();
        doc.insert_char(Position::ZERO, 'h');
        doc.insert_char(p(0, 1), 'i');

        assert_eq!(doc.save().unwrap(), 3);
        assert!(!doc.is_modified());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hi\n");
    }

    #[test]
    fn save_round_trips_crlf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dos.txt");
        fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let mut doc = Document::load(&path).unwrap();
        doc.insert_char(p(1, 3), '!');
        doc.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\r\ntwo!\r\n");
    }

    #[test]
    fn save_without_path_fails() {
        let mut doc = Document::from_text("x");
        doc.insert_char(Position::ZERO, 'y');
        assert!(matches!(doc.save(), Err(FileError::NoPath)));
        assert!(doc.is_modified());
    }

    #[test]
    fn save_into_missing_directory_fails_and_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/file.txt");
        let mut doc = Document::from_text("keep");
        doc.set_path(path.clone());
        doc.insert_char(Position::ZERO, '>');

        assert!(matches!(doc.save(), Err(FileError::Save { .. })));
        assert!(doc.is_modified());
        assert_eq!(lines(&doc), vec![">keep"]);
        assert!(!path.exists());
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        let mut doc = Document::from_text("a\nb");
        doc.set_path(path.clone());
        doc.save().unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("f.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.sh");
        fs::write(&path, "echo hi\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o750)).unwrap();

        let mut doc = Document::load(&path).unwrap();
        doc.insert_char(Position::ZERO, '#');
        doc.save().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    // -- Properties -----------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Edit {
        Insert(usize, usize, char),
        Newline(usize, usize),
        Backspace(usize, usize),
        Delete(usize, usize),
    }

    fn edit() -> impl Strategy<Value = Edit> {
        let pos = (0usize..6, 0usize..12);
        let ch = prop::sample::select(vec!['a', 'z', ' ', '\t', 'é', '中', '🦀']);
        prop_oneof![
            (pos.clone(), ch).prop_map(|((l, c), ch)| Edit::Insert(l, c, ch)),
            pos.clone().prop_map(|(l, c)| Edit::Newline(l, c)),
            pos.clone().prop_map(|(l, c)| Edit::Backspace(l, c)),
            pos.prop_map(|(l, c)| Edit::Delete(l, c)),
        ]
    }

    fn apply(doc: &mut Document, edit: &Edit) {
        match *edit {
            Edit::Insert(l, c, ch) => {
                doc.insert_char(p(l, c), ch);
            }
            Edit::Newline(l, c) => {
                doc.insert_newline(p(l, c));
            }
            Edit::Backspace(l, c) => {
                doc.delete_char(p(l, c));
            }
            Edit::Delete(l, c) => {
                doc.delete_forward(p(l, c));
            }
        }
    }

    proptest! {
        #[test]
        fn serialize_then_load_reproduces_lines(
            seed in "[a-c\n]{0,20}",
            edits in prop::collection::vec(edit(), 0..40),
        ) {
            let mut doc = Document::from_text(&seed);
            for e in &edits {
                apply(&mut doc, e);
                prop_assert!(doc.line_count() >= 1);
            }

            let reloaded = Document::from_text(&doc.serialize());
            prop_assert_eq!(lines(&reloaded), lines(&doc));
        }

        #[test]
        fn crlf_round_trip(body in prop::collection::vec("[a-z]{1,5}", 1..6)) {
            let text: String = body.iter().map(|l| format!("{l}\r\n")).collect();
            let doc = Document::from_text(&text);
            prop_assert_eq!(doc.serialize(), text);
        }
    }
}

//! Cursor — position tracking and movement.
//!
//! The `Cursor` holds a [`Position`] in a [`Document`] and a sticky column
//! for vertical movement. It never owns the document; every movement takes
//! it as a parameter and leaves the cursor on a valid position:
//! `line < line_count` and `col <= line_len(line)`. The column may sit one
//! past the last character, which is where typing appends.
//!
//! # Sticky column
//!
//! Moving up or down through a short line pulls the column in, but the
//! cursor remembers where it came from. Reaching a long line again puts it
//! back at the remembered column. Any horizontal movement or edit resets
//! the sticky column to the current column.
//!
//! # Line wrapping
//!
//! Left at column 0 moves to the end of the previous line; right at the end
//! of a line moves to the start of the next one.

use crate::buffer::Document;
use crate::position::Position;

/// A cursor in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    pos: Position,

    /// Column to aim for on vertical movement.
    sticky_col: usize,
}

impl Cursor {
    /// A cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: Position::ZERO,
            sticky_col: 0,
        }
    }

    /// A cursor at `pos`. The caller is responsible for validity; call
    /// [`clamp`](Self::clamp) if unsure.
    #[must_use]
    pub const fn at(pos: Position) -> Self {
        Self {
            pos,
            sticky_col: pos.col,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos.line
    }

    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.pos.col
    }

    /// The column vertical movement aims for.
    #[inline]
    #[must_use]
    pub const fn sticky_col(&self) -> usize {
        self.sticky_col
    }

    // -- Direct positioning -------------------------------------------------

    /// Jump to `pos`, clamped to the document. Resets the sticky column.
    pub fn set_position(&mut self, pos: Position, doc: &Document) {
        self.pos = doc.clamp(pos);
        self.sticky_col = self.pos.col;
    }

    // -- Horizontal movement ------------------------------------------------

    /// One char left, or to the end of the previous line from column 0.
    pub fn move_left(&mut self, doc: &Document) {
        let pos = doc.clamp(self.pos);
        self.pos = if pos.col > 0 {
            Position::new(pos.line, pos.col - 1)
        } else if pos.line > 0 {
            Position::new(pos.line - 1, doc.line_len(pos.line - 1))
        } else {
            pos
        };
        self.sticky_col = self.pos.col;
    }

    /// One char right, or to the start of the next line from the end of a
    /// line.
    pub fn move_right(&mut self, doc: &Document) {
        let pos = doc.clamp(self.pos);
        self.pos = if pos.col < doc.line_len(pos.line) {
            Position::new(pos.line, pos.col + 1)
        } else if pos.line < doc.last_line() {
            Position::new(pos.line + 1, 0)
        } else {
            pos
        };
        self.sticky_col = self.pos.col;
    }

    /// Column 0 of the current line.
    pub const fn move_to_line_start(&mut self) {
        self.pos.col = 0;
        self.sticky_col = 0;
    }

    /// Just past the last char of the current line.
    pub fn move_to_line_end(&mut self, doc: &Document) {
        self.pos.col = doc.line_len(self.pos.line);
        self.sticky_col = self.pos.col;
    }

    // -- Vertical movement --------------------------------------------------

    /// Up by `count` lines, stopping at the first line.
    pub fn move_up(&mut self, count: usize, doc: &Document) {
        self.pos.line = self.pos.line.saturating_sub(count).min(doc.last_line());
        self.apply_sticky(doc);
    }

    /// Down by `count` lines, stopping at the last line.
    pub fn move_down(&mut self, count: usize, doc: &Document) {
        self.pos.line = self.pos.line.saturating_add(count).min(doc.last_line());
        self.apply_sticky(doc);
    }

    /// One screenful up; `page` is the text-area height.
    pub fn page_up(&mut self, page: usize, doc: &Document) {
        self.move_up(page.max(1), doc);
    }

    /// One screenful down; `page` is the text-area height.
    pub fn page_down(&mut self, page: usize, doc: &Document) {
        self.move_down(page.max(1), doc);
    }

    fn apply_sticky(&mut self, doc: &Document) {
        self.pos.col = self.sticky_col.min(doc.line_len(self.pos.line));
    }

    // -- Clamping -----------------------------------------------------------

    /// Pull the cursor back inside the document after an edit shrank it.
    /// The sticky column is kept.
    pub fn clamp(&mut self, doc: &Document) {
        self.pos = doc.clamp(self.pos);
    }

    /// True if the cursor is on a valid position of `doc`.
    #[must_use]
    pub fn is_valid_in(&self, doc: &Document) -> bool {
        self.pos.line < doc.line_count() && self.pos.col <= doc.line_len(self.pos.line)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

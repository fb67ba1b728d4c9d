//! Viewport — which part of the document is on screen.
//!
//! The viewport is a pair of scroll offsets: the first visible line, and
//! the first visible *rendered* column. Rendered columns are screen cells,
//! not chars:
//!
//! - a tab advances to the next multiple of the tab stop
//! - wide characters (CJK, most emoji) take two cells
//! - control characters take one cell (they are drawn as `?`)
//! - zero-width characters (combining marks) take none
//!
//! [`Viewport::reconcile`] is pure: given the cursor and the text-area
//! size, it returns the offsets that keep the cursor visible while
//! scrolling as little as possible.

use unicode_width::UnicodeWidthChar;

use crate::buffer::Document;
use crate::position::Position;

// ---------------------------------------------------------------------------
// Rendered columns
// ---------------------------------------------------------------------------

/// Cells taken by `ch` when it starts at rendered column `col`.
#[must_use]
pub fn cell_width(ch: char, col: usize, tab_stop: usize) -> usize {
    if ch == '\t' {
        let stop = tab_stop.max(1);
        return stop - col % stop;
    }
    if ch.is_control() {
        return 1;
    }
    ch.width().unwrap_or(1)
}

/// Rendered column of char column `char_col` in a line given as chars.
///
/// Columns past the end of the line count as one cell each.
#[must_use]
pub fn rendered_col<I: IntoIterator<Item = char>>(
    chars: I,
    char_col: usize,
    tab_stop: usize,
) -> usize {
    let mut chars = chars.into_iter();
    let mut col = 0;
    for i in 0..char_col {
        match chars.next() {
            Some(ch) => col += cell_width(ch, col, tab_stop),
            None => return col + (char_col - i),
        }
    }
    col
}

/// Rendered column of `pos` in `doc`.
#[must_use]
pub fn rendered_col_in(doc: &Document, pos: Position, tab_stop: usize) -> usize {
    doc.line(pos.line)
        .map_or(pos.col, |line| rendered_col(line.chars(), pos.col, tab_stop))
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Scroll offsets of the text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible document line.
    pub row_offset: usize,
    /// First visible rendered column.
    pub col_offset: usize,
}

impl Viewport {
    #[must_use]
    pub const fn new(row_offset: usize, col_offset: usize) -> Self {
        Self {
            row_offset,
            col_offset,
        }
    }

    /// Offsets that put `cursor` inside a `text_rows` × `text_cols` area.
    ///
    /// Each axis scrolls only when the cursor has left the window, and then
    /// just far enough to bring it back to the nearest edge. A zero-sized
    /// axis pins its offset to the cursor.
    #[must_use]
    pub fn reconcile(
        self,
        cursor: Position,
        doc: &Document,
        text_rows: usize,
        text_cols: usize,
        tab_stop: usize,
    ) -> Self {
        let rx = rendered_col_in(doc, cursor, tab_stop);
        Self {
            row_offset: scroll_axis(self.row_offset, cursor.line, text_rows),
            col_offset: scroll_axis(self.col_offset, rx, text_cols),
        }
    }

    /// Screen cell of `cursor` relative to the text area's top-left corner.
    ///
    /// Only meaningful after [`reconcile`](Self::reconcile) with the same
    /// cursor.
    #[must_use]
    pub fn screen_position(
        self,
        cursor: Position,
        doc: &Document,
        tab_stop: usize,
    ) -> (usize, usize) {
        let rx = rendered_col_in(doc, cursor, tab_stop);
        (
            rx.saturating_sub(self.col_offset),
            cursor.line.saturating_sub(self.row_offset),
        )
    }

    /// True if `cursor` is inside the window on both axes.
    #[must_use]
    pub fn contains(
        self,
        cursor: Position,
        doc: &Document,
        text_rows: usize,
        text_cols: usize,
        tab_stop: usize,
    ) -> bool {
        let rx = rendered_col_in(doc, cursor, tab_stop);
        (self.row_offset..self.row_offset + text_rows).contains(&cursor.line)
            && (self.col_offset..self.col_offset + text_cols).contains(&rx)
    }
}

/// One axis of [`Viewport::reconcile`].
const fn scroll_axis(offset: usize, target: usize, span: usize) -> usize {
    if span == 0 || target < offset {
        target
    } else if target >= offset + span {
        target - span + 1
    } else {
        offset
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Renderer — one complete frame per call.
//!
//! [`paint`] composes the whole screen into an [`OutputBuffer`]: the
//! visible slice of the document, `~` filler rows past its end, the welcome
//! banner on an untouched empty document, the reverse-video status line,
//! and finally the cursor. The caller flushes the buffer in one write.
//!
//! ```text
//!  hide cursor, home
//!  ┌──────────────────────────────┐
//!  │\e[K line at row_offset        │  text rows: clear, then content
//!  │\e[K line at row_offset + 1    │
//!  │\e[K ~                         │  filler past the last line
//!  │\e[K ~   Tilde editor -- ...   │  banner (empty document only)
//!  │\e[7m status left     right\e[0m  last row
//!  └──────────────────────────────┘
//!  cursor to (x, y), show cursor
//! ```
//!
//! Rows are separated by `\r\n` because raw mode turns off output
//! post-processing. Nothing is written after the status line, so the
//! terminal never scrolls.

use std::io;

use ropey::RopeSlice;
use tilde_term::OutputBuffer;
use tilde_term::ansi;
use tilde_term::terminal::Size;
use unicode_width::UnicodeWidthChar;

use crate::buffer::Document;
use crate::position::Position;
use crate::view::{Viewport, cell_width};

/// Banner shown on an untouched empty document.
pub const WELCOME: &str = concat!("Tilde editor -- version ", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

/// Text of the bottom row: `left` is flush left, `right` flush right.
///
/// When both don't fit, `left` wins and `right` is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub left: String,
    pub right: String,
}

impl StatusLine {
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Number of rows available for text on a screen of `size`.
#[inline]
#[must_use]
pub const fn text_rows(size: Size) -> usize {
    size.rows.saturating_sub(1) as usize
}

/// Compose one frame into `out`.
///
/// `viewport` must already be reconciled with `cursor` for this `size`.
///
/// # Errors
///
/// Propagates write errors from `out`. An [`OutputBuffer`] never fails.
pub fn paint(
    out: &mut OutputBuffer,
    doc: &Document,
    cursor: Position,
    viewport: Viewport,
    size: Size,
    status: &StatusLine,
    tab_stop: usize,
) -> io::Result<()> {
    let rows = text_rows(size);
    let cols = usize::from(size.cols);

    ansi::cursor_hide(out)?;
    ansi::cursor_home(out)?;

    let untouched = doc.is_untouched_empty();
    let banner_row = (rows >= 2).then_some(rows / 3);

    for y in 0..rows {
        ansi::clear_line(out)?;
        let line = viewport.row_offset + y;
        if !untouched && line < doc.line_count() {
            if let Some(text) = doc.line(line) {
                draw_line(out, text, viewport.col_offset, cols, tab_stop)?;
            }
        } else if untouched && banner_row == Some(y) {
            draw_banner(out, cols);
        } else {
            out.push_char('~');
        }
        ansi::newline(out)?;
    }

    draw_status(out, status, cols)?;

    let (x, y) = viewport.screen_position(cursor, doc, tab_stop);
    ansi::cursor_to(out, to_u16(x), to_u16(y))?;
    ansi::cursor_show(out)?;
    Ok(())
}

/// Draw the part of `text` between rendered columns `col_offset` and
/// `col_offset + cols`.
fn draw_line(
    out: &mut OutputBuffer,
    text: RopeSlice<'_>,
    col_offset: usize,
    cols: usize,
    tab_stop: usize,
) -> io::Result<()> {
    let end = col_offset + cols;
    let mut col = 0;

    for ch in text.chars() {
        if col >= end {
            break;
        }
        let width = cell_width(ch, col, tab_stop);
        let next = col + width;

        if next <= col_offset {
            col = next;
            continue;
        }

        // Cells of this char that fall inside the window.
        let visible = next.min(end) - col.max(col_offset);

        if ch == '\t' {
            out.push_repeated(b' ', visible);
        } else if ch.is_control() {
            ansi::inverse(out)?;
            out.push_char('?');
            ansi::reset(out)?;
        } else if visible < width {
            // A wide char cut by an edge of the window.
            out.push_repeated(b' ', visible);
        } else {
            out.push_char(ch);
        }
        col = next;
    }
    Ok(())
}

/// The filler row carrying the welcome banner, centered.
fn draw_banner(out: &mut OutputBuffer, cols: usize) {
    let shown = WELCOME.len().min(cols);
    let mut padding = (cols - shown) / 2;
    if padding > 0 {
        out.push_char('~');
        padding -= 1;
    }
    out.push_repeated(b' ', padding);
    out.push_str(&WELCOME[..shown]);
}

/// The reverse-video bottom row.
fn draw_status(out: &mut OutputBuffer, status: &StatusLine, cols: usize) -> io::Result<()> {
    ansi::inverse(out)?;
    let left = push_clipped(out, &status.left, cols);
    let right = text_width(&status.right);

    if left + right <= cols {
        out.push_repeated(b' ', cols - left - right);
        out.push_str(&status.right);
    } else {
        out.push_repeated(b' ', cols - left);
    }
    ansi::reset(out)
}

/// Push as much of `text` as fits in `max` cells; returns the cells used.
fn push_clipped(out: &mut OutputBuffer, text: &str, max: usize) -> usize {
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        out.push_char(ch);
        used += w;
    }
    used
}

fn text_width(text: &str) -> usize {
    text.chars().map(|ch| ch.width().unwrap_or(0)).sum()
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

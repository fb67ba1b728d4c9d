//! Document coordinates.
//!
//! All coordinates are **0-indexed**. Line 0 is the first line, column 0 is
//! the first character. Columns count Unicode scalar values (chars), never
//! bytes, so column 3 of `"café"` is `'é'`.
//!
//! Rendered (screen) columns are a different unit: tabs and wide characters
//! take more than one cell. That conversion lives in [`crate::view`].

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A position in a document: (line, column), both 0-indexed.
///
/// `col` may equal the line length: that is the "after the last character"
/// slot where typing appends.
///
/// Positions order lexicographically, line first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin: line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// True at the very start of the document.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.line == 0 && self.col == 0
    }
}

impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line.cmp(&other.line).then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed, as shown on the status line.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! # tilde-editor — editor core for tilde
//!
//! The pieces of the editor that don't touch the terminal device:
//!
//! - **[`position`]** — `Position` (line, col), 0-indexed, char columns
//! - **[`buffer`]** — `Document`, a never-empty line sequence over a rope, with load/save
//! - **[`cursor`]** — `Cursor` with wrapping horizontal moves and a sticky column
//! - **[`view`]** — `Viewport` scroll offsets and rendered-column math
//! - **[`render`]** — composes a full frame into a `tilde_term::OutputBuffer`
//! - **[`mode`]** — the editing mode slot
//! - **[`config`]** — `EditorConfig` defaults
//! - **[`error`]** — `FileError`

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod error;
pub mod mode;
pub mod position;
pub mod render;
pub mod view;

pub use buffer::{Document, LineEnding};
pub use config::EditorConfig;
pub use cursor::Cursor;
pub use error::FileError;
pub use mode::Mode;
pub use position::Position;
pub use render::StatusLine;
pub use view::Viewport;

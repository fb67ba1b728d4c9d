// SPDX-License-Identifier: MIT
//
// tilde-term — terminal plumbing for the tilde editor.
//
// Everything between the editor and the tty lives here: raw-mode entry and
// exact restore, geometry queries, timed byte reads, key decoding, ANSI
// sequence generation, and the single-write frame buffer. The event loop
// ties them together behind a small `App` trait so the editor never touches
// termios or file descriptors itself.
//
// Direct termios through libc, no TUI framework. POSIX only.

#[cfg(not(unix))]
compile_error!("tilde-term requires a POSIX terminal (termios)");

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;

pub use error::{Result, TermError};
pub use event_loop::{Action, App, EventLoop, Exit, LoopConfig};
pub use input::Key;
pub use output::OutputBuffer;
pub use terminal::Size;

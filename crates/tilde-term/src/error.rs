// SPDX-License-Identifier: MIT
//
// Terminal-layer errors.
//
// Only `GeometryUnavailable` is recoverable: the caller substitutes a
// fallback size. Every other variant means the terminal can no longer be
// trusted, and the event loop unwinds through the restore path before the
// error reaches `main`.

use std::io;

use thiserror::Error;

/// Errors raised by the terminal mode controller, the key reader, and the
/// frame output path.
#[derive(Debug, Error)]
pub enum TermError {
    /// A termios call failed while entering or leaving raw mode.
    #[error("terminal configuration failed ({op}): {source}")]
    TerminalConfig {
        /// The libc call that failed (`tcgetattr`, `tcsetattr`).
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// `TIOCGWINSZ` failed or reported a zero-sized window.
    #[error("terminal geometry unavailable")]
    GeometryUnavailable,

    /// Reading from the terminal failed with something other than
    /// "no data yet".
    #[error("failed to read terminal input: {0}")]
    Read(#[source] io::Error),

    /// Writing a frame or a mode-switch sequence failed.
    #[error("failed to write terminal output: {0}")]
    Write(#[from] io::Error),
}

impl TermError {
    /// Wrap the current `errno` as a configuration failure of `op`.
    #[must_use]
    pub fn last_os_config(op: &'static str) -> Self {
        Self::TerminalConfig {
            op,
            source: io::Error::last_os_error(),
        }
    }
}

/// Result alias for terminal operations.
pub type Result<T> = std::result::Result<T, TermError>;

//! Editor settings.
//!
//! Plain values with defaults. The binary fills them from the command line
//! and environment; tests build them directly.

use std::time::Duration;

/// Settings owned by the editor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Width of a tab stop in rendered columns.
    pub tab_stop: usize,

    /// Extra Ctrl-Q presses needed to quit with unsaved changes. Zero
    /// means the quit key always quits on the first press.
    pub quit_times: u32,

    /// How long a status message stays up.
    pub message_timeout: Duration,
}

impl EditorConfig {
    pub const DEFAULT_TAB_STOP: usize = 8;
    pub const DEFAULT_QUIT_TIMES: u32 = 0;
    pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_stop: Self::DEFAULT_TAB_STOP,
            quit_times: Self::DEFAULT_QUIT_TIMES,
            message_timeout: Self::DEFAULT_MESSAGE_TIMEOUT,
        }
    }
}

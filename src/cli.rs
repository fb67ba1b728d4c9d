// SPDX-License-Identifier: MIT
//
// Command line and environment.
//
// Every option has an environment fallback so a shell profile can set
// defaults once. Parsed values are split into the two config structs the
// crates take: `LoopConfig` for the terminal side, `EditorConfig` for the
// controller.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tilde_editor::EditorConfig;
use tilde_term::event_loop::LoopConfig;
use tilde_term::terminal::Size;

/// A small vi-style terminal text editor.
#[derive(Debug, Parser)]
#[command(name = "tilde", author, version, about, long_about = None)]
pub struct Cli {
    /// File to edit. Created on first save if it does not exist.
    pub path: Option<PathBuf>,

    /// Width of a tab stop in columns.
    #[arg(long, env = "TILDE_TAB_STOP", default_value_t = 8,
          value_parser = clap::value_parser!(u16).range(1..=64))]
    pub tab_stop: u16,

    /// Extra Ctrl-Q presses required to quit with unsaved changes
    /// (0: Ctrl-Q always quits at once).
    #[arg(long, env = "TILDE_QUIT_TIMES", default_value_t = EditorConfig::DEFAULT_QUIT_TIMES)]
    pub quit_times: u32,

    /// Input read timeout in tenths of a second. Also how long a lone
    /// Escape waits for the rest of a key sequence.
    #[arg(long, env = "TILDE_READ_TIMEOUT", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(1..))]
    pub read_timeout: u8,

    /// Rows to assume when the terminal cannot report its size.
    #[arg(long, default_value_t = Size::FALLBACK.rows,
          value_parser = clap::value_parser!(u16).range(2..))]
    pub fallback_rows: u16,

    /// Columns to assume when the terminal cannot report its size.
    #[arg(long, default_value_t = Size::FALLBACK.cols,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub fallback_cols: u16,

    /// Seconds a status message stays visible.
    #[arg(long, env = "TILDE_MESSAGE_TIMEOUT", default_value_t = 5)]
    pub message_timeout: u64,

    /// Write logs to this file.
    #[arg(long, env = "TILDE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Terminal-side settings.
    #[must_use]
    pub const fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            read_timeout_ds: self.read_timeout,
            fallback: Size {
                cols: self.fallback_cols,
                rows: self.fallback_rows,
            },
        }
    }

    /// Controller settings.
    #[must_use]
    pub const fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            tab_stop: self.tab_stop as usize,
            quit_times: self.quit_times,
            message_timeout: Duration::from_secs(self.message_timeout),
        }
    }
}

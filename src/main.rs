// SPDX-License-Identifier: MIT
//
// tilde — a small terminal text editor.
//
// This is the main binary that wires the two crates together:
//
//   tilde-term   → raw mode, key decoding, output buffer, event loop
//   tilde-editor → document, cursor, viewport, frame composition
//
// The Editor struct implements tilde-term's App trait. Each keypress flows
// through:
//
//   stdin → KeyReader → on_key → dispatch → document/cursor mutation
//   paint → render::paint → OutputBuffer → one write to the terminal
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text area                    │  ← rows - 1
//   ├──────────────────────────────┤
//   │ status line (INVERSE)        │  ← 1 row
//   └──────────────────────────────┘
//
// Startup order matters: the file is loaded before the terminal goes raw,
// so a load error prints to a normal terminal and exits with status 1.

mod cli;
mod editor;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use tilde_editor::Document;
use tilde_term::EventLoop;

use crate::cli::Cli;
use crate::editor::Editor;

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Held until the end of main so the log file is flushed on exit.
    let log_guard = match logging::init(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("tilde: failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        path = ?cli.path,
        log_file = ?log_guard.as_ref().map(|g| &g.log_file),
        "starting"
    );

    let doc = match open_document(&cli) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "load failed");
            eprintln!("tilde: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut editor = Editor::new(doc, cli.editor_config());
    let mut event_loop = EventLoop::new(cli.loop_config());

    // `run` restores the terminal before returning, on success and on error.
    match event_loop.run(&mut editor) {
        Ok(exit) => {
            tracing::info!(?exit, "exiting");
            ExitCode::from(exit.code())
        }
        Err(e) => {
            tracing::error!(error = %e, "terminal failure");
            eprintln!("tilde: {e}");
            ExitCode::FAILURE
        }
    }
}

/// The document named on the command line, or an empty unnamed one.
fn open_document(cli: &Cli) -> tilde_editor::error::Result<Document> {
    cli.path
        .as_deref()
        .map_or_else(|| Ok(Document::new()), Document::load)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Editor controller.
//
// `Editor` owns every piece of editing state (document, cursor, viewport,
// mode, status message, settings) and implements the event loop's `App`
// trait. It never touches the terminal: keys come in through `on_key`,
// frames go out through `paint`.
//
// Every dispatch ends the same way: clamp the cursor to the document, then
// reconcile the viewport so the cursor is on screen. `paint` reconciles
// once more because a resize can arrive between dispatch and paint.

use std::time::Instant;

use tilde_editor::render::{self, StatusLine};
use tilde_editor::{Cursor, Document, EditorConfig, FileError, Mode, Position, Viewport};
use tilde_term::event_loop::{Action, App};
use tilde_term::input::Key;
use tilde_term::output::OutputBuffer;
use tilde_term::terminal::Size;

/// Startup hint shown until the first message timeout.
const HELP: &str = "HELP: Ctrl-S = save | Ctrl-Q = quit";

/// A transient status-line message.
#[derive(Debug, Clone)]
struct Message {
    text: String,
    shown_at: Instant,
}

pub struct Editor {
    doc: Document,
    cursor: Cursor,
    viewport: Viewport,
    mode: Mode,
    config: EditorConfig,

    /// Last size reported by the event loop.
    size: Size,

    message: Option<Message>,

    /// Ctrl-Q presses still needed to quit with unsaved changes.
    quit_presses_left: u32,
}

impl Editor {
    #[must_use]
    pub fn new(doc: Document, config: EditorConfig) -> Self {
        let mut editor = Self {
            doc,
            cursor: Cursor::new(),
            viewport: Viewport::default(),
            mode: Mode::default(),
            config,
            size: Size::FALLBACK,
            message: None,
            quit_presses_left: config.quit_times,
        };

        if editor.doc.was_lossy() {
            editor.set_message("Warning: file is not valid UTF-8; invalid bytes were replaced");
        } else {
            editor.set_message(HELP);
        }
        editor
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    fn text_rows(&self) -> usize {
        render::text_rows(self.size)
    }

    fn text_cols(&self) -> usize {
        usize::from(self.size.cols)
    }

    // ── Messages ──────────────────────────────────────────────────────────

    fn set_message(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Apply one key to the editor state.
    pub fn dispatch(&mut self, key: Key) -> Action {
        let action = match self.mode {
            Mode::Normal => self.dispatch_normal(key),
        };

        if key != Key::Quit {
            self.quit_presses_left = self.config.quit_times;
        }

        self.cursor.clamp(&self.doc);
        self.reconcile();
        action
    }

    fn dispatch_normal(&mut self, key: Key) -> Action {
        let pos = self.cursor.position();
        match key {
            Key::Quit => return self.request_quit(),

            Key::ArrowLeft => self.cursor.move_left(&self.doc),
            Key::ArrowRight => self.cursor.move_right(&self.doc),
            Key::ArrowUp => self.cursor.move_up(1, &self.doc),
            Key::ArrowDown => self.cursor.move_down(1, &self.doc),
            Key::Home => self.cursor.move_to_line_start(),
            Key::End => self.cursor.move_to_line_end(&self.doc),
            Key::PageUp => self.cursor.page_up(self.text_rows(), &self.doc),
            Key::PageDown => self.cursor.page_down(self.text_rows(), &self.doc),

            Key::Enter => {
                let next = self.doc.insert_newline(pos);
                self.cursor.set_position(next, &self.doc);
            }
            Key::Backspace => self.backspace(pos),
            Key::ControlChar(_) if key.is_ctrl(b'h') => self.backspace(pos),
            Key::Delete => {
                self.doc.delete_forward(pos);
            }
            Key::Char(ch) => self.insert(pos, ch),
            Key::ControlChar(_) if key.is_ctrl(b'i') => self.insert(pos, '\t'),
            Key::ControlChar(_) if key.is_ctrl(b's') => self.save(),

            // Ctrl-L, Escape and the remaining control keys only redraw.
            Key::Escape | Key::ControlChar(_) => {}
        }
        Action::Continue
    }

    fn insert(&mut self, pos: Position, ch: char) {
        let next = self.doc.insert_char(pos, ch);
        self.cursor.set_position(next, &self.doc);
    }

    fn backspace(&mut self, pos: Position) {
        if let Some(next) = self.doc.delete_char(pos) {
            self.cursor.set_position(next, &self.doc);
        }
    }

    fn request_quit(&mut self) -> Action {
        if self.doc.is_modified() && self.quit_presses_left > 0 {
            self.set_message(format!(
                "WARNING!!! File has unsaved changes. Press Ctrl-Q {} more times to quit.",
                self.quit_presses_left
            ));
            self.quit_presses_left -= 1;
            return Action::Continue;
        }
        tracing::info!(modified = self.doc.is_modified(), "quit");
        Action::Quit
    }

    fn save(&mut self) {
        match self.doc.save() {
            Ok(bytes) => self.set_message(format!("{bytes} bytes written to disk")),
            Err(FileError::NoPath) => {
                self.set_message("Can't save: no file name (start tilde with a path)");
            }
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                self.set_message(e.to_string());
            }
        }
    }

    fn reconcile(&mut self) {
        self.viewport = self.viewport.reconcile(
            self.cursor.position(),
            &self.doc,
            self.text_rows(),
            self.text_cols(),
            self.config.tab_stop,
        );
    }

    // ── Status line ───────────────────────────────────────────────────────

    /// Bottom-row text: the active message or the file summary on the
    /// left, mode and position on the right.
    #[must_use]
    pub fn status_line(&self) -> StatusLine {
        let left = self.message.as_ref().map_or_else(
            || {
                let name = self
                    .doc
                    .path()
                    .map_or_else(|| "[No Name]".to_owned(), |p| p.display().to_string());
                format!(
                    "{name:.20} - {} lines{}",
                    self.doc.line_count(),
                    if self.doc.is_modified() { " (modified)" } else { "" }
                )
            },
            |m| m.text.clone(),
        );

        let right = format!(
            "{} | {} | {}/{}",
            self.mode,
            self.doc.line_ending(),
            self.cursor.line() + 1,
            self.doc.line_count()
        );

        StatusLine::new(left, right)
    }
}

impl App for Editor {
    fn on_key(&mut self, key: Key) -> Action {
        tracing::trace!(?key, "dispatch");
        self.dispatch(key)
    }

    fn on_resize(&mut self, size: Size) {
        self.size = size;
        self.reconcile();
    }

    fn on_tick(&mut self) -> bool {
        let expired = self
            .message
            .as_ref()
            .is_some_and(|m| m.shown_at.elapsed() >= self.config.message_timeout);
        if expired {
            self.message = None;
        }
        expired
    }

    fn paint(&mut self, out: &mut OutputBuffer, size: Size) {
        self.size = size;
        self.reconcile();

        let status = self.status_line();
        if let Err(e) = render::paint(
            out,
            &self.doc,
            self.cursor.position(),
            self.viewport,
            size,
            &status,
            self.config.tab_stop,
        ) {
            tracing::error!(error = %e, "failed to compose frame");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop — one thread, one read per tick, one write per frame.
//
// Each iteration:
//
//   1. If the screen is dirty, the application paints a whole frame into
//      the `OutputBuffer`, which goes to the terminal in a single write.
//   2. One timed key poll. A key goes to `App::on_key`; a quit action ends
//      the loop.
//   3. Signal flags are checked: SIGWINCH re-queries the geometry, a
//      termination signal ends the loop with `Exit::Signal`.
//   4. `App::on_tick` gets a chance to change time-based state (status
//      message expiry).
//
// The read timeout installed by raw mode bounds every wait, so the loop
// reacts to signals within one tick even when the user is idle.
//
// # Signals
//
// Handlers only store into atomics, which is async-signal-safe. SIGTERM,
// SIGHUP, SIGINT and SIGQUIT are routed to the loop so the terminal is
// restored before the process exits; with ISIG off, Ctrl-C and Ctrl-\ do
// not raise them from the keyboard anyway.
//
// # Cleanup
//
// `run` enters the terminal, drives the loop, and leaves the terminal on
// every path out of the loop, including read and write errors.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::error::Result;
use crate::input::{Key, KeyReader};
use crate::output::OutputBuffer;
use crate::reader::{ByteSource, FdSource};
use crate::terminal::{Size, Terminal};

// ─── Signals ─────────────────────────────────────────────────────────────────

/// Set by the SIGWINCH handler.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Signal number of the last termination signal, 0 if none.
static TERMINATION_SIGNAL: AtomicI32 = AtomicI32::new(0);

/// Signals that end the loop with [`Exit::Signal`].
const TERMINATION_SIGNALS: [libc::c_int; 4] =
    [libc::SIGTERM, libc::SIGHUP, libc::SIGINT, libc::SIGQUIT];

extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

extern "C" fn termination_handler(sig: libc::c_int) {
    TERMINATION_SIGNAL.store(sig, Ordering::Relaxed);
}

fn install_handler(sig: libc::c_int, handler: extern "C" fn(libc::c_int), flags: libc::c_int) {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler as usize;
        sa.sa_flags = flags;
        libc::sigemptyset(&raw mut sa.sa_mask);
        if libc::sigaction(sig, &raw const sa, std::ptr::null_mut()) != 0 {
            tracing::warn!(sig, "failed to install signal handler");
        }
    }
}

fn install_signal_handlers() {
    install_handler(libc::SIGWINCH, sigwinch_handler, libc::SA_RESTART);
    for sig in TERMINATION_SIGNALS {
        install_handler(sig, termination_handler, 0);
    }
}

/// The pair of flags a loop polls each tick.
#[derive(Clone, Copy)]
struct SignalFlags {
    winch: &'static AtomicBool,
    term: &'static AtomicI32,
}

impl SignalFlags {
    const PROCESS: Self = Self {
        winch: &SIGWINCH_RECEIVED,
        term: &TERMINATION_SIGNAL,
    };

    fn take_resize(self) -> bool {
        self.winch.swap(false, Ordering::Relaxed)
    }

    fn termination(self) -> Option<i32> {
        match self.term.load(Ordering::Relaxed) {
            0 => None,
            sig => Some(sig),
        }
    }
}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// Per iteration the loop calls [`paint`](App::paint) if the screen is
/// dirty, then [`on_key`](App::on_key) for the key read (if any), then
/// [`on_resize`](App::on_resize) if the window changed, then
/// [`on_tick`](App::on_tick). `on_resize` is also called once with the
/// initial size before the first frame.
pub trait App {
    /// Handle one decoded key. Return [`Action::Quit`] to exit the loop.
    fn on_key(&mut self, key: Key) -> Action;

    /// The terminal now has `size`.
    fn on_resize(&mut self, _size: Size) {}

    /// Called every iteration, key or not. Return `true` to repaint.
    fn on_tick(&mut self) -> bool {
        false
    }

    /// Compose a complete frame into `out`, cursor placement included.
    fn paint(&mut self, out: &mut OutputBuffer, size: Size);
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Terminal-side settings for the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// `VTIME` read timeout in tenths of a second (1..=255). Also the
    /// grace window for telling a lone Escape from an escape sequence.
    pub read_timeout_ds: u8,

    /// Geometry assumed when the terminal cannot report one.
    pub fallback: Size,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            read_timeout_ds: 1,
            fallback: Size::FALLBACK,
        }
    }
}

// ─── Exit ────────────────────────────────────────────────────────────────────

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The application returned [`Action::Quit`].
    Quit,
    /// A termination signal arrived; carries the signal number.
    Signal(i32),
}

impl Exit {
    /// Conventional process exit status: 0 for a clean quit, 128 + signal
    /// number after a termination signal.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Quit => 0,
            Self::Signal(sig) => (128 + sig) as u8,
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal, the key reader, and the frame buffer. Call
/// [`run`](Self::run) to enter the loop.
pub struct EventLoop {
    terminal: Terminal,
    reader: KeyReader<FdSource>,
    out: OutputBuffer,
}

impl EventLoop {
    /// Create a loop on stdin/stdout. Does not touch terminal settings
    /// until [`run`](Self::run).
    #[must_use]
    pub fn new(config: LoopConfig) -> Self {
        Self {
            terminal: Terminal::new(config.read_timeout_ds, config.fallback),
            reader: KeyReader::new(FdSource::stdin()),
            out: OutputBuffer::new(),
        }
    }

    /// Run until the application quits or a termination signal arrives.
    ///
    /// The terminal is restored before this returns, on success and on
    /// error alike.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be configured, if reading
    /// input or writing output fails, or if restoring the terminal fails.
    pub fn run(&mut self, app: &mut impl App) -> Result<Exit> {
        self.terminal.enter()?;
        install_signal_handlers();

        let size = self.terminal.refresh_size();
        tracing::info!(cols = size.cols, rows = size.rows, "event loop started");

        let terminal = &self.terminal;
        let result = drive(
            app,
            &mut self.reader,
            &mut self.out,
            &mut std::io::stdout(),
            size,
            || terminal.refresh_size(),
            SignalFlags::PROCESS,
        );

        let left = self.terminal.leave();
        match &result {
            Ok(exit) => tracing::info!(?exit, "event loop finished"),
            Err(e) => tracing::error!(error = %e, "event loop failed"),
        }

        let exit = result?;
        left?;
        Ok(exit)
    }
}

/// The loop proper, independent of the process terminal.
fn drive<S: ByteSource, W: Write>(
    app: &mut impl App,
    reader: &mut KeyReader<S>,
    out: &mut OutputBuffer,
    sink: &mut W,
    mut size: Size,
    mut refresh_size: impl FnMut() -> Size,
    signals: SignalFlags,
) -> Result<Exit> {
    app.on_resize(size);
    let mut dirty = true;

    loop {
        if dirty {
            out.clear();
            app.paint(out, size);
            out.flush_to(sink)?;
            dirty = false;
        }

        if let Some(key) = reader.poll_key()? {
            tracing::trace!(?key, "key");
            if app.on_key(key) == Action::Quit {
                return Ok(Exit::Quit);
            }
            dirty = true;
        }

        if let Some(sig) = signals.termination() {
            tracing::info!(sig, "termination signal received");
            return Ok(Exit::Signal(sig));
        }

        if signals.take_resize() {
            let new_size = refresh_size();
            tracing::debug!(cols = new_size.cols, rows = new_size.rows, "resize");
            size = new_size;
            app.on_resize(size);
            dirty = true;
        }

        if app.on_tick() {
            dirty = true;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

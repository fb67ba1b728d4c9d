// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, alternate screen, geometry, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd writes. These are
// the standard POSIX interfaces for terminal control. Each unsafe block is
// minimal and wraps exactly one libc call.
#![allow(unsafe_code)]
//
// Three layers, each usable on its own:
//
//   TerminalState — a copied `termios` snapshot. Captured once before raw
//   mode, applied once on the way out. Two snapshots compare flag-by-flag,
//   which is how the tests prove the restore was exact.
//
//   RawMode — a guard over one file descriptor. Construction captures the
//   snapshot and installs raw settings; `restore()` (or drop) puts the
//   snapshot back. Works on any tty fd, so tests drive it on a pty.
//
//   Terminal — the editor's handle on stdin/stdout: RawMode plus the
//   alternate screen, geometry caching, and the panic hook.
//
// The panic hook bypasses Rust's stdout lock and writes a pre-built restore
// sequence straight to fd 1, then restores termios from a process-wide
// backup. A panic mid-frame therefore still hands the user a working shell.

use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::error::{Result, TermError};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Classic VT100 geometry, used when the terminal cannot be queried.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the terminal size of `fd` via `ioctl(TIOCGWINSZ)`.
///
/// # Errors
///
/// Returns [`TermError::GeometryUnavailable`] if `fd` is not a terminal,
/// the ioctl fails, or the kernel reports a zero dimension.
pub fn get_size(fd: RawFd) -> Result<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Ok(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        Err(TermError::GeometryUnavailable)
    }
}

/// Query the size of `fd`, substituting `fallback` when it is unavailable.
#[must_use]
pub fn size_or(fd: RawFd, fallback: Size) -> Size {
    get_size(fd).unwrap_or_else(|_| {
        tracing::warn!(
            cols = fallback.cols,
            rows = fallback.rows,
            "terminal geometry unavailable, using fallback size"
        );
        fallback
    })
}

// ─── TerminalState ──────────────────────────────────────────────────────────

/// An opaque snapshot of a terminal's line-discipline settings.
#[derive(Clone, Copy)]
pub struct TerminalState {
    termios: libc::termios,
}

impl TerminalState {
    /// Read the current settings of `fd`.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::TerminalConfig`] if `tcgetattr` fails (for
    /// example when `fd` is not a terminal).
    pub fn capture(fd: RawFd) -> Result<Self> {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
            return Err(TermError::last_os_config("tcgetattr"));
        }
        Ok(Self { termios })
    }

    /// Install these settings on `fd`, discarding unread input.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::TerminalConfig`] if `tcsetattr` fails.
    pub fn apply(&self, fd: RawFd) -> Result<()> {
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const self.termios) } != 0 {
            return Err(TermError::last_os_config("tcsetattr"));
        }
        Ok(())
    }

    /// Derive raw-mode settings from this snapshot.
    ///
    /// Input arrives byte by byte with no echo, no line editing, no signal
    /// keys, no flow control and no CR→NL mapping. Output is written
    /// verbatim. `read()` returns as soon as one byte is available, or after
    /// `read_timeout_ds` tenths of a second with zero bytes.
    #[must_use]
    pub fn raw(&self, read_timeout_ds: u8) -> Self {
        let mut t = self.termios;

        t.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        t.c_oflag &= !libc::OPOST;
        t.c_cflag |= libc::CS8;
        t.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

        t.c_cc[libc::VMIN] = 0;
        t.c_cc[libc::VTIME] = read_timeout_ds;

        Self { termios: t }
    }

    /// True if every flag word and control character matches `other`.
    #[must_use]
    pub fn same_settings(&self, other: &Self) -> bool {
        let (a, b) = (&self.termios, &other.termios);
        a.c_iflag == b.c_iflag
            && a.c_oflag == b.c_oflag
            && a.c_cflag == b.c_cflag
            && a.c_lflag == b.c_lflag
            && a.c_cc == b.c_cc
    }

    /// True if these settings describe raw mode as produced by [`raw`](Self::raw).
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        let t = &self.termios;
        t.c_lflag & (libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN) == 0
            && t.c_iflag & (libc::ICRNL | libc::IXON) == 0
            && t.c_oflag & libc::OPOST == 0
            && t.c_cflag & libc::CS8 == libc::CS8
    }

    /// The configured `VTIME` read timeout, in tenths of a second.
    #[must_use]
    pub const fn read_timeout_ds(&self) -> u8 {
        self.termios.c_cc[libc::VTIME]
    }
}

impl std::fmt::Debug for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalState")
            .field("c_iflag", &format_args!("{:#x}", self.termios.c_iflag))
            .field("c_oflag", &format_args!("{:#x}", self.termios.c_oflag))
            .field("c_cflag", &format_args!("{:#x}", self.termios.c_cflag))
            .field("c_lflag", &format_args!("{:#x}", self.termios.c_lflag))
            .finish_non_exhaustive()
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the original settings for panic recovery.
///
/// The [`RawMode`] guard owns its own copy, but the panic hook can't reach
/// it. This backup — behind a [`Mutex`], not `static mut` — lets the hook
/// restore the terminal without the guard.
static TERMIOS_BACKUP: Mutex<Option<(RawFd, TerminalState)>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some((fd, ref original)) = *guard {
            let _ = original.apply(fd);
        }
    }
}

/// Complete screen restore sequence for emergency use: reset SGR
/// attributes, show the cursor, leave the alternate screen.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h\x1b[?1049l";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            restore_termios_from_backup();
            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor,
/// bypassing the `io::stdout()` lock.
fn emergency_restore() {
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw mode on one terminal file descriptor, restored exactly once.
///
/// Call [`restore`](Self::restore) on the normal exit path to observe a
/// restore failure. If the guard is dropped instead (early return, `?`,
/// unwinding), the drop restores best-effort.
pub struct RawMode {
    fd: RawFd,
    original: TerminalState,
    restored: bool,
}

impl RawMode {
    /// Capture the settings of `fd` and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::TerminalConfig`] if the settings cannot be read
    /// or the raw settings cannot be installed. In the latter case the
    /// terminal is left as it was.
    pub fn enable(fd: RawFd, read_timeout_ds: u8) -> Result<Self> {
        let original = TerminalState::capture(fd)?;

        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some((fd, original));
        }

        if let Err(e) = original.raw(read_timeout_ds).apply(fd) {
            clear_backup();
            return Err(e);
        }

        tracing::debug!(fd, read_timeout_ds, "raw mode enabled");
        Ok(Self {
            fd,
            original,
            restored: false,
        })
    }

    /// The settings captured before raw mode was installed.
    #[inline]
    #[must_use]
    pub const fn original(&self) -> &TerminalState {
        &self.original
    }

    /// Put the captured settings back.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::TerminalConfig`] if `tcsetattr` fails. The
    /// guard is consumed either way; drop will not retry.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        let result = self.original.apply(self.fd);
        clear_backup();
        tracing::debug!(fd = self.fd, ok = result.is_ok(), "raw mode restored");
        result
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if !self.restored {
            if let Err(e) = self.original.apply(self.fd) {
                tracing::error!(error = %e, "failed to restore terminal settings");
            }
            clear_backup();
        }
    }
}

fn clear_backup() {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        *guard = None;
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch to editor mode (raw input,
/// alternate screen). The terminal is restored by [`leave`](Self::leave),
/// or on drop if `leave` was never reached.
pub struct Terminal {
    /// The terminal device (stdin).
    fd: RawFd,

    /// Present while in editor mode.
    raw: Option<RawMode>,

    /// `VTIME` value installed by `enter`.
    read_timeout_ds: u8,

    /// Size used when the device cannot report one.
    fallback: Size,
}

impl Terminal {
    /// Create a handle on stdin.
    ///
    /// Does not enter raw mode; call [`enter`](Self::enter) for that.
    #[must_use]
    pub const fn new(read_timeout_ds: u8, fallback: Size) -> Self {
        Self::with_fd(libc::STDIN_FILENO, read_timeout_ds, fallback)
    }

    const fn with_fd(fd: RawFd, read_timeout_ds: u8, fallback: Size) -> Self {
        Self {
            fd,
            raw: None,
            read_timeout_ds,
            fallback,
        }
    }

    /// Query the terminal size from the OS.
    ///
    /// Call this at startup and after SIGWINCH. Gives the fallback when the
    /// query fails.
    #[must_use]
    pub fn refresh_size(&self) -> Size {
        size_or(self.fd, self.fallback)
    }

    /// Whether raw mode is currently installed.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.raw.is_some()
    }

    /// Enter editor mode: raw input, alternate screen, cleared screen.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::TerminalConfig`] if raw mode cannot be
    /// installed, or [`TermError::Write`] if the screen sequences cannot be
    /// written (raw mode is rolled back in that case).
    pub fn enter(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }

        install_panic_hook();

        let raw = RawMode::enable(self.fd, self.read_timeout_ds)?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let written = ansi::enter_alt_screen(&mut lock)
            .and_then(|()| ansi::clear_screen(&mut lock))
            .and_then(|()| lock.flush());
        drop(lock);

        if let Err(e) = written {
            raw.restore()?;
            return Err(e.into());
        }

        self.raw = Some(raw);
        Ok(())
    }

    /// Leave editor mode and restore the terminal exactly as captured.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the screen sequences or the termios restore
    /// fail. The termios restore is attempted even if writing failed.
    pub fn leave(&mut self) -> Result<()> {
        let Some(raw) = self.raw.take() else {
            return Ok(());
        };

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let written = ansi::reset(&mut lock)
            .and_then(|()| ansi::cursor_show(&mut lock))
            .and_then(|()| ansi::exit_alt_screen(&mut lock))
            .and_then(|()| lock.flush());
        drop(lock);

        raw.restore()?;
        written.map_err(TermError::from)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.is_active() {
            if let Err(e) = self.leave() {
                tracing::error!(error = %e, "failed to restore terminal on drop");
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A pseudo-terminal pair. The slave side behaves like a real tty for
    /// termios purposes; both fds are closed on drop.
    pub(crate) struct Pty {
        pub master: RawFd,
        pub slave: RawFd,
    }

    impl Pty {
        pub(crate) fn open() -> Self {
            unsafe {
                let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
                assert!(master >= 0, "posix_openpt failed");
                assert_eq!(libc::grantpt(master), 0, "grantpt failed");
                assert_eq!(libc::unlockpt(master), 0, "unlockpt failed");
                let name = libc::ptsname(master);
                assert!(!name.is_null(), "ptsname failed");
                let slave = libc::open(name, libc::O_RDWR | libc::O_NOCTTY);
                assert!(slave >= 0, "open slave failed");
                Self { master, slave }
            }
        }

        pub(crate) fn set_size(&self, cols: u16, rows: u16) {
            let ws = libc::winsize {
                ws_row: rows,
                ws_col: cols,
                ws_xpixel: 0,
                ws_ypixel: 0,
            };
            let rc = unsafe { libc::ioctl(self.master, libc::TIOCSWINSZ, &raw const ws) };
            assert_eq!(rc, 0, "TIOCSWINSZ failed");
        }
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.slave);
                libc::close(self.master);
            }
        }
    }

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn fallback_is_vt100() {
        assert_eq!(Size::FALLBACK, Size { cols: 80, rows: 24 });
    }

    // ── Geometry ──────────────────────────────────────────────────────

    #[test]
    fn get_size_reads_pty_window() {
        let pty = Pty::open();
        pty.set_size(132, 43);
        assert_eq!(get_size(pty.slave).unwrap(), Size { cols: 132, rows: 43 });
    }

    #[test]
    fn get_size_zero_window_is_unavailable() {
        let pty = Pty::open();
        pty.set_size(0, 0);
        assert!(matches!(
            get_size(pty.slave),
            Err(TermError::GeometryUnavailable)
        ));
    }

    #[test]
    fn get_size_on_non_tty_is_unavailable() {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        assert!(matches!(get_size(fds[0]), Err(TermError::GeometryUnavailable)));
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn size_or_applies_fallback() {
        let pty = Pty::open();
        pty.set_size(0, 0);
        let fallback = Size { cols: 100, rows: 30 };
        assert_eq!(size_or(pty.slave, fallback), fallback);
    }

    // ── TerminalState ─────────────────────────────────────────────────

    #[test]
    fn capture_on_non_tty_fails() {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let err = TerminalState::capture(fds[0]).unwrap_err();
        assert!(matches!(err, TermError::TerminalConfig { op: "tcgetattr", .. }));
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn raw_settings_disable_line_discipline() {
        let pty = Pty::open();
        let cooked = TerminalState::capture(pty.slave).unwrap();
        let raw = cooked.raw(1);
        assert!(raw.is_raw());
        assert!(!cooked.same_settings(&raw));
        assert_eq!(raw.read_timeout_ds(), 1);
    }

    #[test]
    fn raw_settings_use_timed_reads() {
        let pty = Pty::open();
        let raw = TerminalState::capture(pty.slave).unwrap().raw(5);
        assert_eq!(raw.termios.c_cc[libc::VMIN], 0);
        assert_eq!(raw.termios.c_cc[libc::VTIME], 5);
    }

    #[test]
    fn snapshot_equals_itself() {
        let pty = Pty::open();
        let a = TerminalState::capture(pty.slave).unwrap();
        let b = TerminalState::capture(pty.slave).unwrap();
        assert!(a.same_settings(&b));
    }

    // ── RawMode ───────────────────────────────────────────────────────

    #[test]
    fn enable_installs_raw_settings() {
        let pty = Pty::open();
        let raw = RawMode::enable(pty.slave, 1).unwrap();
        let live = TerminalState::capture(pty.slave).unwrap();
        assert!(live.is_raw());
        raw.restore().unwrap();
    }

    #[test]
    fn restore_matches_pre_capture_snapshot() {
        let pty = Pty::open();
        let before = TerminalState::capture(pty.slave).unwrap();

        let raw = RawMode::enable(pty.slave, 1).unwrap();
        assert!(raw.original().same_settings(&before));
        raw.restore().unwrap();

        let after = TerminalState::capture(pty.slave).unwrap();
        assert!(before.same_settings(&after), "{before:?} != {after:?}");
    }

    #[test]
    fn drop_restores_settings() {
        let pty = Pty::open();
        let before = TerminalState::capture(pty.slave).unwrap();
        {
            let _raw = RawMode::enable(pty.slave, 1).unwrap();
        }
        let after = TerminalState::capture(pty.slave).unwrap();
        assert!(before.same_settings(&after));
    }

    #[test]
    fn repeated_cycles_restore_each_time() {
        let pty = Pty::open();
        let before = TerminalState::capture(pty.slave).unwrap();
        for timeout in [1, 2, 10] {
            let raw = RawMode::enable(pty.slave, timeout).unwrap();
            assert_eq!(
                TerminalState::capture(pty.slave).unwrap().read_timeout_ds(),
                timeout
            );
            raw.restore().unwrap();
            assert!(before.same_settings(&TerminalState::capture(pty.slave).unwrap()));
        }
    }

    #[test]
    fn enable_on_non_tty_is_config_error() {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        assert!(matches!(
            RawMode::enable(fds[0], 1),
            Err(TermError::TerminalConfig { .. })
        ));
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    // ── Emergency restore sequence ──────────────────────────────────

    #[test]
    fn emergency_restore_exits_alt_screen_last() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.ends_with("\x1b[?1049l"));
        assert!(s.contains("\x1b[?25h"), "must show cursor");
        assert!(s.contains("\x1b[0m"), "must reset SGR attributes");
    }

    // ── Terminal struct ─────────────────────────────────────────────

    #[test]
    fn terminal_new_is_inactive_with_positive_size() {
        let term = Terminal::new(1, Size::FALLBACK);
        assert!(!term.is_active());
        let size = term.refresh_size();
        assert!(size.cols > 0);
        assert!(size.rows > 0);
    }

    #[test]
    fn terminal_leave_without_enter() {
        let mut term = Terminal::new(1, Size::FALLBACK);
        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_reports_pty_size() {
        let pty = Pty::open();
        pty.set_size(100, 40);
        let term = Terminal::with_fd(pty.slave, 1, Size::FALLBACK);
        assert_eq!(term.refresh_size(), Size { cols: 100, rows: 40 });
    }

    /// A terminal in raw mode whose device has been swapped for a pipe,
    /// so restoring it fails.
    fn terminal_with_lost_device(pty: &Pty) -> Terminal {
        let mut term = Terminal::with_fd(pty.slave, 1, Size::FALLBACK);
        term.raw = Some(RawMode::enable(pty.slave, 1).unwrap());

        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        assert!(unsafe { libc::dup2(fds[0], pty.slave) } >= 0);
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
        term
    }

    #[test]
    fn leave_reports_failed_restore() {
        let pty = Pty::open();
        let mut term = terminal_with_lost_device(&pty);
        assert!(term.is_active());
        assert!(matches!(term.leave(), Err(TermError::TerminalConfig { .. })));
        assert!(!term.is_active());
    }

    #[test]
    fn drop_with_failed_restore_does_not_panic() {
        let pty = Pty::open();
        let term = terminal_with_lost_device(&pty);
        assert!(term.is_active());
        drop(term);
    }
}

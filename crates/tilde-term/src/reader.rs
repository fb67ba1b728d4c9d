// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Timed byte reads from the terminal.
//
// Raw mode installs VMIN = 0 / VTIME = n, so one `read()` on the terminal
// returns either a single byte or nothing after n tenths of a second. That
// timeout is the only suspension point in the editor: the loop wakes at
// least once per tick even when no key is pressed, which is enough to
// notice a resize, a termination signal, or an expired status message.
//
// No background thread and no channel. The decoder pulls bytes through the
// `ByteSource` trait, which is also the seam tests use to script input.

use std::io;
use std::os::unix::io::RawFd;

use crate::error::{Result, TermError};

/// A source of single input bytes with a bounded wait.
pub trait ByteSource {
    /// Read one byte.
    ///
    /// Returns `Ok(None)` when the read tick elapsed with no data, which is
    /// normal polling and never an error.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Read`] for any failure other than "no data yet".
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// Reads bytes from a raw-mode terminal file descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FdSource {
    fd: RawFd,
}

impl FdSource {
    /// Read from `fd`. The caller is responsible for raw mode on it.
    #[must_use]
    pub const fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Read from standard input.
    #[must_use]
    pub const fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }
}

impl ByteSource for FdSource {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast::<libc::c_void>(), 1) };

        match n {
            1 => Ok(Some(byte)),
            // VTIME expired with nothing to read.
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(TermError::Read(err)),
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::RawMode;
    use crate::terminal::tests::Pty;

    fn write_all(fd: RawFd, bytes: &[u8]) {
        let n = unsafe { libc::write(fd, bytes.as_ptr().cast::<libc::c_void>(), bytes.len()) };
        assert_eq!(usize::try_from(n).unwrap(), bytes.len());
    }

    #[test]
    fn reads_bytes_in_order() {
        let pty = Pty::open();
        let raw = RawMode::enable(pty.slave, 1).unwrap();
        write_all(pty.master, b"hi");

        let mut src = FdSource::new(pty.slave);
        assert_eq!(src.read_byte().unwrap(), Some(b'h'));
        assert_eq!(src.read_byte().unwrap(), Some(b'i'));
        raw.restore().unwrap();
    }

    #[test]
    fn empty_tick_is_none() {
        let pty = Pty::open();
        let raw = RawMode::enable(pty.slave, 1).unwrap();

        let mut src = FdSource::new(pty.slave);
        assert_eq!(src.read_byte().unwrap(), None);
        raw.restore().unwrap();
    }

    #[test]
    fn raw_mode_passes_carriage_return_through() {
        let pty = Pty::open();
        let raw = RawMode::enable(pty.slave, 1).unwrap();
        write_all(pty.master, b"\r");

        let mut src = FdSource::new(pty.slave);
        assert_eq!(src.read_byte().unwrap(), Some(b'\r'));
        raw.restore().unwrap();
    }

    #[test]
    fn bad_fd_is_fatal() {
        let mut src = FdSource::new(-1);
        assert!(matches!(src.read_byte(), Err(TermError::Read(_))));
    }

    #[test]
    fn mut_ref_is_a_source() {
        let pty = Pty::open();
        let raw = RawMode::enable(pty.slave, 1).unwrap();
        write_all(pty.master, b"x");

        fn pull(mut source: impl ByteSource) -> Option<u8> {
            source.read_byte().unwrap()
        }

        let mut src = FdSource::new(pty.slave);
        assert_eq!(pull(&mut src), Some(b'x'));
        raw.restore().unwrap();
    }
}

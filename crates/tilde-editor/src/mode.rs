//! The editing mode.
//!
//! tilde has a single mode in which keys edit the document directly. The
//! controller still dispatches through a [`Mode`] value, so a second mode
//! is a new variant plus a new dispatch arm.

use std::fmt;

/// The current editing mode.
///
/// Pure data: which mode the editor is in, not how keys are handled there.
/// Key dispatch lives in the controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Keys insert text, arrows move, control keys run commands.
    #[default]
    Normal,
}

impl Mode {
    /// Name shown on the status line.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_normal() {
        assert_eq!(Mode::default(), Mode::Normal);
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(Mode::Normal.to_string(), "NORMAL");
        assert_eq!(Mode::Normal.display_name(), "NORMAL");
    }
}

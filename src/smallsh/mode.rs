//! Switching between normal and foreground-only mode.
//!
//! `SIGTSTP` delivered to the interpreter flips a process-wide flag and announces the new mode on
//! standard output. While the flag is set, a trailing `&` is ignored and every command runs in the
//! foreground. `SIGINT` is ignored by the interpreter itself; foreground children get the default
//! action back so an interrupt only ends the running command.
use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    cutils::{errno, set_errno},
    system::{
        signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalNumber},
        write_all_raw,
    },
};

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Normal,
    ForegroundOnly,
}

impl Mode {
    fn from_flag(foreground_only: bool) -> Self {
        if foreground_only {
            Mode::ForegroundOnly
        } else {
            Mode::Normal
        }
    }

    /// The line announcing that this mode was just entered.
    pub(crate) const fn notice(self) -> &'static str {
        match self {
            Mode::ForegroundOnly => "Entering foreground-only mode (& is now ignored)\n",
            Mode::Normal => "Exiting foreground-only mode\n",
        }
    }
}

/// Flip `flag` and return the mode it now represents. Async-signal-safe.
fn toggle(flag: &AtomicBool) -> Mode {
    let was_foreground_only = flag.fetch_xor(true, Ordering::SeqCst);
    Mode::from_flag(!was_foreground_only)
}

extern "C" fn on_sigtstp(_signal: SignalNumber) {
    let saved_errno = errno();
    let mode = toggle(&FOREGROUND_ONLY);
    write_all_raw(libc::STDOUT_FILENO, mode.notice().as_bytes());
    set_errno(saved_errno);
}

/// Read access to the foreground-only flag for the rest of the interpreter.
pub(crate) struct ModeController {
    flag: &'static AtomicBool,
    observed: Mode,
    _handlers: Vec<SignalHandler>,
}

impl ModeController {
    /// Install the interpreter's signal dispositions and return a controller reading the flag
    /// they drive.
    ///
    /// Dropping the controller restores the previous dispositions.
    pub(crate) fn install() -> io::Result<Self> {
        let handlers = vec![
            SignalHandler::register(SIGTSTP, SignalHandlerBehavior::Catch(on_sigtstp))?,
            SignalHandler::register(SIGINT, SignalHandlerBehavior::Ignore)?,
        ];

        Ok(Self::with_flag(&FOREGROUND_ONLY, handlers))
    }

    /// A controller over a private flag that no signal handler touches.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self::with_flag(Box::leak(Box::new(AtomicBool::new(false))), Vec::new())
    }

    fn with_flag(flag: &'static AtomicBool, handlers: Vec<SignalHandler>) -> Self {
        Self {
            flag,
            observed: Mode::from_flag(flag.load(Ordering::SeqCst)),
            _handlers: handlers,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        Mode::from_flag(self.flag.load(Ordering::SeqCst))
    }

    pub(crate) fn is_foreground_only(&self) -> bool {
        self.mode() == Mode::ForegroundOnly
    }

    /// Whether a command that asked for a background run actually gets one.
    pub(crate) fn effective_background(&self, requested: bool) -> bool {
        requested && !self.is_foreground_only()
    }

    /// Return the current mode if it changed since the previous call.
    pub(crate) fn observe(&mut self) -> Option<Mode> {
        let mode = self.mode();
        if mode == self.observed {
            None
        } else {
            self.observed = mode;
            Some(mode)
        }
    }

    /// Flip the mode as if `SIGTSTP` had arrived, without announcing it.
    #[cfg(test)]
    pub(crate) fn toggle(&self) -> Mode {
        toggle(self.flag)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::{toggle, Mode, ModeController};

    #[test]
    fn toggling_alternates() {
        let flag = AtomicBool::new(false);
        assert_eq!(toggle(&flag), Mode::ForegroundOnly);
        assert_eq!(toggle(&flag), Mode::Normal);
        assert_eq!(toggle(&flag), Mode::ForegroundOnly);
    }

    #[test]
    fn notices() {
        assert_eq!(
            Mode::ForegroundOnly.notice(),
            "Entering foreground-only mode (& is now ignored)\n"
        );
        assert_eq!(Mode::Normal.notice(), "Exiting foreground-only mode\n");
    }

    #[test]
    fn foreground_only_overrides_background() {
        let controller = ModeController::detached();
        assert_eq!(controller.mode(), Mode::Normal);
        assert!(controller.effective_background(true));
        assert!(!controller.effective_background(false));

        controller.toggle();
        assert!(controller.is_foreground_only());
        assert!(!controller.effective_background(true));
        assert!(!controller.effective_background(false));
    }

    #[test]
    fn observe_reports_changes_once() {
        let mut controller = ModeController::detached();
        assert_eq!(controller.observe(), None);

        controller.toggle();
        assert_eq!(controller.observe(), Some(Mode::ForegroundOnly));
        assert_eq!(controller.observe(), None);

        controller.toggle();
        controller.toggle();
        assert_eq!(controller.observe(), None);
    }
}

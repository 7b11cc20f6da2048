use crate::cutils::cerr;

use super::{handler::SignalHandlerBehavior, SignalNumber};

use std::{io, mem::MaybeUninit};

#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        // Interrupted reads and waits are resumed once a catching handler returns.
        let sa_flags = libc::SA_RESTART;

        // A catching handler runs with every other signal blocked so it cannot be re-entered
        // halfway through flipping its state.
        let (sa_sigaction, sa_mask) = match behavior {
            SignalHandlerBehavior::Default => (libc::SIG_DFL, SignalSet::empty()?),
            SignalHandlerBehavior::Ignore => (libc::SIG_IGN, SignalSet::empty()?),
            SignalHandlerBehavior::Catch(handler) => {
                (handler as libc::sighandler_t, SignalSet::full()?)
            }
        };

        // SAFETY: `sigaction` is a C struct, all-zeroes is a valid representation.
        let mut raw: libc::sigaction = unsafe { std::mem::zeroed() };
        raw.sa_sigaction = sa_sigaction;
        raw.sa_mask = sa_mask.raw;
        raw.sa_flags = sa_flags;

        Ok(Self { raw })
    }

    pub(super) fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut original_action = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigaction(signal, &self.raw, original_action.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_action.assume_init() })
    }

    /// Read the action currently installed for `signal` without changing it.
    #[cfg(test)]
    pub(super) fn current(signal: SignalNumber) -> io::Result<Self> {
        let mut action = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigaction(signal, std::ptr::null(), action.as_mut_ptr().cast()) })?;

        Ok(unsafe { action.assume_init() })
    }

    #[cfg(test)]
    pub(super) fn is_ignore(&self) -> bool {
        self.raw.sa_sigaction == libc::SIG_IGN
    }

    #[cfg(test)]
    pub(super) fn is_default(&self) -> bool {
        self.raw.sa_sigaction == libc::SIG_DFL
    }
}

// A signal set that can be used to mask signals.
#[repr(transparent)]
pub(crate) struct SignalSet {
    raw: libc::sigset_t,
}

impl SignalSet {
    /// Create an empty set.
    pub(crate) fn empty() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigemptyset(set.as_mut_ptr().cast()) })?;

        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing all the signals.
    pub(crate) fn full() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigfillset(set.as_mut_ptr().cast()) })?;

        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing only `signal`.
    pub(crate) fn single(signal: SignalNumber) -> io::Result<Self> {
        let mut set = Self::empty()?;

        cerr(unsafe { libc::sigaddset(&mut set.raw, signal) })?;

        Ok(set)
    }

    fn sigprocmask(&self, how: libc::c_int) -> io::Result<Self> {
        let mut original_set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigprocmask(how, &self.raw, original_set.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_set.assume_init() })
    }

    /// Block all the signals in this set and return the previous set of blocked signals.
    ///
    /// After calling this function successfully, the set of blocked signals will be the union of
    /// the previous set of blocked signals and this set.
    pub(crate) fn block(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_BLOCK)
    }

    /// Block only the signals that are in this set and return the previous set of blocked signals.
    ///
    /// After calling this function successfully, the set of blocked signals will be the exactly
    /// this set.
    pub(crate) fn set_mask(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_SETMASK)
    }

    /// Returns whether `signal` is a member of this set.
    #[cfg(test)]
    pub(crate) fn contains(&self, signal: SignalNumber) -> bool {
        unsafe { libc::sigismember(&self.raw, signal) == 1 }
    }
}

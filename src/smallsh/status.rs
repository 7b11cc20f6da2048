use std::{fmt, io};

use crate::system::{signal::SignalNumber, wait::WaitStatus};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    Exited(libc::c_int),
    Signaled(SignalNumber),
}

impl Termination {
    /// Decode a wait status, returning `None` if the child has not terminated.
    pub(crate) fn from_wait_status(status: &WaitStatus) -> Option<Self> {
        if let Some(code) = status.exit_status() {
            Some(Self::Exited(code))
        } else {
            status.term_signal().map(Self::Signaled)
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit value {code}"),
            Termination::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// The outcome of the most recent foreground command, as reported by the `status` builtin.
///
/// Background commands never update it.
#[derive(Debug)]
pub(crate) struct StatusRegister {
    last: Termination,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self {
            last: Termination::Exited(0),
        }
    }
}

impl StatusRegister {
    pub(crate) fn record(&mut self, termination: Termination) {
        self.last = termination;
    }

    #[cfg(test)]
    pub(crate) fn last(&self) -> Termination {
        self.last
    }

    pub(crate) fn report(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(out, "{}", self.last)
    }
}

#[cfg(test)]
mod tests {
    use libc::{SIGKILL, SIGTERM};
    use pretty_assertions::assert_eq;

    use super::{StatusRegister, Termination};
    use crate::system::{
        interface::ProcessId,
        kill,
        wait::{Wait, WaitOptions},
    };

    fn report(register: &StatusRegister) -> String {
        let mut out = Vec::new();
        register.report(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn starts_as_exit_value_zero() {
        let register = StatusRegister::default();
        assert_eq!(register.last(), Termination::Exited(0));
        assert_eq!(report(&register), "exit value 0\n");
    }

    #[test]
    fn reports_the_last_outcome_only() {
        let mut register = StatusRegister::default();

        register.record(Termination::Signaled(SIGTERM));
        assert_eq!(register.last(), Termination::Signaled(SIGTERM));
        assert_eq!(report(&register), format!("terminated by signal {SIGTERM}\n"));

        register.record(Termination::Exited(1));
        assert_eq!(register.last(), Termination::Exited(1));
        assert_eq!(report(&register), "exit value 1\n");
    }

    #[test]
    fn decodes_wait_statuses() {
        let child = std::process::Command::new("sh")
            .args(["-c", "exit 3"])
            .spawn()
            .unwrap();
        let (_, status) = ProcessId::new(child.id() as i32)
            .wait(WaitOptions::new())
            .unwrap();
        assert_eq!(
            Termination::from_wait_status(&status),
            Some(Termination::Exited(3))
        );

        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();
        let pid = ProcessId::new(child.id() as i32);
        kill(pid, SIGKILL).unwrap();
        let (_, status) = pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(
            Termination::from_wait_status(&status),
            Some(Termination::Signaled(SIGKILL))
        );
    }
}

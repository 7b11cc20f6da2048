use crate::system::interface::ProcessId;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Creating a process for a command failed. This is fatal to the interpreter.
    Fork(std::io::Error),
    /// Waiting for a foreground command failed.
    Wait(ProcessId, std::io::Error),
    /// A command line that cannot be handed to the operating system.
    InvalidCommand(String),
    Options(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Fork(e) => write!(f, "fork failed: {e}"),
            Error::Wait(pid, e) => write!(f, "cannot wait for process {pid}: {e}"),
            Error::InvalidCommand(c) => write!(f, "'{c}': invalid command"),
            Error::Options(e) => write!(f, "{e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl Error {
    /// Returns `true` if the interpreter cannot keep running after this error, which is only the
    /// case for [`Error::Fork`].
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fork(_))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;
    use crate::system::interface::ProcessId;

    #[test]
    fn messages() {
        let err = Error::Fork(io::Error::from_raw_os_error(libc::EAGAIN));
        assert!(err.to_string().starts_with("fork failed: "));
        assert!(err.is_fatal());

        let err = Error::Wait(ProcessId::new(12), io::Error::from_raw_os_error(libc::ECHILD));
        assert!(err.to_string().starts_with("cannot wait for process 12: "));
        assert!(!err.is_fatal());

        assert_eq!(
            Error::InvalidCommand("ec\0ho".escape_default().to_string()).to_string(),
            "'ec\\u{0}ho': invalid command"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(err.to_string(), "IO error: boom");
        assert!(!err.is_fatal());
    }
}

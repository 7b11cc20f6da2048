use std::{
    ffi::{CStr, CString},
    io,
    os::fd::RawFd,
};

use crate::cutils::cerr;
use interface::ProcessId;

use self::signal::SignalNumber;

// generalized traits for when we want to hide implementations
pub mod interface;

pub mod signal;

pub mod wait;

pub(crate) fn _exit(status: libc::c_int) -> ! {
    unsafe { libc::_exit(status) }
}

pub(crate) enum ForkResult {
    // Parent process branch with the child process' PID.
    Parent(ProcessId),
    // Child process branch.
    Child,
}

/// Create a new process.
///
/// Until it calls `execve` or `_exit`, the child may only use async-signal-safe functions: any
/// other thread of the parent may have held a lock at the time of the fork.
pub(crate) fn fork() -> io::Result<ForkResult> {
    // SAFETY: `fork` has no memory safety preconditions, the restrictions above are about
    // deadlocks in the child.
    let pid = cerr(unsafe { libc::fork() })?;
    if pid == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent(ProcessId::new(pid)))
    }
}

/// Send a signal to a process with the specified ID.
pub fn kill(pid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::kill(pid.get(), signal) }).map(|_| ())
}

/// Change the working directory of the current process.
pub fn chdir<S: AsRef<CStr>>(path: &S) -> io::Result<()> {
    cerr(unsafe { libc::chdir(path.as_ref().as_ptr()) }).map(|_| ())
}

/// Open `path` with the given `open(2)` flags, creating it with mode `0644` if `O_CREAT` is set.
///
/// The returned descriptor is close-on-exec; duplicating it with [`dup2`] yields a descriptor
/// that survives `exec`. This only calls async-signal-safe functions.
pub(crate) fn open(path: &CStr, flags: libc::c_int) -> io::Result<RawFd> {
    cerr(unsafe { libc::open(path.as_ptr(), flags | libc::O_CLOEXEC, 0o644 as libc::c_uint) })
}

/// Make `new` refer to the same open file as `old`.
pub(crate) fn dup2(old: RawFd, new: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::dup2(old, new) }).map(|_| ())
}

pub(crate) fn close(fd: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::close(fd) }).map(|_| ())
}

/// Write the whole buffer to `fd` without any buffering or allocation.
///
/// Safe to call from a signal handler or between `fork` and `exec`.
pub(crate) fn write_all_raw(fd: RawFd, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let written = unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) };
        if written <= 0 {
            if written == -1 && io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return;
        }
        bytes = &bytes[written as usize..];
    }
}

/// Replace the image of the current process, searching `PATH` for `argv[0]`.
///
/// `argv` must be a null terminated array of pointers into live C strings. This function only
/// returns if the replacement failed.
pub(crate) fn execvp(argv: &[*const libc::c_char]) -> io::Error {
    debug_assert!(argv.last().is_some_and(|ptr| ptr.is_null()));

    unsafe { libc::execvp(argv[0], argv.as_ptr()) };

    io::Error::last_os_error()
}

pub struct Process;

impl Process {
    /// Return the process identifier for the current process
    pub fn process_id() -> ProcessId {
        // NOTE libstd casts the `i32` that `libc::getpid` returns into `u32`
        // here we cast it back into `i32` (`ProcessId`)
        ProcessId::new(std::process::id() as libc::pid_t)
    }
}

/// Build a C string out of `s`, failing if it contains an interior NUL byte.
pub(crate) fn c_string(s: &str) -> io::Result<CString> {
    CString::new(s).map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
}

#[cfg(test)]
mod tests {
    use std::{ffi::CString, process::exit};

    use libc::{SIGKILL, SIGTERM};

    use super::{
        c_string, chdir, fork,
        wait::{Wait, WaitOptions},
        ForkResult, Process,
    };

    #[test]
    fn kill_test() {
        let mut child = std::process::Command::new("/bin/sleep")
            .arg("1")
            .spawn()
            .unwrap();
        super::kill(super::ProcessId::new(child.id() as i32), SIGKILL).unwrap();
        assert!(!child.wait().unwrap().success());
    }

    #[test]
    fn kill_missing_process_fails() {
        // pid_max on linux never reaches i32::MAX
        let err = super::kill(super::ProcessId::new(i32::MAX), SIGTERM).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ESRCH));
    }

    #[test]
    fn process_id_matches_libc() {
        assert_eq!(Process::process_id().get(), unsafe { libc::getpid() });
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(c_string("a\0b").is_err());
        assert_eq!(c_string("ab").unwrap(), CString::new("ab").unwrap());
    }

    #[test]
    fn chdir_in_child() {
        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            let ok = chdir(&c_string("/").unwrap()).is_ok()
                && std::env::current_dir().unwrap() == std::path::Path::new("/")
                && chdir(&c_string("/definitely/not/here").unwrap()).is_err();
            exit(if ok { 0 } else { 1 })
        };

        let (_, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(0));
    }

    #[test]
    fn exec_failure_returns_error() {
        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            let program = c_string("/definitely/not/a/program").unwrap();
            let argv = [program.as_ptr(), std::ptr::null()];
            let err = super::execvp(&argv);
            super::_exit(if err.raw_os_error() == Some(libc::ENOENT) {
                7
            } else {
                1
            })
        };

        let (_, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(7));
    }
}

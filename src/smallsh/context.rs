use std::io;

use crate::system::Process;

use super::{jobs::JobTable, mode::ModeController, status::StatusRegister, MAX_JOBS};

/// The interpreter state shared by the launcher and the builtins.
pub(crate) struct ShellContext<W: io::Write> {
    /// Where protocol lines and the prompt go.
    pub(crate) out: W,
    pub(crate) status: StatusRegister,
    pub(crate) jobs: JobTable,
    pub(crate) mode: ModeController,
    /// The interpreter's own process ID, substituted for `$$`.
    pub(crate) pid: String,
}

impl<W: io::Write> ShellContext<W> {
    pub(crate) fn new(out: W, mode: ModeController) -> Self {
        Self {
            out,
            status: StatusRegister::default(),
            jobs: JobTable::with_capacity(MAX_JOBS),
            mode,
            pid: Process::process_id().to_string(),
        }
    }

    /// Reap finished background jobs, reporting each one on the output sink.
    pub(crate) fn sweep_jobs(&mut self) -> io::Result<()> {
        self.jobs.sweep(&mut self.out)?;
        Ok(())
    }
}

#[cfg(test)]
impl ShellContext<Vec<u8>> {
    /// A context writing into memory that never touches the process' signal dispositions.
    pub(crate) fn for_test() -> Self {
        Self::new(Vec::new(), ModeController::detached())
    }

    /// Take everything written so far.
    pub(crate) fn take_output(&mut self) -> String {
        String::from_utf8(std::mem::take(&mut self.out)).unwrap()
    }
}

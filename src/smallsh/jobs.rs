use std::{fmt, io};

use crate::{
    log::{dev_info, dev_warn},
    system::{
        interface::ProcessId,
        kill,
        signal::consts::SIGTERM,
        wait::{Wait, WaitError, WaitOptions},
    },
};

use super::status::Termination;

/// Reasons why [`JobTable::register`] did not track a process.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RegisterError {
    Full(ProcessId),
    InvalidPid(ProcessId),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::Full(pid) => write!(f, "job table is full, not tracking {pid}"),
            RegisterError::InvalidPid(pid) => write!(f, "{pid} is not a valid process ID"),
        }
    }
}

/// A fixed-capacity table of background processes that have not been reaped yet.
pub(crate) struct JobTable {
    slots: Box<[Option<ProcessId>]>,
}

impl JobTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
        }
    }

    /// Track `pid` in the first free slot and return the slot index.
    pub(crate) fn register(&mut self, pid: ProcessId) -> Result<usize, RegisterError> {
        if !pid.is_valid() {
            return Err(RegisterError::InvalidPid(pid));
        }

        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(RegisterError::Full(pid))?;

        *slot = Some(pid);
        Ok(index)
    }

    /// Reap every tracked process that has terminated, without blocking.
    ///
    /// Each reaped process frees its slot and gets a completion line written to `out`. Processes
    /// that cannot be waited for anymore are dropped silently.
    pub(crate) fn sweep(
        &mut self,
        out: &mut impl io::Write,
    ) -> io::Result<Vec<(ProcessId, Termination)>> {
        let mut reaped = Vec::new();

        for slot in self.slots.iter_mut() {
            let Some(pid) = *slot else {
                continue;
            };

            match pid.wait(WaitOptions::new().no_hang()) {
                Err(WaitError::NotReady) => {}
                Err(WaitError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(WaitError::Io(err)) => {
                    dev_warn!("forgetting background process {pid}: {err}");
                    *slot = None;
                }
                Ok((_, status)) => {
                    let Some(termination) = Termination::from_wait_status(&status) else {
                        continue;
                    };
                    *slot = None;
                    dev_info!("background process {pid} is done: {status:?}");
                    writeln!(out, "background pid {pid} is done: {termination}")?;
                    reaped.push((pid, termination));
                }
            }
        }

        Ok(reaped)
    }

    /// Ask every tracked process to terminate.
    ///
    /// Returns the number of processes that were signaled. This does not wait for them.
    pub(crate) fn terminate_all(&self) -> usize {
        self.pids()
            .filter(|&pid| match kill(pid, SIGTERM) {
                Ok(()) => true,
                Err(err) => {
                    dev_warn!("cannot terminate background process {pid}: {err}");
                    false
                }
            })
            .count()
    }

    pub(crate) fn pids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.slots.iter().flatten().copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pids().count()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

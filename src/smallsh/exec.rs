use std::{
    ffi::CString,
    io::{self, Write},
};

use libc::{c_char, STDOUT_FILENO};

use crate::{
    common::Error,
    log::{dev_info, dev_warn},
    system::{
        _exit, c_string, execvp, fork,
        interface::ProcessId,
        signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalSet},
        wait::{Wait, WaitError, WaitOptions},
        write_all_raw, ForkResult,
    },
};

use super::{
    context::ShellContext, parser::ParsedCommand, redirect::RedirectionPlan, status::Termination,
};

/// What happened to a command handed to [`launch`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Launched {
    /// The command ran in the foreground and terminated.
    Foreground(Termination),
    /// The command was started in the background and is tracked as a job.
    Background(ProcessId),
}

/// Everything the child needs, built before forking so the child does not allocate.
struct PreparedCommand {
    // Owns the strings `argv` points into.
    _arguments: Vec<CString>,
    argv: Vec<*const c_char>,
    not_found: String,
    redirections: RedirectionPlan,
    background: bool,
}

impl PreparedCommand {
    fn new(command: &ParsedCommand, background: bool) -> Result<Self, Error> {
        let invalid = || Error::InvalidCommand(command.program().escape_default().to_string());

        let arguments = command
            .arguments
            .iter()
            .map(|argument| c_string(argument))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|_| invalid())?;

        let argv = arguments
            .iter()
            .map(|argument| argument.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();

        let redirections = RedirectionPlan::new(command, background).map_err(|_| invalid())?;

        Ok(Self {
            _arguments: arguments,
            argv,
            not_found: format!("{}: No such file or directory\n", command.program()),
            redirections,
            background,
        })
    }

    /// Set up the child's signal dispositions and streams, then replace its image.
    fn exec(&self, original_mask: Option<&SignalSet>) -> ! {
        // Only the interpreter toggles foreground-only mode.
        if let Ok(handler) = SignalHandler::register(SIGTSTP, SignalHandlerBehavior::Ignore) {
            handler.forget();
        }

        // Background commands keep ignoring interrupts, foreground ones can be interrupted.
        if !self.background {
            if let Ok(handler) = SignalHandler::register(SIGINT, SignalHandlerBehavior::Default) {
                handler.forget();
            }
        }

        if let Some(set) = original_mask {
            set.set_mask().ok();
        }

        if let Err(message) = self.redirections.apply() {
            write_all_raw(STDOUT_FILENO, message.as_bytes());
            _exit(1);
        }

        execvp(&self.argv);

        write_all_raw(STDOUT_FILENO, self.not_found.as_bytes());
        _exit(1)
    }
}

/// Run an external command.
///
/// A foreground command is waited for, its termination is recorded in the status register and
/// printed if it was killed by a signal. A background command is announced and tracked. Finished
/// background jobs are reaped before returning.
///
/// Only a failing `fork` leaves the interpreter unable to continue, see [`Error::is_fatal`].
pub(crate) fn launch<W: Write>(
    command: &ParsedCommand,
    context: &mut ShellContext<W>,
) -> Result<Launched, Error> {
    let background = context.mode.effective_background(command.background);
    if command.background && !background {
        dev_info!("running {} in the foreground", command.program());
    }

    let prepared = PreparedCommand::new(command, background)?;

    // Children must not inherit anything still sitting in our buffer.
    context.out.flush()?;

    // Keep SIGTSTP from reaching the child before it has ignored it.
    let original_mask = match SignalSet::single(SIGTSTP).and_then(|set| set.block()) {
        Ok(original_mask) => Some(original_mask),
        Err(err) => {
            dev_warn!("cannot block SIGTSTP: {err}");
            None
        }
    };

    let ForkResult::Parent(child_pid) = fork().map_err(|err| {
        dev_warn!("unable to fork command process: {err}");
        restore_mask(original_mask.as_ref());
        Error::Fork(err)
    })?
    else {
        prepared.exec(original_mask.as_ref())
    };

    restore_mask(original_mask.as_ref());

    dev_info!("started {} with pid {child_pid}", command.program());

    let launched = if background {
        writeln!(context.out, "background pid is {child_pid}")?;
        if let Err(err) = context.jobs.register(child_pid) {
            dev_warn!("{err}");
        }
        Launched::Background(child_pid)
    } else {
        let termination = wait_foreground(child_pid)?;
        context.status.record(termination);
        if let Termination::Signaled(_) = termination {
            context.status.report(&mut context.out)?;
        }
        Launched::Foreground(termination)
    };

    context.sweep_jobs()?;
    context.out.flush()?;

    Ok(launched)
}

fn restore_mask(original_mask: Option<&SignalSet>) {
    if let Some(set) = original_mask {
        if let Err(err) = set.set_mask() {
            dev_warn!("cannot restore signal mask: {err}");
        }
    }
}

fn wait_foreground(child_pid: ProcessId) -> Result<Termination, Error> {
    loop {
        match child_pid.wait(WaitOptions::new()) {
            Ok((_, status)) => {
                if let Some(termination) = Termination::from_wait_status(&status) {
                    dev_info!("foreground process {child_pid} finished: {status:?}");
                    return Ok(termination);
                }
            }
            Err(WaitError::NotReady) => {}
            Err(WaitError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(WaitError::Io(err)) => return Err(Error::Wait(child_pid, err)),
        }
    }
}

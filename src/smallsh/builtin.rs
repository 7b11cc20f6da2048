use std::{env, io};

use crate::{
    log::{dev_debug, dev_info},
    system::{c_string, chdir},
};

use super::{context::ShellContext, parser::ParsedCommand};

/// Commands handled by the interpreter itself instead of a child process.
///
/// Builtins never run in the background and ignore any redirection on their line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Exit,
    Cd,
    Status,
}

/// Whether the read loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit(i32),
}

impl Builtin {
    pub(crate) fn lookup(program: &str) -> Option<Self> {
        match program {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "status" => Some(Builtin::Status),
            _ => None,
        }
    }

    pub(crate) fn run<W: io::Write>(
        self,
        command: &ParsedCommand,
        context: &mut ShellContext<W>,
    ) -> io::Result<Flow> {
        match self {
            Builtin::Exit => Ok(Flow::Exit(exit(context))),
            Builtin::Cd => {
                cd(command.arguments.get(1).map(String::as_str));
                Ok(Flow::Continue)
            }
            Builtin::Status => {
                context.status.report(&mut context.out)?;
                context.out.flush()?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Ask every background job to terminate and return the interpreter's exit code.
///
/// Does not wait for the jobs to actually die.
pub(crate) fn exit<W: io::Write>(context: &mut ShellContext<W>) -> i32 {
    let signaled = context.jobs.terminate_all();
    dev_info!("sent SIGTERM to {signaled} background job(s)");
    0
}

fn cd(target: Option<&str>) {
    let target = match target {
        Some(target) => target.to_string(),
        None => match env::var("HOME") {
            Ok(home) => home,
            Err(err) => {
                dev_debug!("cd: cannot read HOME: {err}");
                return;
            }
        },
    };

    if let Err(err) = c_string(&target).and_then(|path| chdir(&path)) {
        dev_debug!("cd: cannot change to {target:?}: {err}");
    }
}

#![forbid(unsafe_code)]

use std::io::{self, BufRead, Write};

use crate::common::Error;
use crate::log::{dev_info, user_error, user_warn};

use self::{
    builtin::{Builtin, Flow},
    cli::{SmallshAction, SmallshRunOptions},
    context::ShellContext,
    exec::launch,
    expand::expand_pid,
    help::{long_help_message, USAGE_MSG},
    mode::ModeController,
    parser::ParsedCommand,
};

mod builtin;
mod cli;
mod context;
mod exec;
mod expand;
mod help;
mod jobs;
mod mode;
mod parser;
mod redirect;
mod status;

/// Longest accepted command line, not counting the newline.
pub(crate) const MAX_LINE_LENGTH: usize = 2048;
/// Most argument slots a command can have, the program included.
pub(crate) const MAX_ARGS: usize = 512;
/// Most background jobs tracked at once.
pub(crate) const MAX_JOBS: usize = 100;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The read-execute loop.
pub(crate) struct Shell<W: Write> {
    context: ShellContext<W>,
    prompt: Option<String>,
}

impl<W: Write> Shell<W> {
    pub(crate) fn new(context: ShellContext<W>, prompt: Option<String>) -> Self {
        Self { context, prompt }
    }

    /// Run commands read from `input` until `exit` or end of input, returning the exit code.
    pub(crate) fn run(&mut self, mut input: impl BufRead) -> Result<i32, Error> {
        let mut buf = Vec::with_capacity(MAX_LINE_LENGTH + 1);

        loop {
            self.show_prompt()?;

            buf.clear();
            let read = input.read_until(b'\n', &mut buf)?;

            self.context.sweep_jobs()?;
            if let Some(mode) = self.context.mode.observe() {
                dev_info!("now in {mode:?} mode");
            }

            if read == 0 {
                dev_info!("end of input");
                let code = builtin::exit(&mut self.context);
                return self.finish(code);
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                user_warn!("line is not valid UTF-8, ignored");
                continue;
            };
            match self.execute_line(line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return self.finish(code),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => user_error!("{err}"),
            }
        }
    }

    fn show_prompt(&mut self) -> io::Result<()> {
        if let Some(prompt) = &self.prompt {
            self.context.out.write_all(prompt.as_bytes())?;
        }
        self.context.out.flush()
    }

    fn finish(&mut self, code: i32) -> Result<i32, Error> {
        self.context.out.flush()?;
        Ok(code)
    }

    /// Run a single line, newline included or not.
    fn execute_line(&mut self, line: &str) -> Result<Flow, Error> {
        let line = line.strip_suffix('\n').unwrap_or(line);

        if line.trim_matches([' ', '\t']).is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }

        let length = line.chars().count();
        if length > MAX_LINE_LENGTH {
            user_warn!("line too long ({length} characters, at most {MAX_LINE_LENGTH} allowed)");
            return Ok(Flow::Continue);
        }

        let expanded = expand_pid(line, &self.context.pid);
        let command = ParsedCommand::parse(&expanded);

        if let Some(builtin) = Builtin::lookup(command.program()) {
            return Ok(builtin.run(&command, &mut self.context)?);
        }

        launch(&command, &mut self.context)?;
        Ok(Flow::Continue)
    }
}

fn run(options: SmallshRunOptions) -> Result<i32, Error> {
    let mode = ModeController::install()?;
    let context = ShellContext::new(io::stdout().lock(), mode);

    Shell::new(context, options.prompt).run(io::stdin().lock())
}

pub fn main() {
    crate::log::ShellLogger::new("smallsh: ").into_global_logger();

    let action = match SmallshAction::from_env().map_err(Error::Options) {
        Ok(action) => action,
        Err(error) => {
            eprintln_ignore_io_error!("smallsh: {error}\n{USAGE_MSG}");
            std::process::exit(1);
        }
    };

    match action {
        SmallshAction::Help(_) => {
            println_ignore_io_error!("{}", long_help_message());
            std::process::exit(0);
        }
        SmallshAction::Version(_) => {
            println_ignore_io_error!("smallsh-rs {VERSION}");
            std::process::exit(0);
        }
        SmallshAction::Run(options) => match run(options) {
            Ok(code) => std::process::exit(code),
            Err(error) => {
                user_error!("{error}");
                std::process::exit(1);
            }
        },
    }
}

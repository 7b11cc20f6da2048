#[cfg(test)]
use std::ffi::CStr;
use std::{ffi::CString, io, os::fd::RawFd};

use libc::{O_CREAT, O_RDONLY, O_TRUNC, O_WRONLY, STDIN_FILENO, STDOUT_FILENO};

use crate::system::{c_string, close, dup2, open};

use super::parser::ParsedCommand;

const NULL_DEVICE: &str = "/dev/null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

impl Direction {
    fn fd(self) -> RawFd {
        match self {
            Direction::Input => STDIN_FILENO,
            Direction::Output => STDOUT_FILENO,
        }
    }

    fn flags(self) -> libc::c_int {
        match self {
            Direction::Input => O_RDONLY,
            Direction::Output => O_WRONLY | O_CREAT | O_TRUNC,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// A standard stream to be replaced before the program image is.
struct Redirection {
    direction: Direction,
    path: CString,
    failure: String,
}

impl Redirection {
    fn new(direction: Direction, path: &str) -> io::Result<Self> {
        Ok(Self {
            direction,
            path: c_string(path)?,
            failure: format!("cannot open {path} for {}\n", direction.name()),
        })
    }

    fn apply(&self) -> io::Result<()> {
        let fd = open(&self.path, self.direction.flags())?;
        let target = self.direction.fd();
        let result = dup2(fd, target);
        if fd != target {
            close(fd).ok();
        }
        result
    }
}

/// The stream replacements a child performs between `fork` and `exec`.
///
/// An explicit `<`/`>` target always wins. Without one, a background command reads from and
/// writes to the null device; a foreground command keeps the interpreter's streams.
///
/// Everything is prepared up front so that [`RedirectionPlan::apply`] does not allocate.
pub(crate) struct RedirectionPlan {
    steps: Vec<Redirection>,
}

impl RedirectionPlan {
    pub(crate) fn new(command: &ParsedCommand, background: bool) -> io::Result<Self> {
        let mut steps = Vec::with_capacity(2);

        for (direction, target) in [
            (Direction::Input, &command.input),
            (Direction::Output, &command.output),
        ] {
            match target {
                Some(path) => steps.push(Redirection::new(direction, path)?),
                None if background => steps.push(Redirection::new(direction, NULL_DEVICE)?),
                None => {}
            }
        }

        Ok(Self { steps })
    }

    /// Replace the standard streams of the current process.
    ///
    /// Stops at the first failure and returns the message describing it. Only calls
    /// async-signal-safe functions.
    pub(crate) fn apply(&self) -> Result<(), &str> {
        for step in &self.steps {
            if step.apply().is_err() {
                return Err(&step.failure);
            }
        }
        Ok(())
    }

    /// The file each standard stream will be connected to, in application order.
    #[cfg(test)]
    pub(crate) fn targets(&self) -> impl Iterator<Item = (RawFd, &CStr)> {
        self.steps
            .iter()
            .map(|step| (step.direction.fd(), step.path.as_c_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        ffi::CStr,
        io::{Read, Write},
        os::fd::RawFd,
        process::exit,
    };

    use libc::{STDIN_FILENO, STDOUT_FILENO};
    use pretty_assertions::assert_eq;

    use super::RedirectionPlan;
    use crate::{
        smallsh::parser::ParsedCommand,
        system::{
            fork,
            wait::{Wait, WaitOptions},
            ForkResult,
        },
    };

    fn targets(line: &str, background: bool) -> Vec<(RawFd, String)> {
        let plan = RedirectionPlan::new(&ParsedCommand::parse(line), background).unwrap();
        plan.targets()
            .map(|(fd, path): (RawFd, &CStr)| (fd, path.to_str().unwrap().to_string()))
            .collect()
    }

    #[test]
    fn foreground_without_redirection_touches_nothing() {
        assert_eq!(targets("ls -l", false), vec![]);
    }

    #[test]
    fn background_defaults_to_null_device() {
        assert_eq!(
            targets("sleep 5 &", true),
            vec![
                (STDIN_FILENO, "/dev/null".to_string()),
                (STDOUT_FILENO, "/dev/null".to_string())
            ]
        );
    }

    #[test]
    fn explicit_targets_win_over_null_device() {
        assert_eq!(
            targets("sort < in > out &", true),
            vec![
                (STDIN_FILENO, "in".to_string()),
                (STDOUT_FILENO, "out".to_string())
            ]
        );
        assert_eq!(
            targets("sort > out &", true),
            vec![
                (STDIN_FILENO, "/dev/null".to_string()),
                (STDOUT_FILENO, "out".to_string())
            ]
        );
        assert_eq!(
            targets("sort < in", false),
            vec![(STDIN_FILENO, "in".to_string())]
        );
    }

    #[test]
    fn interior_nul_cannot_be_planned() {
        let command = ParsedCommand::parse("cat < a\0b");
        assert!(RedirectionPlan::new(&command, false).is_err());
    }

    #[test]
    fn failure_names_the_path_and_direction() {
        let plan =
            RedirectionPlan::new(&ParsedCommand::parse("cat < /no/such/file"), false).unwrap();
        assert_eq!(plan.apply(), Err("cannot open /no/such/file for input\n"));

        let plan =
            RedirectionPlan::new(&ParsedCommand::parse("ls > /no/such/dir/out"), false).unwrap();
        assert_eq!(plan.apply(), Err("cannot open /no/such/dir/out for output\n"));
    }

    #[test]
    fn applied_in_a_child() {
        let dir = std::env::temp_dir().join(format!("smallsh_redirect_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.txt");
        let output = dir.join("out.txt");
        std::fs::write(&input, "hello from a file\n").unwrap();
        std::fs::write(&output, "stale content that must be truncated\n").unwrap();

        let line = format!("cat < {} > {}", input.display(), output.display());
        let plan = RedirectionPlan::new(&ParsedCommand::parse(&line), false).unwrap();

        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            if plan.apply().is_err() {
                exit(2);
            }
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap();
            std::io::stdout().write_all(buf.as_bytes()).unwrap();
            std::io::stdout().flush().unwrap();
            exit(0)
        };

        let (_, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(0));
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "hello from a file\n"
        );

        std::fs::remove_dir_all(dir).ok();
    }
}

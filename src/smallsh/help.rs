pub const USAGE_MSG: &str = "Usage: smallsh [-q | -p <prompt>]";

const DESCRIPTOR: &str = "Read commands from standard input, one per line, and run them.
`$$` expands to the process ID of the shell. `<` and `>` redirect the standard input and
output of a command, a trailing `&` runs it in the background. The builtins are `exit`,
`cd` and `status`. SIGTSTP toggles foreground-only mode.";

const HELP_MSG: &str = "Options:
-p, --prompt <prompt>   print <prompt> before reading each line (default ': ')
-q, --quiet             do not print a prompt

-h, --help              display this help
-V, --version           display version
";

pub fn long_help_message() -> String {
    format!("{USAGE_MSG}\n\n{DESCRIPTOR}\n\n{HELP_MSG}")
}

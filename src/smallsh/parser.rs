//! Turning an expanded input line into a [`ParsedCommand`].
//!
//! The grammar is deliberately tiny:
//!
//! * fields are separated by single spaces; there is no quoting or escaping, and two consecutive
//!   spaces produce an empty field;
//! * the first field is always the program;
//! * a field that is exactly `<` or `>` makes the next field the input or output target;
//! * once a redirection operator has been seen, plain fields are no longer arguments, so
//!   redirections must trail every argument;
//! * a final field that is exactly `&` requests a background run and is not an argument.
//!
//! An operator without a following field yields an empty target path, which later fails to open.
use crate::log::dev_warn;

use super::MAX_ARGS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedCommand {
    /// Never empty; the first element is the program.
    pub(crate) arguments: Vec<String>,
    pub(crate) input: Option<String>,
    pub(crate) output: Option<String>,
    pub(crate) background: bool,
}

#[derive(Clone, Copy)]
enum Target {
    Input,
    Output,
}

impl ParsedCommand {
    pub(crate) fn parse(line: &str) -> Self {
        let fields: Vec<&str> = line.split(' ').collect();
        let last = fields.len() - 1;

        let mut command = ParsedCommand {
            arguments: vec![fields[0].to_string()],
            input: None,
            output: None,
            background: false,
        };

        let mut redirect_seen = false;
        let mut pending: Option<Target> = None;

        for (index, field) in fields.iter().copied().enumerate().skip(1) {
            if let Some(target) = pending.take() {
                command.set_target(target, field);
                continue;
            }

            match field {
                "&" if index == last => command.background = true,
                "<" => {
                    redirect_seen = true;
                    pending = Some(Target::Input);
                }
                ">" => {
                    redirect_seen = true;
                    pending = Some(Target::Output);
                }
                _ if redirect_seen => {}
                _ if command.arguments.len() >= MAX_ARGS => {
                    dev_warn!("dropping argument {field:?}: more than {MAX_ARGS} arguments");
                }
                _ => command.arguments.push(field.to_string()),
            }
        }

        if let Some(target) = pending {
            command.set_target(target, "");
        }

        command
    }

    fn set_target(&mut self, target: Target, path: &str) {
        let slot = match target {
            Target::Input => &mut self.input,
            Target::Output => &mut self.output,
        };
        *slot = Some(path.to_string());
    }

    pub(crate) fn program(&self) -> &str {
        &self.arguments[0]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::ParsedCommand;
    use crate::smallsh::MAX_ARGS;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_command_is_split_on_spaces() {
        let line = "ls -la /tmp";
        let command = ParsedCommand::parse(line);
        assert_eq!(
            command,
            ParsedCommand {
                arguments: args(&["ls", "-la", "/tmp"]),
                input: None,
                output: None,
                background: false,
            }
        );
        assert_eq!(command.program(), "ls");
        assert_eq!(command.arguments, line.split(' ').collect::<Vec<_>>());
    }

    #[test]
    fn double_spaces_keep_empty_fields() {
        let command = ParsedCommand::parse("echo  a");
        assert_eq!(command.arguments, args(&["echo", "", "a"]));
    }

    #[test]
    fn single_word() {
        let command = ParsedCommand::parse("pwd");
        assert_eq!(command.arguments, args(&["pwd"]));
        assert!(!command.background);
    }

    #[test]
    fn trailing_ampersand_requests_background() {
        let command = ParsedCommand::parse("sleep 5 &");
        assert_eq!(command.arguments, args(&["sleep", "5"]));
        assert!(command.background);
    }

    #[test]
    fn attached_ampersand_is_an_argument() {
        let command = ParsedCommand::parse("echo foo&");
        assert_eq!(command.arguments, args(&["echo", "foo&"]));
        assert!(!command.background);
    }

    #[test]
    fn ampersand_elsewhere_is_an_argument() {
        let command = ParsedCommand::parse("echo & done");
        assert_eq!(command.arguments, args(&["echo", "&", "done"]));
        assert!(!command.background);

        let command = ParsedCommand::parse("&");
        assert_eq!(command.program(), "&");
        assert!(!command.background);
    }

    #[test]
    fn redirections() {
        let command = ParsedCommand::parse("sort -r < in.txt > out.txt");
        assert_eq!(
            command,
            ParsedCommand {
                arguments: args(&["sort", "-r"]),
                input: Some("in.txt".into()),
                output: Some("out.txt".into()),
                background: false,
            }
        );
    }

    #[test]
    fn redirection_with_background() {
        let command = ParsedCommand::parse("wc > counts &");
        assert_eq!(command.arguments, args(&["wc"]));
        assert_eq!(command.output.as_deref(), Some("counts"));
        assert_eq!(command.input, None);
        assert!(command.background);
    }

    #[test]
    fn fields_after_a_redirection_are_not_arguments() {
        let command = ParsedCommand::parse("echo a > out b c");
        assert_eq!(command.arguments, args(&["echo", "a"]));
        assert_eq!(command.output.as_deref(), Some("out"));
    }

    #[test]
    fn attached_operators_are_plain_fields() {
        let command = ParsedCommand::parse("echo a>b <c");
        assert_eq!(command.arguments, args(&["echo", "a>b", "<c"]));
        assert_eq!(command.input, None);
        assert_eq!(command.output, None);
    }

    #[test]
    fn missing_target_is_empty() {
        let command = ParsedCommand::parse("cat <");
        assert_eq!(command.arguments, args(&["cat"]));
        assert_eq!(command.input.as_deref(), Some(""));
    }

    #[test]
    fn later_redirection_wins() {
        let command = ParsedCommand::parse("cat > a > b");
        assert_eq!(command.output.as_deref(), Some("b"));
    }

    #[test]
    fn arguments_are_bounded() {
        let line = std::iter::once("echo")
            .chain(std::iter::repeat("x").take(MAX_ARGS + 10))
            .collect::<Vec<_>>()
            .join(" ");
        let command = ParsedCommand::parse(&line);
        assert_eq!(command.arguments.len(), MAX_ARGS);
        assert_eq!(command.program(), "echo");
    }
}

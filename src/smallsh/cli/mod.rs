use std::mem;


const DEFAULT_PROMPT: &str = ": ";

#[cfg_attr(test, derive(Debug, PartialEq))]
pub enum SmallshAction {
    Help(SmallshHelpOptions),
    Version(SmallshVersionOptions),
    Run(SmallshRunOptions),
}

impl SmallshAction {
    pub fn from_env() -> Result<Self, String> {
        SmallshOptions::parse_arguments(std::env::args())?.validate()
    }
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct SmallshHelpOptions {}

impl TryFrom<SmallshOptions> for SmallshHelpOptions {
    type Error = String;

    fn try_from(mut opts: SmallshOptions) -> Result<Self, Self::Error> {
        let help = mem::take(&mut opts.help);
        debug_assert!(help);
        reject_all("--help", opts)?;
        Ok(Self {})
    }
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct SmallshVersionOptions {}

impl TryFrom<SmallshOptions> for SmallshVersionOptions {
    type Error = String;

    fn try_from(mut opts: SmallshOptions) -> Result<Self, Self::Error> {
        let version = mem::take(&mut opts.version);
        debug_assert!(version);
        reject_all("--version", opts)?;
        Ok(Self {})
    }
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct SmallshRunOptions {
    /// Printed before every read, `None` when running quietly.
    pub prompt: Option<String>,
}

impl Default for SmallshRunOptions {
    fn default() -> Self {
        Self {
            prompt: Some(DEFAULT_PROMPT.to_string()),
        }
    }
}

impl TryFrom<SmallshOptions> for SmallshRunOptions {
    type Error = String;

    fn try_from(mut opts: SmallshOptions) -> Result<Self, Self::Error> {
        let prompt = mem::take(&mut opts.prompt);
        let quiet = mem::take(&mut opts.quiet);

        if quiet && prompt.is_some() {
            return Err("--quiet conflicts with --prompt".into());
        }

        reject_all("run mode", opts)?;

        let prompt = if quiet {
            None
        } else {
            Some(prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()))
        };

        Ok(Self { prompt })
    }
}

fn reject_all(context: &str, opts: SmallshOptions) -> Result<(), String> {
    macro_rules! ensure_options_absent {
        ($($opt:ident),*; $positional:ident) => {
            let SmallshOptions {
                $($opt,)*
                $positional,
            } = opts;

            $(if !$opt.is_absent() {
                let name = concat!("--", stringify!($opt)).replace('_', "-");
                return Err(format!("{context} conflicts with {name}"));
            })*

            if !$positional.is_absent() {
                return Err(format!("{context} conflicts with positional argument"));
            }
        };
    }

    ensure_options_absent! {
        help,
        prompt,
        quiet,
        version;
        positional_args
    };

    Ok(())
}

trait IsAbsent {
    fn is_absent(&self) -> bool;
}

impl IsAbsent for bool {
    fn is_absent(&self) -> bool {
        !*self
    }
}

impl<T> IsAbsent for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T> IsAbsent for Vec<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Default, PartialEq)]
pub(super) struct SmallshOptions {
    // -h
    help: bool,
    // -p
    prompt: Option<String>,
    // -q
    quiet: bool,
    // -V
    version: bool,

    positional_args: Vec<String>,
}

type OptionSetter = fn(&mut SmallshOptions, Option<String>) -> Result<(), String>;

struct SmallshOption {
    short: char,
    long: &'static str,
    takes_argument: bool,
    set: OptionSetter,
}

impl SmallshOptions {
    const SMALLSH_OPTIONS: &'static [SmallshOption] = &[
        SmallshOption {
            short: 'p',
            long: "prompt",
            takes_argument: true,
            set: |options, argument| {
                if options.prompt.is_some() {
                    Err(more_than_once("--prompt"))
                } else if argument.is_some() {
                    options.prompt = argument;
                    Ok(())
                } else {
                    Err("no prompt provided".into())
                }
            },
        },
        SmallshOption {
            short: 'q',
            long: "quiet",
            takes_argument: false,
            set: |options, _| {
                if options.quiet {
                    Err(more_than_once("--quiet"))
                } else {
                    options.quiet = true;
                    Ok(())
                }
            },
        },
        SmallshOption {
            short: 'V',
            long: "version",
            takes_argument: false,
            set: |options, _| {
                if options.version {
                    Err(more_than_once("--version"))
                } else {
                    options.version = true;
                    Ok(())
                }
            },
        },
        SmallshOption {
            short: 'h',
            long: "help",
            takes_argument: false,
            set: |options, _| {
                if options.help {
                    Err(more_than_once("--help"))
                } else {
                    options.help = true;
                    Ok(())
                }
            },
        },
    ];

    /// parse smallsh arguments into SmallshOptions struct
    pub(super) fn parse_arguments(
        arguments: impl IntoIterator<Item = String>,
    ) -> Result<SmallshOptions, String> {
        let mut options: SmallshOptions = SmallshOptions::default();
        let mut arg_iter = arguments.into_iter().skip(1);

        while let Some(arg) = arg_iter.next() {
            if arg == "--" {
                // only positional arguments after this point
                options.positional_args.extend(arg_iter);

                break;

                // if the argument starts with -- it must be a full length option name
            } else if let Some(unprefixed) = arg.strip_prefix("--") {
                // parse assignments like '--prompt=$ '
                if let Some((key, value)) = unprefixed.split_once('=') {
                    if let Some(option) = Self::SMALLSH_OPTIONS.iter().find(|o| o.long == key) {
                        if option.takes_argument {
                            (option.set)(&mut options, Some(value.to_string()))?;
                        } else {
                            Err(format!("'--{}' does not take any arguments", option.long))?;
                        }
                    } else {
                        Err(format!("unrecognized option '{arg}'"))?;
                    }
                } else if let Some(option) =
                    Self::SMALLSH_OPTIONS.iter().find(|o| o.long == unprefixed)
                {
                    if option.takes_argument {
                        let next_arg = arg_iter.next();
                        (option.set)(&mut options, next_arg)?;
                    } else {
                        (option.set)(&mut options, None)?;
                    }
                } else {
                    Err(format!("unrecognized option '{arg}'"))?;
                }
            } else if let Some(unprefixed) = arg.strip_prefix('-').filter(|rest| !rest.is_empty()) {
                // flags can be grouped, so we loop over the the characters
                let mut chars = unprefixed.chars();
                while let Some(curr) = chars.next() {
                    if let Some(option) = Self::SMALLSH_OPTIONS.iter().find(|o| o.short == curr) {
                        // the argument is either the rest of the current flag group or the next
                        // argument
                        let rest = chars.as_str();

                        if option.takes_argument {
                            let next_arg = if rest.is_empty() {
                                arg_iter.next()
                            } else {
                                Some(rest.to_string())
                            };
                            (option.set)(&mut options, next_arg)?;
                            break;
                        } else {
                            (option.set)(&mut options, None)?;
                        }
                    } else {
                        Err(format!("unrecognized option '{curr}'"))?;
                    }
                }
            } else {
                options.positional_args.push(arg);
            }
        }

        Ok(options)
    }

    pub(super) fn validate(self) -> Result<SmallshAction, String> {
        let action = if self.help {
            SmallshAction::Help(self.try_into()?)
        } else if self.version {
            SmallshAction::Version(self.try_into()?)
        } else {
            SmallshAction::Run(self.try_into()?)
        };
        Ok(action)
    }
}

fn more_than_once(flag: &str) -> String {
    format!("argument '{flag}' was provided more than once, but cannot be used multiple times")
}

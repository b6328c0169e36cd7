//! Command-line argument parsing for `hazama-lang`.
//!
//! Parses args manually, the same way the other workspace binaries do.
//! Supports environment variable overrides via the `HAZAMA_*` prefix;
//! explicit flags win over the environment.

use std::env;
use std::path::PathBuf;
use std::process;

use crate::logging::DEFAULT_FILTER;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
hazama-lang: inspect Hazama translation catalogs

USAGE:
    hazama-lang [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    lookup CONTEXT TEXT  Print the translation of TEXT in CONTEXT
    stats                Per-context translation coverage
    contexts             List contexts with their entry counts
    check                Validate the catalog (exit status 1 on failure)

OPTIONS:
    --file=PATH          Use this .ts file instead of resolving one
    --lang=TAG           Language tag, e.g. zh_CN (default: from config, else en)
    --lang-dir=DIR       Directory with <lang>.ts catalogs (default: lang)
    --toolkit-dir=DIR    Directory searched first for qt_<lang>.ts
    --config=PATH        Settings file (default: config.ini)
    --comment=TEXT       lookup: disambiguation comment
    --count=N            lookup: select the plural form for N
    --log=FILTER         Log filter directives (default: warn)
    --log-json           Emit logs as JSON lines
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    HAZAMA_LANG          Override the configured language
    HAZAMA_LANG_DIR      Override --lang-dir
    HAZAMA_CONFIG        Override --config
    HAZAMA_LOG           Override --log";

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.ini";

/// What to do once a catalog is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lookup {
        context: String,
        text: String,
        comment: Option<String>,
        count: Option<i64>,
    },
    Stats,
    Contexts,
    Check,
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub command: Command,
    /// Explicit catalog file; bypasses settings resolution.
    pub file: Option<PathBuf>,
    /// Language override (otherwise read from the settings file).
    pub lang: Option<String>,
    /// Language directory override.
    pub lang_dir: Option<PathBuf>,
    pub toolkit_dir: Option<PathBuf>,
    pub config: PathBuf,
    pub log_filter: String,
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
    MissingCommand,
    UnknownCommand(String),
    MissingArgument { command: &'static str, name: &'static str },
    UnexpectedArgument(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Help => write!(f, "help requested"),
            Self::Version => write!(f, "version requested"),
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            Self::UnknownArg(arg) => write!(f, "Unknown argument: {arg}"),
            Self::MissingCommand => write!(f, "Missing command"),
            Self::UnknownCommand(cmd) => write!(f, "Unknown command: {cmd}"),
            Self::MissingArgument { command, name } => {
                write!(f, "Missing {name} for `{command}`")
            }
            Self::UnexpectedArgument(arg) => write!(f, "Unexpected argument: {arg}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Opts {
    /// Parse command-line arguments and environment variables, exiting on
    /// `--help`, `--version` or invalid input.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("hazama-lang {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }

    /// Parse from explicit args and an environment lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for help/version requests and bad input.
    pub fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut file = None;
        let mut lang = None;
        let mut lang_dir = None;
        let mut toolkit_dir = None;
        let mut config = PathBuf::from(DEFAULT_CONFIG);
        let mut log_filter = DEFAULT_FILTER.to_string();
        let mut log_json = false;
        let mut comment = None;
        let mut count = None;
        let mut positional: Vec<String> = Vec::new();

        // Apply environment variable defaults first
        if let Some(val) = get_env("HAZAMA_LANG")
            && !val.trim().is_empty()
        {
            lang = Some(val.trim().to_string());
        }
        if let Some(val) = get_env("HAZAMA_LANG_DIR")
            && !val.trim().is_empty()
        {
            lang_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = get_env("HAZAMA_CONFIG")
            && !val.trim().is_empty()
        {
            config = PathBuf::from(val);
        }
        if let Some(val) = get_env("HAZAMA_LOG")
            && !val.trim().is_empty()
        {
            log_filter = val;
        }

        // Parse command-line args (override env vars)
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--log-json" => log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--file=") {
                        file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--lang=") {
                        if val.trim().is_empty() {
                            return Err(ParseError::InvalidValue {
                                flag: "--lang",
                                value: val.to_string(),
                            });
                        }
                        lang = Some(val.trim().to_string());
                    } else if let Some(val) = other.strip_prefix("--lang-dir=") {
                        lang_dir = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--toolkit-dir=") {
                        toolkit_dir = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--config=") {
                        config = PathBuf::from(val);
                    } else if let Some(val) = other.strip_prefix("--comment=") {
                        comment = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--count=") {
                        match val.parse() {
                            Ok(n) => count = Some(n),
                            Err(_) => {
                                return Err(ParseError::InvalidValue {
                                    flag: "--count",
                                    value: val.to_string(),
                                });
                            }
                        }
                    } else if let Some(val) = other.strip_prefix("--log=") {
                        log_filter = val.to_string();
                    } else if other.starts_with("--") {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    } else {
                        positional.push(other.to_string());
                    }
                }
            }
        }

        let command = Self::command(positional, comment, count)?;
        Ok(Self {
            command,
            file,
            lang,
            lang_dir,
            toolkit_dir,
            config,
            log_filter,
            log_json,
        })
    }

    fn command(
        positional: Vec<String>,
        comment: Option<String>,
        count: Option<i64>,
    ) -> Result<Command, ParseError> {
        let mut words = positional.into_iter();
        let Some(name) = words.next() else {
            return Err(ParseError::MissingCommand);
        };
        let command = match name.as_str() {
            "lookup" => {
                let context = words.next().ok_or(ParseError::MissingArgument {
                    command: "lookup",
                    name: "CONTEXT",
                })?;
                let text = words.next().ok_or(ParseError::MissingArgument {
                    command: "lookup",
                    name: "TEXT",
                })?;
                Command::Lookup {
                    context,
                    text,
                    comment,
                    count,
                }
            }
            "stats" => Command::Stats,
            "contexts" => Command::Contexts,
            "check" => Command::Check,
            _ => return Err(ParseError::UnknownCommand(name)),
        };
        if let Some(extra) = words.next() {
            return Err(ParseError::UnexpectedArgument(extra));
        }
        Ok(command)
    }
}

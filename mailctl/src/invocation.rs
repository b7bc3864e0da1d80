//! Splitting raw command-line tokens into global options and a command
//!
//! Option names and the default port come from an explicit
//! [`ParserConfig`] rather than process-wide constants, so the parser can be
//! built once and reused in tests with different settings.

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command};
use mailctl_control::DEFAULT_CONTROL_PORT;

use crate::{
    catalog::Catalog,
    error::{CliError, Result},
};

const HOST: &str = "host";
const PORT: &str = "port";
const COMMAND: &str = "command";

/// Short and long spelling of one option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionName {
    pub short: char,
    pub long: &'static str,
}

/// Immutable settings of the invocation parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub host: OptionName,
    pub port: OptionName,
    /// Port used when none is given
    pub default_port: u16,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            host: OptionName {
                short: 'h',
                long: HOST,
            },
            port: OptionName {
                short: 'p',
                long: PORT,
            },
            default_port: DEFAULT_CONTROL_PORT,
        }
    }
}

/// One parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub host: String,
    pub port: u16,
    pub command: String,
    /// Tokens after the command name
    pub arguments: Vec<String>,
}

/// Parses raw arguments into an [`Invocation`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationParser {
    config: ParserConfig,
}

impl InvocationParser {
    #[must_use]
    pub const fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The clap definition of the global options
    #[must_use]
    pub fn command(&self) -> Command {
        let ParserConfig { host, port, .. } = self.config;

        Command::new("mailctl")
            .about("Administer a running mail server")
            .override_usage(format!(
                "mailctl --{} <addr> [--{} <n>] <command> [arguments...]",
                host.long, port.long
            ))
            .no_binary_name(true)
            // `-h` selects the host
            .disable_help_flag(true)
            .disable_version_flag(true)
            .arg(
                Arg::new(HOST)
                    .short(host.short)
                    .long(host.long)
                    .value_name("addr")
                    .help("node hostname or ip address")
                    .required(true)
                    .num_args(1),
            )
            .arg(
                Arg::new(PORT)
                    .short(port.short)
                    .long(port.long)
                    .value_name("n")
                    .help(format!(
                        "remote management agent port number (default {})",
                        self.config.default_port
                    ))
                    .num_args(1)
                    .allow_hyphen_values(true),
            )
            .arg(
                Arg::new(COMMAND)
                    .value_name("command")
                    .num_args(1..)
                    .action(ArgAction::Append),
            )
    }

    /// Parse raw arguments, excluding the program name
    ///
    /// # Errors
    ///
    /// - [`CliError::Parse`] for malformed options or a non-numeric port
    /// - [`CliError::InvalidPort`] for a port outside `1..=65535`
    /// - [`CliError::MissingCommand`] when no command token remains
    pub fn parse<I, T>(&self, raw: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command()
            .try_get_matches_from(raw)
            .map_err(|e| CliError::Parse(reason(&e)))?;

        let host = matches
            .get_one::<String>(HOST)
            .cloned()
            .ok_or_else(|| CliError::Parse(format!("Missing required option: {HOST}")))?;
        let port = self.port(&matches)?;

        let mut tokens = matches
            .get_many::<String>(COMMAND)
            .into_iter()
            .flatten()
            .cloned();
        let command = tokens.next().ok_or(CliError::MissingCommand)?;

        Ok(Invocation {
            host,
            port,
            command,
            arguments: tokens.collect(),
        })
    }

    fn port(&self, matches: &ArgMatches) -> Result<u16> {
        let Some(raw) = matches.get_one::<String>(PORT) else {
            return Ok(self.config.default_port);
        };

        let port: i64 = raw
            .parse()
            .map_err(|_| CliError::Parse("Port must be a number".to_string()))?;

        u16::try_from(port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(CliError::InvalidPort(port))
    }

    /// Full help text: global options followed by every command's usage
    #[must_use]
    pub fn usage(&self, catalog: &Catalog) -> String {
        self.command()
            .after_help(format!("Commands:\n{}", catalog.usage()))
            .render_help()
            .to_string()
    }
}

/// First paragraph of a clap error, without its `error:` prefix
fn reason(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with("Usage:"))
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim())
        .collect::<Vec<_>>()
        .join(" ")
}

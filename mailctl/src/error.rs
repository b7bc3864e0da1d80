//! Error types for `mailctl`
//!
//! Every failure of an invocation is terminal and ends up here. The shell
//! renders the message on stderr together with the usage text and exits 1.

use mailctl_control::ControlError;
use thiserror::Error;

use crate::{catalog::Arity, format::UnitError};

/// Errors that can occur while running one command
#[derive(Debug, Error)]
pub enum CliError {
    /// No command token after the global options
    #[error("You must specify a command.")]
    MissingCommand,

    /// Command name is not in the catalog
    #[error("{0} command is not recognized")]
    UnrecognizedCommand(String),

    /// Token count does not satisfy the command's arity
    #[error(
        "Invalid argument number for command {command}: expected {expected} tokens including the command name, got {got}"
    )]
    InvalidArgumentCount {
        command: &'static str,
        expected: Arity,
        got: usize,
    },

    /// Port parsed as a number but is out of range
    #[error("Invalid port number: {0}. Port must be between 1 and 65535")]
    InvalidPort(i64),

    /// Malformed command line or argument value
    #[error("Error parsing command line : {0}")]
    Parse(String),

    /// The remote management agent could not be reached
    #[error("Error connecting to remote management agent : {0}")]
    Connection(#[source] ControlError),

    /// A capability call failed while executing the command
    #[error("Error while executing command: {0}")]
    Remote(#[from] ControlError),
}

impl From<UnitError> for CliError {
    fn from(e: UnitError) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Result type for `mailctl` operations
pub type Result<T> = std::result::Result<T, CliError>;

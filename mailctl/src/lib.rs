//! Command-line administration for a running mail server
//!
//! One invocation runs one command against the remote management agent:
//! - [`invocation`] splits raw arguments into global options and a command
//! - [`catalog`] lists every command with its arity, usage and handler
//! - [`validator`] checks the argument count before anything is sent
//! - [`dispatch`] routes the command to exactly one capability call
//! - [`format`] renders and parses quota values
//! - [`shell`] ties these together and owns the exit code

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod invocation;
pub mod logging;
pub mod probe;
pub mod shell;
pub mod validator;

pub use catalog::{Arity, Catalog, CommandSpec};
pub use dispatch::{Dispatcher, Output};
pub use error::{CliError, Result};
pub use invocation::{Invocation, InvocationParser, ParserConfig};
pub use probe::Probes;
pub use shell::{Completion, Connector, RemoteConnector, Shell};

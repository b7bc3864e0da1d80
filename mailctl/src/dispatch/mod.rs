//! Routing of a validated command to its capability call
//!
//! Each catalog entry carries a [`Handler`]: a plain function that performs
//! exactly one remote call and turns the result into output lines. Adding a
//! command means writing one handler and one catalog row.

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::{
    catalog::{Catalog, CommandSpec},
    error::{CliError, Result},
    probe::Probes,
    validator,
};

/// Defines a catalog handler: `handler!(name, |args, probes| { ... })`
macro_rules! handler {
    ($name:ident, |$args:ident, $probes:ident| { $($body:tt)* }) => {
        pub fn $name<'a>(
            $args: $crate::dispatch::Positional<'a>,
            $probes: &'a $crate::probe::Probes,
        ) -> ::futures_util::future::BoxFuture<'a, $crate::error::Result<$crate::dispatch::Output>>
        {
            async fn run<'b>(
                $args: $crate::dispatch::Positional<'b>,
                $probes: &'b $crate::probe::Probes,
            ) -> $crate::error::Result<$crate::dispatch::Output> {
                $($body)*
            }

            ::std::boxed::Box::pin(run($args, $probes))
        }
    };
}

pub mod directory;
pub mod mailbox;
pub mod quota;
pub mod sieve;

/// Executes one command against the capability groups
pub type Handler = for<'a> fn(Positional<'a>, &'a Probes) -> BoxFuture<'a, Result<Output>>;

/// Lines a command prints on stdout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output(Vec<String>);

impl Output {
    /// No output: the usual result of a mutating command
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn line(line: impl Into<String>) -> Self {
        Self(vec![line.into()])
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Output {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Arguments following the command name
#[derive(Debug, Clone, Copy)]
pub struct Positional<'a> {
    spec: &'static CommandSpec,
    arguments: &'a [String],
}

impl<'a> Positional<'a> {
    #[must_use]
    pub const fn new(spec: &'static CommandSpec, arguments: &'a [String]) -> Self {
        Self { spec, arguments }
    }

    /// Argument at `index`, counted from the first token after the command
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidArgumentCount`] if the argument is absent,
    /// which validation rules out for a consistent catalog entry.
    pub fn at(&self, index: usize) -> Result<&'a str> {
        self.arguments
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CliError::InvalidArgumentCount {
                command: self.spec.name,
                expected: self.spec.arity,
                got: self.arguments.len() + 1,
            })
    }
}

/// Looks commands up, validates them and runs their handler
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    catalog: Catalog,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Find the command and check its arity, without touching the network
    ///
    /// # Errors
    ///
    /// Returns [`CliError::UnrecognizedCommand`] or
    /// [`CliError::InvalidArgumentCount`]
    pub fn resolve(&self, name: &str, arguments: &[String]) -> Result<&'static CommandSpec> {
        let spec = self
            .catalog
            .lookup(name)
            .ok_or_else(|| CliError::UnrecognizedCommand(name.to_string()))?;
        validator::validate(spec, arguments)?;
        Ok(spec)
    }

    /// Run an already resolved command
    ///
    /// # Errors
    ///
    /// Propagates argument parse failures and remote failures
    pub async fn run(
        &self,
        spec: &'static CommandSpec,
        arguments: &[String],
        probes: &Probes,
    ) -> Result<Output> {
        debug!("Dispatching {} with {} argument(s)", spec.name, arguments.len());
        (spec.handler)(Positional::new(spec, arguments), probes).await
    }

    /// Resolve and run a command
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::resolve`] and [`Dispatcher::run`]
    pub async fn execute(
        &self,
        name: &str,
        arguments: &[String],
        probes: &Probes,
    ) -> Result<Output> {
        let spec = self.resolve(name, arguments)?;
        self.run(spec, arguments, probes).await
    }
}

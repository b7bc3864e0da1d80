//! One invocation from raw arguments to exit status
//!
//! The shell is the only place that writes to the output streams or decides
//! the exit code. Everything below it returns [`Result`].

use std::{ffi::OsString, io::Write, process::ExitCode, time::Instant};

use async_trait::async_trait;
use mailctl_control::ControlClient;
use tracing::{debug, error};

use crate::{
    catalog::Catalog,
    dispatch::{Dispatcher, Output},
    error::{CliError, Result},
    invocation::InvocationParser,
    probe::{Probes, RemoteProbe},
};

/// Opens a management session and hands out its capability groups
#[async_trait]
pub trait Connector: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the agent cannot be reached
    async fn connect(&self, host: &str, port: u16) -> mailctl_control::Result<Probes>;
}

/// Connects over TCP, reusing one connection for the whole session
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteConnector;

#[async_trait]
impl Connector for RemoteConnector {
    async fn connect(&self, host: &str, port: u16) -> mailctl_control::Result<Probes> {
        let client = ControlClient::new(host, port).with_persistent_connection();
        Ok(Probes::remote(RemoteProbe::connect(client).await?))
    }
}

/// Successful run of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub command: String,
    pub output: Output,
    pub elapsed_ms: u128,
}

impl Completion {
    /// Closing line printed after the command output
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} command executed successfully in {} ms.",
            self.command, self.elapsed_ms
        )
    }
}

/// Parser and dispatcher for one process
#[derive(Debug, Clone, Copy, Default)]
pub struct Shell {
    parser: InvocationParser,
    dispatcher: Dispatcher,
}

impl Shell {
    #[must_use]
    pub const fn new(parser: InvocationParser, dispatcher: Dispatcher) -> Self {
        Self { parser, dispatcher }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.dispatcher.catalog()
    }

    /// Parse, connect and run one command
    ///
    /// The command is resolved and validated before any connection is
    /// attempted.
    ///
    /// # Errors
    ///
    /// Any [`CliError`]. Failing to open the session is reported as
    /// [`CliError::Connection`].
    pub async fn execute<I, T>(&self, raw: I, connector: &dyn Connector) -> Result<Completion>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let started = Instant::now();
        let invocation = self.parser.parse(raw)?;
        let spec = self
            .dispatcher
            .resolve(&invocation.command, &invocation.arguments)?;

        debug!(
            "Connecting to {}:{} for {}",
            invocation.host, invocation.port, spec.name
        );
        let probes = connector
            .connect(&invocation.host, invocation.port)
            .await
            .map_err(CliError::Connection)?;

        let output = self
            .dispatcher
            .run(spec, &invocation.arguments, &probes)
            .await?;

        Ok(Completion {
            command: invocation.command,
            output,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    /// Run one command and report on the given streams
    ///
    /// Output lines and the summary go to `out`. On failure the error and
    /// the usage text go to `err` and the exit code is 1.
    pub async fn run<I, T>(
        &self,
        raw: I,
        connector: &dyn Connector,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.execute(raw, connector).await {
            Ok(completion) => match report(&completion, out) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Failed to write command output: {e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                if let Err(write_error) = self.report_failure(&e, err) {
                    error!("Failed to write error report: {write_error}");
                }
                ExitCode::FAILURE
            }
        }
    }

    fn report_failure(&self, failure: &CliError, err: &mut impl Write) -> std::io::Result<()> {
        writeln!(err, "{failure}")?;
        writeln!(err, "{}", self.parser.usage(self.catalog()))?;
        err.flush()
    }
}

fn report(completion: &Completion, out: &mut impl Write) -> std::io::Result<()> {
    for line in completion.output.lines() {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}", completion.summary())?;
    out.flush()
}

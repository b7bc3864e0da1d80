//! Client for connecting to the remote management agent

use std::{sync::Arc, time::Duration};

use tokio::{net::TcpStream, sync::Mutex};
use tracing::{debug, trace, warn};

use crate::{
    ControlError, Request, RequestCommand, Response, ResponsePayload, Result, SystemCommand,
    protocol::{read_frame, write_frame},
};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: u32 = 10_000_000;

/// Client for communicating with a mail server's management agent
#[derive(Debug)]
pub struct ControlClient {
    host: String,
    port: u16,
    timeout: Duration,
    /// Optional persistent connection, shared by every request of one invocation
    persistent_connection: Option<Arc<Mutex<Option<TcpStream>>>>,
}

impl ControlClient {
    /// Create a new control client for the given agent address
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(10),
            persistent_connection: None,
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Keep one connection open across requests
    ///
    /// The connection is opened lazily by the first request. When a request
    /// fails the connection is dropped and the error returned; the request is
    /// never sent a second time, so a mutation cannot be applied twice.
    #[must_use]
    pub fn with_persistent_connection(mut self) -> Self {
        self.persistent_connection = Some(Arc::new(Mutex::new(None)));
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Connect to the management agent
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails
    async fn connect(&self) -> Result<TcpStream> {
        debug!("Connecting to management agent: {}:{}", self.host, self.port);
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// Check that the agent is reachable and speaks our protocol version
    ///
    /// # Errors
    ///
    /// Returns an error if the agent cannot be reached or answers unexpectedly
    pub async fn ping(&self) -> Result<()> {
        self.execute(RequestCommand::System(SystemCommand::Ping))
            .await
            .map(|_| ())
    }

    /// Wrap a command in a request and send it
    ///
    /// # Errors
    ///
    /// See [`ControlClient::send_request`]
    pub async fn execute(&self, command: RequestCommand) -> Result<Response> {
        self.send_request(Request::new(command)).await
    }

    /// Send a request and receive a response
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Connection fails
    /// - Protocol error occurs
    /// - Request times out
    /// - Server returns an error
    pub async fn send_request(&self, request: Request) -> Result<Response> {
        tokio::time::timeout(self.timeout, self.send_request_internal(request))
            .await
            .map_err(|_| ControlError::Timeout)?
    }

    async fn send_request_internal(&self, request: Request) -> Result<Response> {
        if let Some(persistent) = &self.persistent_connection {
            self.send_request_persistent(request, persistent).await
        } else {
            self.send_request_oneshot(request).await
        }
    }

    /// Send a request using a one-shot connection
    async fn send_request_oneshot(&self, request: Request) -> Result<Response> {
        let mut stream = self.connect().await?;
        Self::send_and_receive(&mut stream, &request).await
    }

    /// Send a request over the shared connection, opening it if needed
    async fn send_request_persistent(
        &self,
        request: Request,
        persistent: &Arc<Mutex<Option<TcpStream>>>,
    ) -> Result<Response> {
        let mut guard = persistent.lock().await;

        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        let result = Self::send_and_receive(&mut stream, &request).await;
        match &result {
            // An error payload still leaves the session usable
            Ok(_) | Err(ControlError::ServerError(_)) => *guard = Some(stream),
            Err(e) => warn!(
                "Dropping connection to {}:{} after failure: {e}",
                self.host, self.port
            ),
        }

        result
    }

    /// Send request and receive response on an existing stream
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails or protocol error occurs
    async fn send_and_receive(stream: &mut TcpStream, request: &Request) -> Result<Response> {
        trace!("Sending request: {:?}", request.command);
        write_frame(stream, request).await?;

        let response: Response = read_frame(stream, MAX_RESPONSE_SIZE).await?;
        trace!("Received response: {:?}", response.payload);

        if !response.is_version_compatible() {
            return Err(ControlError::VersionMismatch {
                server: response.version,
                client: crate::PROTOCOL_VERSION,
            });
        }

        if let ResponsePayload::Error(ref err) = response.payload {
            return Err(ControlError::ServerError(err.clone()));
        }

        Ok(response)
    }
}

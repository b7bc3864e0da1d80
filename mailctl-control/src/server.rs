//! Control server implementation

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    net::{TcpListener, TcpStream, ToSocketAddrs},
    sync::broadcast,
};
use tracing::{debug, error, info, trace, warn};

use crate::{
    ControlError, Request, RequestCommand, Response, Result, SystemCommand,
    protocol::{read_frame, write_frame},
};

/// Requests larger than this are rejected before decoding
const MAX_REQUEST_SIZE: u32 = 1_000_000;

/// Idle time allowed between requests on one connection
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Signals understood by [`ControlServer::serve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}

/// Handler trait for processing control requests
///
/// Implement this trait to expose a mail server's capabilities to `mailctl`.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle a request and return a response
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be processed
    async fn handle_request(&self, request: Request) -> Result<Response>;
}

/// Management endpoint accepting framed requests over TCP
pub struct ControlServer {
    listener: TcpListener,
    handler: Arc<dyn CommandHandler>,
}

impl ControlServer {
    /// Bind the control server
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound
    pub async fn bind(addr: impl ToSocketAddrs, handler: Arc<dyn CommandHandler>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Control server listening on: {}", listener.local_addr()?);
        Ok(Self { listener, handler })
    }

    /// Address the server is bound to
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until a shutdown signal is received
    ///
    /// # Errors
    ///
    /// Currently infallible once bound; accept errors are logged and skipped
    pub async fn serve(self, mut shutdown: broadcast::Receiver<Signal>) -> Result<()> {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!("Accepted control connection from {peer}");
                            let handler = Arc::clone(&self.handler);
                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(stream, handler).await {
                                    error!("Error handling control connection: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            error!("Error accepting control connection: {e}");
                        }
                    }
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            info!("Control server shutting down");
                            break;
                        }
                        Err(e) => {
                            error!("Control server shutdown channel error: {e}");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Serve requests on one connection until the peer hangs up
    async fn handle_connection(
        mut stream: TcpStream,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<()> {
        loop {
            let request = match tokio::time::timeout(
                READ_TIMEOUT,
                read_frame::<_, Request>(&mut stream, MAX_REQUEST_SIZE),
            )
            .await
            {
                Err(_) => return Err(ControlError::Timeout),
                Ok(Err(ControlError::ConnectionClosed)) => return Ok(()),
                Ok(result) => result?,
            };

            trace!("Received request: {request:?}");

            let response = Self::dispatch(handler.as_ref(), request).await;

            trace!("Sending response: {response:?}");

            tokio::time::timeout(READ_TIMEOUT, write_frame(&mut stream, &response))
                .await
                .map_err(|_| ControlError::Timeout)??;
        }
    }

    async fn dispatch(handler: &dyn CommandHandler, request: Request) -> Response {
        if !request.is_version_compatible() {
            return Response::error(format!(
                "Incompatible protocol version: server={}, client={}",
                crate::PROTOCOL_VERSION,
                request.version
            ));
        }

        // Ping never reaches the handler
        if request.command == RequestCommand::System(SystemCommand::Ping) {
            return Response::ok();
        }

        match handler.handle_request(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error handling request: {e}");
                Response::error(e.to_string())
            }
        }
    }
}

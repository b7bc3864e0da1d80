//! Management protocol for administering a running mail server
//!
//! This crate provides the remote side of `mailctl`:
//! - Versioned request/response envelopes for the directory, mailbox, quota
//!   and sieve capability groups
//! - A TCP client used by the capability probes
//! - A server and handler trait so a mail server can answer those requests
//!
//! Frames are length-prefixed bincode.

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::ControlClient;
pub use error::{ControlError, Result};
pub use protocol::{
    DirectoryCommand, MailboxCommand, MailboxPath, Magnitude, Mappings, PROTOCOL_VERSION,
    QuotaCommand, QuotaUsage, Request, RequestCommand, Response, ResponseData, ResponsePayload,
    SieveCommand, SystemCommand,
};
pub use server::{CommandHandler, ControlServer, Signal};

/// Default port of the remote management agent
pub const DEFAULT_CONTROL_PORT: u16 = 9999;

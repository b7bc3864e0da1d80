//! Control protocol types and serialization

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{ControlError, Result};

/// Current protocol version
pub const PROTOCOL_VERSION: u32 = 1;

/// Request sent to the management agent (versioned wrapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version
    pub version: u32,
    /// The actual command to execute
    pub command: RequestCommand,
}

/// Request command types, one per capability group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    /// User, domain and mapping management
    Directory(DirectoryCommand),
    /// Mailbox management
    Mailbox(MailboxCommand),
    /// Storage and message-count quotas
    Quota(QuotaCommand),
    /// Sieve script storage quotas
    Sieve(SieveCommand),
    /// Session-level commands
    System(SystemCommand),
}

/// Directory commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryCommand {
    AddUser { username: String, password: String },
    RemoveUser(String),
    ListUsers,
    AddDomain(String),
    RemoveDomain(String),
    ContainsDomain(String),
    ListDomains,
    ListMappings,
    ListUserDomainMappings { user: String, domain: String },
    AddAddressMapping { user: String, domain: String, address: String },
    RemoveAddressMapping { user: String, domain: String, address: String },
    AddRegexMapping { user: String, domain: String, regex: String },
    RemoveRegexMapping { user: String, domain: String, regex: String },
    SetPassword { username: String, password: String },
}

/// Mailbox commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailboxCommand {
    /// Copy every mailbox from one mailbox manager to another
    Copy { source: String, destination: String },
    DeleteUserMailboxes(String),
    Create(MailboxPath),
    ListUserMailboxes(String),
    Delete(MailboxPath),
    Reindex(MailboxPath),
    ReindexAll,
}

/// Quota commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaCommand {
    GetStorageQuota(String),
    GetMessageCountQuota(String),
    GetQuotaRoot(MailboxPath),
    GetMaxStorage(String),
    SetMaxStorage { quota_root: String, limit: Magnitude },
    GetMaxMessageCount(String),
    SetMaxMessageCount { quota_root: String, limit: Magnitude },
    GetDefaultMaxStorage,
    SetDefaultMaxStorage(Magnitude),
    GetDefaultMaxMessageCount,
    SetDefaultMaxMessageCount(Magnitude),
}

/// Sieve quota commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SieveCommand {
    GetQuota,
    SetQuota(u64),
    RemoveQuota,
    GetUserQuota(String),
    SetUserQuota { username: String, bytes: u64 },
    RemoveUserQuota(String),
}

/// Session-level commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemCommand {
    /// Health check / ping
    Ping,
}

/// Fully qualified mailbox name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailboxPath {
    pub namespace: String,
    pub user: String,
    pub name: String,
}

impl MailboxPath {
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        user: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            user: user.into(),
            name: name.into(),
        }
    }
}

impl Display for MailboxPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.user, self.name)
    }
}

/// A quota magnitude: byte count or message count
///
/// The two sentinel states are kept apart from real values so that no
/// arithmetic can be performed on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Magnitude {
    Known(u64),
    /// The value could not be computed
    Unknown,
    /// No limit applies
    Unlimited,
}

/// Current usage against a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: Magnitude,
    pub max: Magnitude,
}

impl QuotaUsage {
    #[must_use]
    pub const fn new(used: Magnitude, max: Magnitude) -> Self {
        Self { used, max }
    }
}

/// Ordered set of redirections attached to one source address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mappings(Vec<String>);

impl Mappings {
    /// Separator used by the serialized form
    pub const SEPARATOR: char = ';';

    #[must_use]
    pub const fn new(mappings: Vec<String>) -> Self {
        Self(mappings)
    }

    #[must_use]
    pub fn as_strings(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, mapping: impl Into<String>) {
        let mapping = mapping.into();
        if !self.0.contains(&mapping) {
            self.0.push(mapping);
        }
    }

    /// Remove a mapping, returning whether it was present
    pub fn remove(&mut self, mapping: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|m| m != mapping);
        before != self.0.len()
    }

    /// Single-line form, entries joined by `;`
    #[must_use]
    pub fn serialized(&self) -> String {
        self.0.join(&Self::SEPARATOR.to_string())
    }
}

impl FromIterator<String> for Mappings {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Response from the management agent (versioned wrapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version
    pub version: u32,
    /// The actual response payload
    pub payload: ResponsePayload,
}

/// Response payload types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponsePayload {
    /// Command succeeded
    Ok,
    /// Command succeeded with data
    Data(Box<ResponseData>),
    /// Command failed with error message
    Error(String),
}

/// Response data types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseData {
    /// Users, domains or mailbox names, in the agent's iteration order
    Names(Vec<String>),
    /// Yes/no answer (domain membership)
    Flag(bool),
    /// Every mapping known to the agent, keyed by source
    Mappings(BTreeMap<String, Mappings>),
    /// Mappings of a single user/domain pair
    UserMappings(Mappings),
    /// Usage against a limit
    Quota(QuotaUsage),
    /// A single limit
    Limit(Magnitude),
    /// Quota root identifier
    QuotaRoot(String),
}

impl ResponseData {
    /// Short name of the variant, used in error reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Names(_) => "names",
            Self::Flag(_) => "flag",
            Self::Mappings(_) => "mappings",
            Self::UserMappings(_) => "user mappings",
            Self::Quota(_) => "quota",
            Self::Limit(_) => "limit",
            Self::QuotaRoot(_) => "quota root",
        }
    }
}

impl Request {
    /// Create a new request with the current protocol version
    #[must_use]
    pub const fn new(command: RequestCommand) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            command,
        }
    }

    /// Check if the request version is compatible with the current version
    #[must_use]
    pub const fn is_version_compatible(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }
}

impl Response {
    /// Create an error response
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            payload: ResponsePayload::Error(message.into()),
        }
    }

    /// Create a success response with no data
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            payload: ResponsePayload::Ok,
        }
    }

    /// Create a response with data
    #[must_use]
    pub fn data(data: ResponseData) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            payload: ResponsePayload::Data(Box::new(data)),
        }
    }

    /// Check if the response version is compatible with the current version
    #[must_use]
    pub const fn is_version_compatible(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }

    /// Unwrap a data payload
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::ServerError`] for an error payload and
    /// [`ControlError::UnexpectedResponse`] when no data was sent.
    pub fn into_data(self) -> Result<ResponseData> {
        match self.payload {
            ResponsePayload::Data(data) => Ok(*data),
            ResponsePayload::Error(err) => Err(ControlError::ServerError(err)),
            ResponsePayload::Ok => Err(ControlError::UnexpectedResponse(
                "expected data, got an empty acknowledgement".to_string(),
            )),
        }
    }
}

/// Write one length-prefixed bincode frame
pub(crate) async fn write_frame<W, T>(stream: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = bincode::serde::encode_to_vec(value, bincode::config::legacy())?;
    let len = u32::try_from(bytes.len())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&bytes).await?;
    stream.flush().await?;

    Ok(())
}

/// Read one length-prefixed bincode frame of at most `max` bytes
pub(crate) async fn read_frame<R, T>(stream: &mut R, max: u32) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ControlError::ConnectionClosed
        } else {
            ControlError::Io(e)
        }
    })?;

    let len = u32::from_be_bytes(len_buf);
    if len > max {
        return Err(ControlError::FrameTooLarge { size: len, max });
    }

    let mut bytes = vec![0u8; len as usize];
    stream.read_exact(&mut bytes).await?;

    let (value, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::legacy())?;
    Ok(value)
}

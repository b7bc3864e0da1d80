//! Capability groups backed by a [`ControlClient`] session

use std::collections::BTreeMap;

use async_trait::async_trait;
use mailctl_control::{
    ControlClient, ControlError, DirectoryCommand, Magnitude, MailboxCommand, MailboxPath,
    Mappings, QuotaCommand, QuotaUsage, RequestCommand, ResponseData, Result, SieveCommand,
};
use tracing::debug;

use super::{DataProbe, MailboxProbe, QuotaProbe, SieveProbe};

/// Implements every capability group over one management session
#[derive(Debug)]
pub struct RemoteProbe {
    client: ControlClient,
}

impl RemoteProbe {
    #[must_use]
    pub const fn new(client: ControlClient) -> Self {
        Self { client }
    }

    /// Check the session before any command is sent
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is unreachable
    pub async fn connect(client: ControlClient) -> Result<Self> {
        client.ping().await?;
        debug!(
            "Connected to management agent at {}:{}",
            client.host(),
            client.port()
        );
        Ok(Self::new(client))
    }

    /// Send a command whose only result is success or failure
    async fn call(&self, command: RequestCommand) -> Result<()> {
        self.client.execute(command).await.map(|_| ())
    }

    /// Send a command and return its data payload
    async fn query(&self, command: RequestCommand) -> Result<ResponseData> {
        self.client.execute(command).await?.into_data()
    }
}

fn unexpected(expected: &str, got: &ResponseData) -> ControlError {
    ControlError::UnexpectedResponse(format!("expected {expected}, got {}", got.kind()))
}

fn directory(command: DirectoryCommand) -> RequestCommand {
    RequestCommand::Directory(command)
}

fn mailbox(command: MailboxCommand) -> RequestCommand {
    RequestCommand::Mailbox(command)
}

fn quota(command: QuotaCommand) -> RequestCommand {
    RequestCommand::Quota(command)
}

fn sieve(command: SieveCommand) -> RequestCommand {
    RequestCommand::Sieve(command)
}

impl RemoteProbe {
    async fn names(&self, command: RequestCommand) -> Result<Vec<String>> {
        match self.query(command).await? {
            ResponseData::Names(names) => Ok(names),
            other => Err(unexpected("names", &other)),
        }
    }

    async fn usage(&self, command: RequestCommand) -> Result<QuotaUsage> {
        match self.query(command).await? {
            ResponseData::Quota(usage) => Ok(usage),
            other => Err(unexpected("quota", &other)),
        }
    }

    async fn limit(&self, command: RequestCommand) -> Result<Magnitude> {
        match self.query(command).await? {
            ResponseData::Limit(limit) => Ok(limit),
            other => Err(unexpected("limit", &other)),
        }
    }
}

#[async_trait]
impl DataProbe for RemoteProbe {
    async fn add_user(&self, username: &str, password: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::AddUser {
            username: username.to_string(),
            password: password.to_string(),
        }))
        .await
    }

    async fn remove_user(&self, username: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::RemoveUser(username.to_string())))
            .await
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        self.names(directory(DirectoryCommand::ListUsers)).await
    }

    async fn add_domain(&self, domain: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::AddDomain(domain.to_string())))
            .await
    }

    async fn remove_domain(&self, domain: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::RemoveDomain(domain.to_string())))
            .await
    }

    async fn contains_domain(&self, domain: &str) -> Result<bool> {
        match self
            .query(directory(DirectoryCommand::ContainsDomain(domain.to_string())))
            .await?
        {
            ResponseData::Flag(flag) => Ok(flag),
            other => Err(unexpected("flag", &other)),
        }
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        self.names(directory(DirectoryCommand::ListDomains)).await
    }

    async fn list_mappings(&self) -> Result<BTreeMap<String, Mappings>> {
        match self.query(directory(DirectoryCommand::ListMappings)).await? {
            ResponseData::Mappings(mappings) => Ok(mappings),
            other => Err(unexpected("mappings", &other)),
        }
    }

    async fn list_user_domain_mappings(&self, user: &str, domain: &str) -> Result<Mappings> {
        match self
            .query(directory(DirectoryCommand::ListUserDomainMappings {
                user: user.to_string(),
                domain: domain.to_string(),
            }))
            .await?
        {
            ResponseData::UserMappings(mappings) => Ok(mappings),
            other => Err(unexpected("user mappings", &other)),
        }
    }

    async fn add_address_mapping(&self, user: &str, domain: &str, address: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::AddAddressMapping {
            user: user.to_string(),
            domain: domain.to_string(),
            address: address.to_string(),
        }))
        .await
    }

    async fn remove_address_mapping(
        &self,
        user: &str,
        domain: &str,
        address: &str,
    ) -> Result<()> {
        self.call(directory(DirectoryCommand::RemoveAddressMapping {
            user: user.to_string(),
            domain: domain.to_string(),
            address: address.to_string(),
        }))
        .await
    }

    async fn add_regex_mapping(&self, user: &str, domain: &str, regex: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::AddRegexMapping {
            user: user.to_string(),
            domain: domain.to_string(),
            regex: regex.to_string(),
        }))
        .await
    }

    async fn remove_regex_mapping(&self, user: &str, domain: &str, regex: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::RemoveRegexMapping {
            user: user.to_string(),
            domain: domain.to_string(),
            regex: regex.to_string(),
        }))
        .await
    }

    async fn set_password(&self, username: &str, password: &str) -> Result<()> {
        self.call(directory(DirectoryCommand::SetPassword {
            username: username.to_string(),
            password: password.to_string(),
        }))
        .await
    }
}

#[async_trait]
impl MailboxProbe for RemoteProbe {
    async fn copy_mailbox(&self, source: &str, destination: &str) -> Result<()> {
        self.call(mailbox(MailboxCommand::Copy {
            source: source.to_string(),
            destination: destination.to_string(),
        }))
        .await
    }

    async fn delete_user_mailboxes(&self, user: &str) -> Result<()> {
        self.call(mailbox(MailboxCommand::DeleteUserMailboxes(user.to_string())))
            .await
    }

    async fn create_mailbox(&self, path: &MailboxPath) -> Result<()> {
        self.call(mailbox(MailboxCommand::Create(path.clone()))).await
    }

    async fn list_user_mailboxes(&self, user: &str) -> Result<Vec<String>> {
        self.names(mailbox(MailboxCommand::ListUserMailboxes(user.to_string())))
            .await
    }

    async fn delete_mailbox(&self, path: &MailboxPath) -> Result<()> {
        self.call(mailbox(MailboxCommand::Delete(path.clone()))).await
    }

    async fn reindex_mailbox(&self, path: &MailboxPath) -> Result<()> {
        self.call(mailbox(MailboxCommand::Reindex(path.clone()))).await
    }

    async fn reindex_all(&self) -> Result<()> {
        self.call(mailbox(MailboxCommand::ReindexAll)).await
    }
}

#[async_trait]
impl QuotaProbe for RemoteProbe {
    async fn get_storage_quota(&self, quota_root: &str) -> Result<QuotaUsage> {
        self.usage(quota(QuotaCommand::GetStorageQuota(quota_root.to_string())))
            .await
    }

    async fn get_message_count_quota(&self, quota_root: &str) -> Result<QuotaUsage> {
        self.usage(quota(QuotaCommand::GetMessageCountQuota(
            quota_root.to_string(),
        )))
        .await
    }

    async fn get_quota_root(&self, path: &MailboxPath) -> Result<String> {
        match self
            .query(quota(QuotaCommand::GetQuotaRoot(path.clone())))
            .await?
        {
            ResponseData::QuotaRoot(root) => Ok(root),
            other => Err(unexpected("quota root", &other)),
        }
    }

    async fn get_max_storage(&self, quota_root: &str) -> Result<Magnitude> {
        self.limit(quota(QuotaCommand::GetMaxStorage(quota_root.to_string())))
            .await
    }

    async fn set_max_storage(&self, quota_root: &str, limit: Magnitude) -> Result<()> {
        self.call(quota(QuotaCommand::SetMaxStorage {
            quota_root: quota_root.to_string(),
            limit,
        }))
        .await
    }

    async fn get_max_message_count(&self, quota_root: &str) -> Result<Magnitude> {
        self.limit(quota(QuotaCommand::GetMaxMessageCount(quota_root.to_string())))
            .await
    }

    async fn set_max_message_count(&self, quota_root: &str, limit: Magnitude) -> Result<()> {
        self.call(quota(QuotaCommand::SetMaxMessageCount {
            quota_root: quota_root.to_string(),
            limit,
        }))
        .await
    }

    async fn get_default_max_storage(&self) -> Result<Magnitude> {
        self.limit(quota(QuotaCommand::GetDefaultMaxStorage)).await
    }

    async fn set_default_max_storage(&self, limit: Magnitude) -> Result<()> {
        self.call(quota(QuotaCommand::SetDefaultMaxStorage(limit)))
            .await
    }

    async fn get_default_max_message_count(&self) -> Result<Magnitude> {
        self.limit(quota(QuotaCommand::GetDefaultMaxMessageCount))
            .await
    }

    async fn set_default_max_message_count(&self, limit: Magnitude) -> Result<()> {
        self.call(quota(QuotaCommand::SetDefaultMaxMessageCount(limit)))
            .await
    }
}

#[async_trait]
impl SieveProbe for RemoteProbe {
    async fn get_sieve_quota(&self) -> Result<Magnitude> {
        self.limit(sieve(SieveCommand::GetQuota)).await
    }

    async fn set_sieve_quota(&self, bytes: u64) -> Result<()> {
        self.call(sieve(SieveCommand::SetQuota(bytes))).await
    }

    async fn remove_sieve_quota(&self) -> Result<()> {
        self.call(sieve(SieveCommand::RemoveQuota)).await
    }

    async fn get_user_sieve_quota(&self, username: &str) -> Result<Magnitude> {
        self.limit(sieve(SieveCommand::GetUserQuota(username.to_string())))
            .await
    }

    async fn set_user_sieve_quota(&self, username: &str, bytes: u64) -> Result<()> {
        self.call(sieve(SieveCommand::SetUserQuota {
            username: username.to_string(),
            bytes,
        }))
        .await
    }

    async fn remove_user_sieve_quota(&self, username: &str) -> Result<()> {
        self.call(sieve(SieveCommand::RemoveUserQuota(username.to_string())))
            .await
    }
}

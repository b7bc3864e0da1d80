//! Remote capability groups reached through a management session
//!
//! Each trait covers one concern of the mail server. Every call is a single
//! remote operation; transport and domain failures both surface as
//! [`ControlError`](mailctl_control::ControlError).

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use mailctl_control::{Magnitude, MailboxPath, Mappings, QuotaUsage, Result};

pub mod remote;

pub use remote::RemoteProbe;

/// Users, domains and address mappings
#[async_trait]
pub trait DataProbe: Send + Sync {
    async fn add_user(&self, username: &str, password: &str) -> Result<()>;
    async fn remove_user(&self, username: &str) -> Result<()>;
    async fn list_users(&self) -> Result<Vec<String>>;
    async fn add_domain(&self, domain: &str) -> Result<()>;
    async fn remove_domain(&self, domain: &str) -> Result<()>;
    async fn contains_domain(&self, domain: &str) -> Result<bool>;
    async fn list_domains(&self) -> Result<Vec<String>>;
    async fn list_mappings(&self) -> Result<BTreeMap<String, Mappings>>;
    async fn list_user_domain_mappings(&self, user: &str, domain: &str) -> Result<Mappings>;
    async fn add_address_mapping(&self, user: &str, domain: &str, address: &str) -> Result<()>;
    async fn remove_address_mapping(&self, user: &str, domain: &str, address: &str)
    -> Result<()>;
    async fn add_regex_mapping(&self, user: &str, domain: &str, regex: &str) -> Result<()>;
    async fn remove_regex_mapping(&self, user: &str, domain: &str, regex: &str) -> Result<()>;
    async fn set_password(&self, username: &str, password: &str) -> Result<()>;
}

/// Mailbox lifecycle and indexing
#[async_trait]
pub trait MailboxProbe: Send + Sync {
    async fn copy_mailbox(&self, source: &str, destination: &str) -> Result<()>;
    async fn delete_user_mailboxes(&self, user: &str) -> Result<()>;
    async fn create_mailbox(&self, path: &MailboxPath) -> Result<()>;
    async fn list_user_mailboxes(&self, user: &str) -> Result<Vec<String>>;
    async fn delete_mailbox(&self, path: &MailboxPath) -> Result<()>;
    async fn reindex_mailbox(&self, path: &MailboxPath) -> Result<()>;
    async fn reindex_all(&self) -> Result<()>;
}

/// Storage and message-count quotas
#[async_trait]
pub trait QuotaProbe: Send + Sync {
    async fn get_storage_quota(&self, quota_root: &str) -> Result<QuotaUsage>;
    async fn get_message_count_quota(&self, quota_root: &str) -> Result<QuotaUsage>;
    async fn get_quota_root(&self, path: &MailboxPath) -> Result<String>;
    async fn get_max_storage(&self, quota_root: &str) -> Result<Magnitude>;
    async fn set_max_storage(&self, quota_root: &str, limit: Magnitude) -> Result<()>;
    async fn get_max_message_count(&self, quota_root: &str) -> Result<Magnitude>;
    async fn set_max_message_count(&self, quota_root: &str, limit: Magnitude) -> Result<()>;
    async fn get_default_max_storage(&self) -> Result<Magnitude>;
    async fn set_default_max_storage(&self, limit: Magnitude) -> Result<()>;
    async fn get_default_max_message_count(&self) -> Result<Magnitude>;
    async fn set_default_max_message_count(&self, limit: Magnitude) -> Result<()>;
}

/// Sieve script storage quotas
#[async_trait]
pub trait SieveProbe: Send + Sync {
    async fn get_sieve_quota(&self) -> Result<Magnitude>;
    async fn set_sieve_quota(&self, bytes: u64) -> Result<()>;
    async fn remove_sieve_quota(&self) -> Result<()>;
    async fn get_user_sieve_quota(&self, username: &str) -> Result<Magnitude>;
    async fn set_user_sieve_quota(&self, username: &str, bytes: u64) -> Result<()>;
    async fn remove_user_sieve_quota(&self, username: &str) -> Result<()>;
}

/// The four capability groups handed to the dispatcher
#[derive(Clone)]
pub struct Probes {
    pub data: Arc<dyn DataProbe>,
    pub mailbox: Arc<dyn MailboxProbe>,
    pub quota: Arc<dyn QuotaProbe>,
    pub sieve: Arc<dyn SieveProbe>,
}

impl Probes {
    #[must_use]
    pub fn new(
        data: Arc<dyn DataProbe>,
        mailbox: Arc<dyn MailboxProbe>,
        quota: Arc<dyn QuotaProbe>,
        sieve: Arc<dyn SieveProbe>,
    ) -> Self {
        Self {
            data,
            mailbox,
            quota,
            sieve,
        }
    }

    /// Every group served by one remote session
    #[must_use]
    pub fn remote(probe: RemoteProbe) -> Self {
        let probe = Arc::new(probe);
        Self {
            data: probe.clone(),
            mailbox: probe.clone(),
            quota: probe.clone(),
            sieve: probe,
        }
    }
}

//! In-memory mail server shared by the integration tests
//!
//! [`MailState`] implements every capability group directly, so dispatch can
//! be tested without a network. [`StateHandler`] serves the same state over
//! the management protocol for full round trips.

#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use mailctl::{
    Probes,
    probe::{DataProbe, MailboxProbe, QuotaProbe, SieveProbe},
    shell::Connector,
};
use mailctl_control::{
    ControlError, ControlServer, DirectoryCommand, Magnitude, MailboxCommand, MailboxPath,
    Mappings, QuotaCommand, QuotaUsage, Request, RequestCommand, Response, ResponseData, Result,
    SieveCommand, Signal, SystemCommand, server::CommandHandler,
};
use tokio::sync::broadcast;

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<String, String>,
    domains: Vec<String>,
    mappings: BTreeMap<String, Mappings>,
    mailboxes: Vec<MailboxPath>,
    storage_usage: BTreeMap<String, Magnitude>,
    max_storage: BTreeMap<String, Magnitude>,
    max_message_count: BTreeMap<String, Magnitude>,
    default_max_storage: Option<Magnitude>,
    default_max_message_count: Option<Magnitude>,
    sieve_quota: Option<u64>,
    user_sieve_quota: BTreeMap<String, u64>,
}

/// Mail server state plus a log of every capability call
#[derive(Debug, Default)]
pub struct MailState {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
}

fn not_found(what: impl std::fmt::Display) -> ControlError {
    ControlError::ServerError(format!("{what} does not exist"))
}

impl MailState {
    pub fn with_users<'a>(self, users: impl IntoIterator<Item = &'a str>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for user in users {
                state.users.insert(user.to_string(), String::new());
            }
        }
        self
    }

    pub fn with_domains<'a>(self, domains: impl IntoIterator<Item = &'a str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .domains
            .extend(domains.into_iter().map(ToString::to_string));
        self
    }

    pub fn with_storage_usage(self, quota_root: &str, used: Magnitude) -> Self {
        self.state
            .lock()
            .unwrap()
            .storage_usage
            .insert(quota_root.to_string(), used);
        self
    }

    pub fn with_max_storage(self, quota_root: &str, max: Magnitude) -> Self {
        self.state
            .lock()
            .unwrap()
            .max_storage
            .insert(quota_root.to_string(), max);
        self
    }

    /// Every capability call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn password(&self, username: &str) -> Option<String> {
        self.state.lock().unwrap().users.get(username).cloned()
    }

    pub fn mailboxes(&self) -> Vec<MailboxPath> {
        self.state.lock().unwrap().mailboxes.clone()
    }

    pub fn user_sieve_quota(&self, username: &str) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .user_sieve_quota
            .get(username)
            .copied()
    }

    /// Probes over this state, without a network
    pub fn probes(self: &Arc<Self>) -> Probes {
        Probes::new(self.clone(), self.clone(), self.clone(), self.clone())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DataProbe for MailState {
    async fn add_user(&self, username: &str, password: &str) -> Result<()> {
        self.record(format!("add_user({username})"));
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(username) {
            return Err(ControlError::ServerError(format!(
                "User {username} already exists"
            )));
        }
        state.users.insert(username.to_string(), password.to_string());
        Ok(())
    }

    async fn remove_user(&self, username: &str) -> Result<()> {
        self.record(format!("remove_user({username})"));
        self.state
            .lock()
            .unwrap()
            .users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("User {username}")))
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        self.record("list_users".to_string());
        Ok(self.state.lock().unwrap().users.keys().cloned().collect())
    }

    async fn add_domain(&self, domain: &str) -> Result<()> {
        self.record(format!("add_domain({domain})"));
        let mut state = self.state.lock().unwrap();
        if !state.domains.iter().any(|d| d == domain) {
            state.domains.push(domain.to_string());
        }
        Ok(())
    }

    async fn remove_domain(&self, domain: &str) -> Result<()> {
        self.record(format!("remove_domain({domain})"));
        let mut state = self.state.lock().unwrap();
        let before = state.domains.len();
        state.domains.retain(|d| d != domain);
        if state.domains.len() == before {
            return Err(not_found(format!("Domain {domain}")));
        }
        Ok(())
    }

    async fn contains_domain(&self, domain: &str) -> Result<bool> {
        self.record(format!("contains_domain({domain})"));
        Ok(self.state.lock().unwrap().domains.iter().any(|d| d == domain))
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        self.record("list_domains".to_string());
        Ok(self.state.lock().unwrap().domains.clone())
    }

    async fn list_mappings(&self) -> Result<BTreeMap<String, Mappings>> {
        self.record("list_mappings".to_string());
        Ok(self.state.lock().unwrap().mappings.clone())
    }

    async fn list_user_domain_mappings(&self, user: &str, domain: &str) -> Result<Mappings> {
        self.record(format!("list_user_domain_mappings({user}, {domain})"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .mappings
            .get(&format!("{user}@{domain}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_address_mapping(&self, user: &str, domain: &str, address: &str) -> Result<()> {
        self.record(format!("add_address_mapping({user}, {domain}, {address})"));
        self.add_mapping(user, domain, address.to_string());
        Ok(())
    }

    async fn remove_address_mapping(
        &self,
        user: &str,
        domain: &str,
        address: &str,
    ) -> Result<()> {
        self.record(format!(
            "remove_address_mapping({user}, {domain}, {address})"
        ));
        self.remove_mapping(user, domain, address)
    }

    async fn add_regex_mapping(&self, user: &str, domain: &str, regex: &str) -> Result<()> {
        self.record(format!("add_regex_mapping({user}, {domain}, {regex})"));
        self.add_mapping(user, domain, format!("regex:{regex}"));
        Ok(())
    }

    async fn remove_regex_mapping(&self, user: &str, domain: &str, regex: &str) -> Result<()> {
        self.record(format!("remove_regex_mapping({user}, {domain}, {regex})"));
        self.remove_mapping(user, domain, &format!("regex:{regex}"))
    }

    async fn set_password(&self, username: &str, password: &str) -> Result<()> {
        self.record(format!("set_password({username})"));
        let mut state = self.state.lock().unwrap();
        let entry = state
            .users
            .get_mut(username)
            .ok_or_else(|| not_found(format!("User {username}")))?;
        *entry = password.to_string();
        Ok(())
    }
}

impl MailState {
    fn add_mapping(&self, user: &str, domain: &str, mapping: String) {
        self.state
            .lock()
            .unwrap()
            .mappings
            .entry(format!("{user}@{domain}"))
            .or_default()
            .push(mapping);
    }

    fn remove_mapping(&self, user: &str, domain: &str, mapping: &str) -> Result<()> {
        let source = format!("{user}@{domain}");
        let mut state = self.state.lock().unwrap();
        let mappings = state
            .mappings
            .get_mut(&source)
            .ok_or_else(|| not_found(format!("Mapping for {source}")))?;
        if !mappings.remove(mapping) {
            return Err(not_found(format!("Mapping {mapping}")));
        }
        if mappings.is_empty() {
            state.mappings.remove(&source);
        }
        Ok(())
    }
}

#[async_trait]
impl MailboxProbe for MailState {
    async fn copy_mailbox(&self, source: &str, destination: &str) -> Result<()> {
        self.record(format!("copy_mailbox({source}, {destination})"));
        Ok(())
    }

    async fn delete_user_mailboxes(&self, user: &str) -> Result<()> {
        self.record(format!("delete_user_mailboxes({user})"));
        self.state
            .lock()
            .unwrap()
            .mailboxes
            .retain(|path| path.user != user);
        Ok(())
    }

    async fn create_mailbox(&self, path: &MailboxPath) -> Result<()> {
        self.record(format!("create_mailbox({path})"));
        self.state.lock().unwrap().mailboxes.push(path.clone());
        Ok(())
    }

    async fn list_user_mailboxes(&self, user: &str) -> Result<Vec<String>> {
        self.record(format!("list_user_mailboxes({user})"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .mailboxes
            .iter()
            .filter(|path| path.user == user)
            .map(|path| path.name.clone())
            .collect())
    }

    async fn delete_mailbox(&self, path: &MailboxPath) -> Result<()> {
        self.record(format!("delete_mailbox({path})"));
        self.state.lock().unwrap().mailboxes.retain(|p| p != path);
        Ok(())
    }

    async fn reindex_mailbox(&self, path: &MailboxPath) -> Result<()> {
        self.record(format!("reindex_mailbox({path})"));
        Ok(())
    }

    async fn reindex_all(&self) -> Result<()> {
        self.record("reindex_all".to_string());
        Ok(())
    }
}

#[async_trait]
impl QuotaProbe for MailState {
    async fn get_storage_quota(&self, quota_root: &str) -> Result<QuotaUsage> {
        self.record(format!("get_storage_quota({quota_root})"));
        let state = self.state.lock().unwrap();
        Ok(QuotaUsage::new(
            state
                .storage_usage
                .get(quota_root)
                .copied()
                .unwrap_or(Magnitude::Unknown),
            state
                .max_storage
                .get(quota_root)
                .copied()
                .unwrap_or(Magnitude::Unlimited),
        ))
    }

    async fn get_message_count_quota(&self, quota_root: &str) -> Result<QuotaUsage> {
        self.record(format!("get_message_count_quota({quota_root})"));
        let state = self.state.lock().unwrap();
        Ok(QuotaUsage::new(
            Magnitude::Known(0),
            state
                .max_message_count
                .get(quota_root)
                .copied()
                .unwrap_or(Magnitude::Unlimited),
        ))
    }

    async fn get_quota_root(&self, path: &MailboxPath) -> Result<String> {
        self.record(format!("get_quota_root({path})"));
        Ok(format!("{}&{}", path.namespace, path.user))
    }

    async fn get_max_storage(&self, quota_root: &str) -> Result<Magnitude> {
        self.record(format!("get_max_storage({quota_root})"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .max_storage
            .get(quota_root)
            .copied()
            .unwrap_or(Magnitude::Unknown))
    }

    async fn set_max_storage(&self, quota_root: &str, limit: Magnitude) -> Result<()> {
        self.record(format!("set_max_storage({quota_root}, {limit:?})"));
        self.state
            .lock()
            .unwrap()
            .max_storage
            .insert(quota_root.to_string(), limit);
        Ok(())
    }

    async fn get_max_message_count(&self, quota_root: &str) -> Result<Magnitude> {
        self.record(format!("get_max_message_count({quota_root})"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .max_message_count
            .get(quota_root)
            .copied()
            .unwrap_or(Magnitude::Unknown))
    }

    async fn set_max_message_count(&self, quota_root: &str, limit: Magnitude) -> Result<()> {
        self.record(format!("set_max_message_count({quota_root}, {limit:?})"));
        self.state
            .lock()
            .unwrap()
            .max_message_count
            .insert(quota_root.to_string(), limit);
        Ok(())
    }

    async fn get_default_max_storage(&self) -> Result<Magnitude> {
        self.record("get_default_max_storage".to_string());
        Ok(self
            .state
            .lock()
            .unwrap()
            .default_max_storage
            .unwrap_or(Magnitude::Unknown))
    }

    async fn set_default_max_storage(&self, limit: Magnitude) -> Result<()> {
        self.record(format!("set_default_max_storage({limit:?})"));
        self.state.lock().unwrap().default_max_storage = Some(limit);
        Ok(())
    }

    async fn get_default_max_message_count(&self) -> Result<Magnitude> {
        self.record("get_default_max_message_count".to_string());
        Ok(self
            .state
            .lock()
            .unwrap()
            .default_max_message_count
            .unwrap_or(Magnitude::Unknown))
    }

    async fn set_default_max_message_count(&self, limit: Magnitude) -> Result<()> {
        self.record(format!("set_default_max_message_count({limit:?})"));
        self.state.lock().unwrap().default_max_message_count = Some(limit);
        Ok(())
    }
}

#[async_trait]
impl SieveProbe for MailState {
    async fn get_sieve_quota(&self) -> Result<Magnitude> {
        self.record("get_sieve_quota".to_string());
        self.state
            .lock()
            .unwrap()
            .sieve_quota
            .map(Magnitude::Known)
            .ok_or_else(|| not_found("Sieve quota"))
    }

    async fn set_sieve_quota(&self, bytes: u64) -> Result<()> {
        self.record(format!("set_sieve_quota({bytes})"));
        self.state.lock().unwrap().sieve_quota = Some(bytes);
        Ok(())
    }

    async fn remove_sieve_quota(&self) -> Result<()> {
        self.record("remove_sieve_quota".to_string());
        self.state.lock().unwrap().sieve_quota = None;
        Ok(())
    }

    async fn get_user_sieve_quota(&self, username: &str) -> Result<Magnitude> {
        self.record(format!("get_user_sieve_quota({username})"));
        self.user_sieve_quota(username)
            .map(Magnitude::Known)
            .ok_or_else(|| not_found(format!("Sieve quota for {username}")))
    }

    async fn set_user_sieve_quota(&self, username: &str, bytes: u64) -> Result<()> {
        self.record(format!("set_user_sieve_quota({username}, {bytes})"));
        self.state
            .lock()
            .unwrap()
            .user_sieve_quota
            .insert(username.to_string(), bytes);
        Ok(())
    }

    async fn remove_user_sieve_quota(&self, username: &str) -> Result<()> {
        self.record(format!("remove_user_sieve_quota({username})"));
        self.state.lock().unwrap().user_sieve_quota.remove(username);
        Ok(())
    }
}

/// Hands out probes over a [`MailState`] and counts connection attempts
#[derive(Debug, Default)]
pub struct LocalConnector {
    pub state: Arc<MailState>,
    pub connections: Mutex<Vec<(String, u16)>>,
    /// Time each connection attempt takes
    pub delay: Duration,
}

impl LocalConnector {
    pub fn new(state: MailState) -> Self {
        Self {
            state: Arc::new(state),
            connections: Mutex::default(),
            delay: Duration::ZERO,
        }
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn connections(&self) -> Vec<(String, u16)> {
        self.connections.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Probes> {
        tokio::time::sleep(self.delay).await;
        self.connections
            .lock()
            .unwrap()
            .push((host.to_string(), port));
        Ok(self.state.probes())
    }
}

/// Serves a [`MailState`] over the management protocol
pub struct StateHandler(pub Arc<MailState>);

fn done(result: Result<()>) -> Result<Response> {
    result.map(|()| Response::ok())
}

fn data<T>(result: Result<T>, wrap: impl FnOnce(T) -> ResponseData) -> Result<Response> {
    result.map(|value| Response::data(wrap(value)))
}

#[async_trait]
impl CommandHandler for StateHandler {
    async fn handle_request(&self, request: Request) -> Result<Response> {
        let state = self.0.as_ref();
        let result = match request.command {
            RequestCommand::Directory(command) => match command {
                DirectoryCommand::AddUser { username, password } => {
                    done(state.add_user(&username, &password).await)
                }
                DirectoryCommand::RemoveUser(username) => done(state.remove_user(&username).await),
                DirectoryCommand::ListUsers => data(state.list_users().await, ResponseData::Names),
                DirectoryCommand::AddDomain(domain) => done(state.add_domain(&domain).await),
                DirectoryCommand::RemoveDomain(domain) => done(state.remove_domain(&domain).await),
                DirectoryCommand::ContainsDomain(domain) => {
                    data(state.contains_domain(&domain).await, ResponseData::Flag)
                }
                DirectoryCommand::ListDomains => {
                    data(state.list_domains().await, ResponseData::Names)
                }
                DirectoryCommand::ListMappings => {
                    data(state.list_mappings().await, ResponseData::Mappings)
                }
                DirectoryCommand::ListUserDomainMappings { user, domain } => data(
                    state.list_user_domain_mappings(&user, &domain).await,
                    ResponseData::UserMappings,
                ),
                DirectoryCommand::AddAddressMapping {
                    user,
                    domain,
                    address,
                } => done(state.add_address_mapping(&user, &domain, &address).await),
                DirectoryCommand::RemoveAddressMapping {
                    user,
                    domain,
                    address,
                } => done(state.remove_address_mapping(&user, &domain, &address).await),
                DirectoryCommand::AddRegexMapping {
                    user,
                    domain,
                    regex,
                } => done(state.add_regex_mapping(&user, &domain, &regex).await),
                DirectoryCommand::RemoveRegexMapping {
                    user,
                    domain,
                    regex,
                } => done(state.remove_regex_mapping(&user, &domain, &regex).await),
                DirectoryCommand::SetPassword { username, password } => {
                    done(state.set_password(&username, &password).await)
                }
            },
            RequestCommand::Mailbox(command) => match command {
                MailboxCommand::Copy {
                    source,
                    destination,
                } => done(state.copy_mailbox(&source, &destination).await),
                MailboxCommand::DeleteUserMailboxes(user) => {
                    done(state.delete_user_mailboxes(&user).await)
                }
                MailboxCommand::Create(path) => done(state.create_mailbox(&path).await),
                MailboxCommand::ListUserMailboxes(user) => {
                    data(state.list_user_mailboxes(&user).await, ResponseData::Names)
                }
                MailboxCommand::Delete(path) => done(state.delete_mailbox(&path).await),
                MailboxCommand::Reindex(path) => done(state.reindex_mailbox(&path).await),
                MailboxCommand::ReindexAll => done(state.reindex_all().await),
            },
            RequestCommand::Quota(command) => match command {
                QuotaCommand::GetStorageQuota(root) => {
                    data(state.get_storage_quota(&root).await, ResponseData::Quota)
                }
                QuotaCommand::GetMessageCountQuota(root) => {
                    data(state.get_message_count_quota(&root).await, ResponseData::Quota)
                }
                QuotaCommand::GetQuotaRoot(path) => {
                    data(state.get_quota_root(&path).await, ResponseData::QuotaRoot)
                }
                QuotaCommand::GetMaxStorage(root) => {
                    data(state.get_max_storage(&root).await, ResponseData::Limit)
                }
                QuotaCommand::SetMaxStorage { quota_root, limit } => {
                    done(state.set_max_storage(&quota_root, limit).await)
                }
                QuotaCommand::GetMaxMessageCount(root) => {
                    data(state.get_max_message_count(&root).await, ResponseData::Limit)
                }
                QuotaCommand::SetMaxMessageCount { quota_root, limit } => {
                    done(state.set_max_message_count(&quota_root, limit).await)
                }
                QuotaCommand::GetDefaultMaxStorage => {
                    data(state.get_default_max_storage().await, ResponseData::Limit)
                }
                QuotaCommand::SetDefaultMaxStorage(limit) => {
                    done(state.set_default_max_storage(limit).await)
                }
                QuotaCommand::GetDefaultMaxMessageCount => data(
                    state.get_default_max_message_count().await,
                    ResponseData::Limit,
                ),
                QuotaCommand::SetDefaultMaxMessageCount(limit) => {
                    done(state.set_default_max_message_count(limit).await)
                }
            },
            RequestCommand::Sieve(command) => match command {
                SieveCommand::GetQuota => data(state.get_sieve_quota().await, ResponseData::Limit),
                SieveCommand::SetQuota(bytes) => done(state.set_sieve_quota(bytes).await),
                SieveCommand::RemoveQuota => done(state.remove_sieve_quota().await),
                SieveCommand::GetUserQuota(username) => {
                    data(state.get_user_sieve_quota(&username).await, ResponseData::Limit)
                }
                SieveCommand::SetUserQuota { username, bytes } => {
                    done(state.set_user_sieve_quota(&username, bytes).await)
                }
                SieveCommand::RemoveUserQuota(username) => {
                    done(state.remove_user_sieve_quota(&username).await)
                }
            },
            RequestCommand::System(SystemCommand::Ping) => Ok(Response::ok()),
        };

        // Domain failures travel as error payloads
        match result {
            Err(ControlError::ServerError(message)) => Ok(Response::error(message)),
            other => other,
        }
    }
}

/// Start a management server over `state` on an ephemeral port
pub async fn start_server(state: Arc<MailState>) -> (u16, broadcast::Sender<Signal>) {
    let server = ControlServer::bind("127.0.0.1:0", Arc::new(StateHandler(state)))
        .await
        .expect("Failed to bind server");
    let port = server.local_addr().unwrap().port();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if let Err(e) = server.serve(shutdown_rx).await {
            eprintln!("Server error: {e}");
        }
    });

    (port, shutdown_tx)
}

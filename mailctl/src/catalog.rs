//! The fixed table of commands `mailctl` understands
//!
//! Arity always counts every positional token, command name included, so
//! `adduser alice secret` is three tokens against `Arity::Exact(3)`.

use std::fmt;

use crate::dispatch::{Handler, directory, mailbox, quota, sieve};

/// Token-count contract of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many tokens
    Exact(usize),
    /// Any of the listed token counts
    OneOf(&'static [usize]),
    /// Between `min` and `max` tokens, both inclusive
    Range { min: usize, max: usize },
}

impl Arity {
    /// Whether `tokens` positional tokens satisfy this contract
    #[must_use]
    pub fn accepts(self, tokens: usize) -> bool {
        match self {
            Self::Exact(n) => tokens == n,
            Self::OneOf(counts) => counts.contains(&tokens),
            Self::Range { min, max } => (min..=max).contains(&tokens),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::OneOf(counts) => {
                let counts = counts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "one of {counts}")
            }
            Self::Range { min, max } => write!(f, "between {min} and {max}"),
        }
    }
}

/// One catalog entry
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Command name as typed by the operator (lowercase)
    pub name: &'static str,
    pub arity: Arity,
    /// One-line usage shown in the help footer
    pub usage: &'static str,
    pub handler: Handler,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    const fn new(name: &'static str, arity: Arity, usage: &'static str, handler: Handler) -> Self {
        Self {
            name,
            arity,
            usage,
            handler,
        }
    }
}

/// Read-only command table
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    specs: &'static [CommandSpec],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The commands shipped with `mailctl`
    #[must_use]
    pub const fn builtin() -> Self {
        Self { specs: BUILTIN }
    }

    /// Case-sensitive exact lookup
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&'static CommandSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static CommandSpec> {
        self.specs.iter()
    }

    /// Usage lines of every command, one per line
    #[must_use]
    pub fn usage(&self) -> String {
        self.specs
            .iter()
            .map(|spec| spec.usage)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

static BUILTIN: &[CommandSpec] = &[
    CommandSpec::new("adduser", Arity::Exact(3), "adduser <username> <password>", directory::add_user),
    CommandSpec::new("removeuser", Arity::Exact(2), "removeuser <username>", directory::remove_user),
    CommandSpec::new("listusers", Arity::Exact(1), "listusers", directory::list_users),
    CommandSpec::new("adddomain", Arity::Exact(2), "adddomain <domainname>", directory::add_domain),
    CommandSpec::new("removedomain", Arity::Exact(2), "removedomain <domainname>", directory::remove_domain),
    CommandSpec::new("containsdomain", Arity::Exact(2), "containsdomain <domainname>", directory::contains_domain),
    CommandSpec::new("listdomains", Arity::Exact(1), "listdomains", directory::list_domains),
    CommandSpec::new("listmappings", Arity::Exact(1), "listmappings", directory::list_mappings),
    CommandSpec::new(
        "listuserdomainmappings",
        Arity::Exact(3),
        "listuserdomainmappings <user> <domain>",
        directory::list_user_domain_mappings,
    ),
    CommandSpec::new(
        "addaddressmapping",
        Arity::Exact(4),
        "addaddressmapping <user> <domain> <fromaddress>",
        directory::add_address_mapping,
    ),
    CommandSpec::new(
        "removeaddressmapping",
        Arity::Exact(4),
        "removeaddressmapping <user> <domain> <fromaddress>",
        directory::remove_address_mapping,
    ),
    CommandSpec::new(
        "addregexmapping",
        Arity::Exact(4),
        "addregexmapping <user> <domain> <regex>",
        directory::add_regex_mapping,
    ),
    CommandSpec::new(
        "removeregexmapping",
        Arity::Exact(4),
        "removeregexmapping <user> <domain> <regex>",
        directory::remove_regex_mapping,
    ),
    CommandSpec::new("setpassword", Arity::Exact(3), "setpassword <username> <password>", directory::set_password),
    CommandSpec::new("copymailbox", Arity::Exact(3), "copymailbox <srcbean> <dstbean>", mailbox::copy_mailbox),
    CommandSpec::new(
        "deleteusermailboxes",
        Arity::Exact(2),
        "deleteusermailboxes <user>",
        mailbox::delete_user_mailboxes,
    ),
    CommandSpec::new(
        "createmailbox",
        Arity::Exact(4),
        "createmailbox <namespace> <user> <name>",
        mailbox::create_mailbox,
    ),
    CommandSpec::new(
        "listusermailboxes",
        Arity::Exact(2),
        "listusermailboxes <user>",
        mailbox::list_user_mailboxes,
    ),
    CommandSpec::new(
        "deletemailbox",
        Arity::Exact(4),
        "deletemailbox <namespace> <user> <name>",
        mailbox::delete_mailbox,
    ),
    CommandSpec::new(
        "reindexmailbox",
        Arity::Exact(4),
        "reindexmailbox <namespace> <user> <name>",
        mailbox::reindex_mailbox,
    ),
    CommandSpec::new("reindexall", Arity::Exact(1), "reindexall", mailbox::reindex_all),
    CommandSpec::new("getstoragequota", Arity::Exact(2), "getstoragequota <quotaroot>", quota::get_storage_quota),
    CommandSpec::new(
        "getmessagecountquota",
        Arity::Exact(2),
        "getmessagecountquota <quotaroot>",
        quota::get_message_count_quota,
    ),
    CommandSpec::new(
        "getquotaroot",
        Arity::Exact(4),
        "getquotaroot <namespace> <user> <name>",
        quota::get_quota_root,
    ),
    CommandSpec::new(
        "getmaxstoragequota",
        Arity::Exact(2),
        "getmaxstoragequota <quotaroot>",
        quota::get_max_storage_quota,
    ),
    CommandSpec::new(
        "getmaxmessagecountquota",
        Arity::Exact(2),
        "getmaxmessagecountquota <quotaroot>",
        quota::get_max_message_count_quota,
    ),
    CommandSpec::new(
        "setmaxstoragequota",
        Arity::Exact(3),
        "setmaxstoragequota <quotaroot> <maxstorage>",
        quota::set_max_storage_quota,
    ),
    CommandSpec::new(
        "setmaxmessagecountquota",
        Arity::Exact(3),
        "setmaxmessagecountquota <quotaroot> <maxmessagecount>",
        quota::set_max_message_count_quota,
    ),
    CommandSpec::new(
        "getdefaultmaxstoragequota",
        Arity::Exact(1),
        "getdefaultmaxstoragequota",
        quota::get_default_max_storage_quota,
    ),
    CommandSpec::new(
        "setdefaultmaxstoragequota",
        Arity::Exact(2),
        "setdefaultmaxstoragequota <maxstorage>",
        quota::set_default_max_storage_quota,
    ),
    CommandSpec::new(
        "getdefaultmaxmessagecountquota",
        Arity::Exact(1),
        "getdefaultmaxmessagecountquota",
        quota::get_default_max_message_count_quota,
    ),
    CommandSpec::new(
        "setdefaultmaxmessagecountquota",
        Arity::Exact(2),
        "setdefaultmaxmessagecountquota <maxmessagecount>",
        quota::set_default_max_message_count_quota,
    ),
    CommandSpec::new("getsievequota", Arity::Exact(1), "getsievequota", sieve::get_sieve_quota),
    CommandSpec::new("setsievequota", Arity::Exact(2), "setsievequota <quota>", sieve::set_sieve_quota),
    CommandSpec::new("removesievequota", Arity::Exact(1), "removesievequota", sieve::remove_sieve_quota),
    CommandSpec::new(
        "getsieveuserquota",
        Arity::Exact(2),
        "getsieveuserquota <username>",
        sieve::get_sieve_user_quota,
    ),
    CommandSpec::new(
        "setsieveuserquota",
        Arity::Exact(3),
        "setsieveuserquota <username> <quota>",
        sieve::set_sieve_user_quota,
    ),
    CommandSpec::new(
        "removesieveuserquota",
        Arity::Exact(2),
        "removesieveuserquota <username>",
        sieve::remove_sieve_user_quota,
    ),
];

//! Mailbox lifecycle and indexing

use mailctl_control::MailboxPath;

use super::{Output, Positional};
use crate::error::Result;

/// `<namespace> <user> <name>` starting at the first argument
fn mailbox_path(args: &Positional<'_>) -> Result<MailboxPath> {
    Ok(MailboxPath::new(args.at(0)?, args.at(1)?, args.at(2)?))
}

handler!(copy_mailbox, |args, probes| {
    probes.mailbox.copy_mailbox(args.at(0)?, args.at(1)?).await?;
    Ok(Output::empty())
});

handler!(delete_user_mailboxes, |args, probes| {
    probes.mailbox.delete_user_mailboxes(args.at(0)?).await?;
    Ok(Output::empty())
});

handler!(create_mailbox, |args, probes| {
    probes.mailbox.create_mailbox(&mailbox_path(&args)?).await?;
    Ok(Output::empty())
});

handler!(list_user_mailboxes, |args, probes| {
    Ok(probes
        .mailbox
        .list_user_mailboxes(args.at(0)?)
        .await?
        .into_iter()
        .collect())
});

handler!(delete_mailbox, |args, probes| {
    probes.mailbox.delete_mailbox(&mailbox_path(&args)?).await?;
    Ok(Output::empty())
});

handler!(reindex_mailbox, |args, probes| {
    probes.mailbox.reindex_mailbox(&mailbox_path(&args)?).await?;
    Ok(Output::empty())
});

handler!(reindex_all, |_args, probes| {
    probes.mailbox.reindex_all().await?;
    Ok(Output::empty())
});

//! Storage and message-count quotas

use mailctl_control::MailboxPath;

use super::Output;
use crate::format::{format_count, format_storage, parse_count_limit, parse_storage_limit};

handler!(get_storage_quota, |args, probes| {
    let quota_root = args.at(0)?;
    let usage = probes.quota.get_storage_quota(quota_root).await?;
    Ok(Output::line(format!(
        "Storage quota for {quota_root} is : {} / {}",
        format_storage(usage.used),
        format_storage(usage.max)
    )))
});

handler!(get_message_count_quota, |args, probes| {
    let quota_root = args.at(0)?;
    let usage = probes.quota.get_message_count_quota(quota_root).await?;
    Ok(Output::line(format!(
        "Message count quota for {quota_root} is : {} / {}",
        format_count(usage.used),
        format_count(usage.max)
    )))
});

handler!(get_quota_root, |args, probes| {
    let path = MailboxPath::new(args.at(0)?, args.at(1)?, args.at(2)?);
    let root = probes.quota.get_quota_root(&path).await?;
    Ok(Output::line(format!("Quota Root : {root}")))
});

handler!(get_max_storage_quota, |args, probes| {
    let quota_root = args.at(0)?;
    let max = probes.quota.get_max_storage(quota_root).await?;
    Ok(Output::line(format!(
        "Storage space allowed for Quota Root {quota_root} : {}",
        format_storage(max)
    )))
});

handler!(get_max_message_count_quota, |args, probes| {
    let quota_root = args.at(0)?;
    let max = probes.quota.get_max_message_count(quota_root).await?;
    Ok(Output::line(format!(
        "Message count allowed for Quota Root {quota_root} : {}",
        format_count(max)
    )))
});

// Limits are parsed before any remote call
handler!(set_max_storage_quota, |args, probes| {
    let quota_root = args.at(0)?;
    let limit = parse_storage_limit(args.at(1)?)?;
    probes.quota.set_max_storage(quota_root, limit).await?;
    Ok(Output::empty())
});

handler!(set_max_message_count_quota, |args, probes| {
    let quota_root = args.at(0)?;
    let limit = parse_count_limit(args.at(1)?)?;
    probes.quota.set_max_message_count(quota_root, limit).await?;
    Ok(Output::empty())
});

handler!(get_default_max_storage_quota, |_args, probes| {
    let max = probes.quota.get_default_max_storage().await?;
    Ok(Output::line(format!(
        "Default Maximum Storage Quota : {}",
        format_storage(max)
    )))
});

handler!(set_default_max_storage_quota, |args, probes| {
    let limit = parse_storage_limit(args.at(0)?)?;
    probes.quota.set_default_max_storage(limit).await?;
    Ok(Output::empty())
});

handler!(get_default_max_message_count_quota, |_args, probes| {
    let max = probes.quota.get_default_max_message_count().await?;
    Ok(Output::line(format!(
        "Default Maximum message count Quota : {}",
        format_count(max)
    )))
});

handler!(set_default_max_message_count_quota, |args, probes| {
    let limit = parse_count_limit(args.at(0)?)?;
    probes.quota.set_default_max_message_count(limit).await?;
    Ok(Output::empty())
});

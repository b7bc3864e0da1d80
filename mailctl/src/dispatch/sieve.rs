//! Sieve script storage quotas

use super::Output;
use crate::format::{ValueWithUnit, format_storage};

handler!(get_sieve_quota, |_args, probes| {
    let quota = probes.sieve.get_sieve_quota().await?;
    Ok(Output::line(format!(
        "Storage space allowed for Sieve scripts by default : {}",
        format_storage(quota)
    )))
});

handler!(set_sieve_quota, |args, probes| {
    let bytes = ValueWithUnit::parse(args.at(0)?)?;
    probes.sieve.set_sieve_quota(bytes).await?;
    Ok(Output::empty())
});

handler!(remove_sieve_quota, |_args, probes| {
    probes.sieve.remove_sieve_quota().await?;
    Ok(Output::empty())
});

handler!(get_sieve_user_quota, |args, probes| {
    let username = args.at(0)?;
    let quota = probes.sieve.get_user_sieve_quota(username).await?;
    Ok(Output::line(format!(
        "Storage space allowed for {username} Sieve scripts : {}",
        format_storage(quota)
    )))
});

handler!(set_sieve_user_quota, |args, probes| {
    let username = args.at(0)?;
    let bytes = ValueWithUnit::parse(args.at(1)?)?;
    probes.sieve.set_user_sieve_quota(username, bytes).await?;
    Ok(Output::empty())
});

handler!(remove_sieve_user_quota, |args, probes| {
    probes.sieve.remove_user_sieve_quota(args.at(0)?).await?;
    Ok(Output::empty())
});

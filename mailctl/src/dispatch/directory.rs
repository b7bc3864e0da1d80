//! Users, domains and address mappings

use super::Output;

handler!(add_user, |args, probes| {
    probes.data.add_user(args.at(0)?, args.at(1)?).await?;
    Ok(Output::empty())
});

handler!(remove_user, |args, probes| {
    probes.data.remove_user(args.at(0)?).await?;
    Ok(Output::empty())
});

handler!(list_users, |_args, probes| {
    Ok(probes.data.list_users().await?.into_iter().collect())
});

handler!(add_domain, |args, probes| {
    probes.data.add_domain(args.at(0)?).await?;
    Ok(Output::empty())
});

handler!(remove_domain, |args, probes| {
    probes.data.remove_domain(args.at(0)?).await?;
    Ok(Output::empty())
});

handler!(contains_domain, |args, probes| {
    let domain = args.at(0)?;
    let line = if probes.data.contains_domain(domain).await? {
        format!("{domain} exists")
    } else {
        format!("{domain} does not exist")
    };
    Ok(Output::line(line))
});

handler!(list_domains, |_args, probes| {
    Ok(probes.data.list_domains().await?.into_iter().collect())
});

// `source=serialized` per entry, then a blank line
handler!(list_mappings, |_args, probes| {
    let mut output: Output = probes
        .data
        .list_mappings()
        .await?
        .iter()
        .map(|(source, mappings)| format!("{source}={}", mappings.serialized()))
        .collect();
    output.push("");
    Ok(output)
});

handler!(list_user_domain_mappings, |args, probes| {
    let mappings = probes
        .data
        .list_user_domain_mappings(args.at(0)?, args.at(1)?)
        .await?;
    Ok(mappings.as_strings().iter().cloned().collect())
});

handler!(add_address_mapping, |args, probes| {
    probes
        .data
        .add_address_mapping(args.at(0)?, args.at(1)?, args.at(2)?)
        .await?;
    Ok(Output::empty())
});

handler!(remove_address_mapping, |args, probes| {
    probes
        .data
        .remove_address_mapping(args.at(0)?, args.at(1)?, args.at(2)?)
        .await?;
    Ok(Output::empty())
});

handler!(add_regex_mapping, |args, probes| {
    probes
        .data
        .add_regex_mapping(args.at(0)?, args.at(1)?, args.at(2)?)
        .await?;
    Ok(Output::empty())
});

handler!(remove_regex_mapping, |args, probes| {
    probes
        .data
        .remove_regex_mapping(args.at(0)?, args.at(1)?, args.at(2)?)
        .await?;
    Ok(Output::empty())
});

handler!(set_password, |args, probes| {
    probes.data.set_password(args.at(0)?, args.at(1)?).await?;
    Ok(Output::empty())
});

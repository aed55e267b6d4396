//! Surge rule list (`.conf`).

use super::{banner, push_typed};
use crate::rule::NO_RESOLVE;
use crate::ruleset::{Metadata, Preprocessed, ResolveLists, RuleSetKind};
use crate::{Result, RuleType};

pub(super) fn render(view: &Preprocessed, meta: &Metadata) -> Result<Vec<String>> {
    let mut out = banner(meta, view.rule_count())?;

    if meta.kind == RuleSetKind::Domain {
        // DOMAIN-SET: `.example.com` matches the domain and its subdomains
        out.extend(view.domains.iter().map(|entry| entry.to_domainset_line()));
        return Ok(out);
    }

    push_typed(&mut out, RuleType::Domain.as_str(), view.exact_domains(), None);
    push_typed(&mut out, RuleType::DomainSuffix.as_str(), view.suffix_domains(), None);
    push_typed(&mut out, RuleType::DomainKeyword.as_str(), strs(&view.domain_keywords), None);
    push_typed(&mut out, RuleType::DomainWildcard.as_str(), strs(&view.domain_wildcards), None);
    push_typed(&mut out, RuleType::UserAgent.as_str(), strs(&view.user_agents), None);
    push_typed(&mut out, RuleType::ProcessName.as_str(), strs(&view.process_names), None);
    push_typed(&mut out, RuleType::ProcessName.as_str(), strs(&view.process_paths), None);
    push_typed(&mut out, RuleType::UrlRegex.as_str(), strs(&view.url_regexes), None);
    push_resolvable(&mut out, RuleType::IpCidr, &view.ip_cidr);
    push_resolvable(&mut out, RuleType::IpCidr6, &view.ip_cidr6);
    push_resolvable(&mut out, RuleType::IpAsn, &view.ip_asn);
    push_resolvable(&mut out, RuleType::GeoIp, &view.geoip);
    push_typed(&mut out, RuleType::SrcIp.as_str(), strs(&view.source_ip_or_cidr), None);
    push_typed(&mut out, RuleType::SrcPort.as_str(), strs(&view.source_ports), None);
    push_typed(&mut out, RuleType::DestPort.as_str(), strs(&view.dest_ports), None);
    out.extend(view.other_rules.iter().cloned());

    Ok(out)
}

fn push_resolvable(out: &mut Vec<String>, rule_type: RuleType, lists: &ResolveLists) {
    push_typed(out, rule_type.as_str(), strs(&lists.resolve), None);
    push_typed(out, rule_type.as_str(), strs(&lists.no_resolve), Some(NO_RESOLVE));
}

fn strs(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(String::as_str)
}

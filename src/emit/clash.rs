//! Clash rule provider text (`.txt`).
//!
//! Domain sets use the `domain` behavior (`+.example.com` for suffixes);
//! everything else uses `classical` rules. Clash has no USER-AGENT or
//! URL-REGEX matcher, so those buckets are left out.

use super::{banner, push_typed};
use crate::rule::{ip_to_cidr, IpVersion, NO_RESOLVE};
use crate::ruleset::{Metadata, Preprocessed, ResolveLists, RuleSetKind};
use crate::Result;

pub(super) fn render(view: &Preprocessed, meta: &Metadata) -> Result<Vec<String>> {
    let mut out = banner(meta, view.rule_count())?;

    if meta.kind == RuleSetKind::Domain {
        out.extend(view.domains.iter().map(|entry| {
            if entry.include_subdomains {
                format!("+.{}", entry.name)
            } else {
                entry.name.clone()
            }
        }));
        return Ok(out);
    }

    push_typed(&mut out, "DOMAIN", view.exact_domains(), None);
    push_typed(&mut out, "DOMAIN-SUFFIX", view.suffix_domains(), None);
    push_typed(&mut out, "DOMAIN-KEYWORD", strs(&view.domain_keywords), None);
    push_typed(&mut out, "DOMAIN-REGEX", strs(&view.domain_regexes), None);
    push_typed(&mut out, "PROCESS-NAME", strs(&view.process_names), None);
    push_typed(&mut out, "PROCESS-PATH", strs(&view.process_paths), None);
    push_resolvable(&mut out, "IP-CIDR", &view.ip_cidr);
    push_resolvable(&mut out, "IP-CIDR6", &view.ip_cidr6);
    push_resolvable(&mut out, "IP-ASN", &view.ip_asn);
    push_resolvable(&mut out, "GEOIP", &view.geoip);

    let source_cidrs: Vec<String> = view
        .source_ip_or_cidr
        .iter()
        .map(|ip| ip_to_cidr(ip, IpVersion::of(ip)))
        .collect();
    push_typed(&mut out, "SRC-IP-CIDR", strs(&source_cidrs), None);
    push_typed(&mut out, "SRC-PORT", strs(&view.source_ports), None);
    push_typed(&mut out, "DST-PORT", strs(&view.dest_ports), None);
    out.extend(view.other_rules.iter().cloned());

    Ok(out)
}

fn push_resolvable(out: &mut Vec<String>, rule_type: &str, lists: &ResolveLists) {
    push_typed(out, rule_type, strs(&lists.resolve), None);
    push_typed(out, rule_type, strs(&lists.no_resolve), Some(NO_RESOLVE));
}

fn strs(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(String::as_str)
}

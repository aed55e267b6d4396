//! Format-agnostic view derived from settled rule buckets.

use ahash::AHashSet;
use regex::Regex;

use super::rules::{ResolveBuckets, Rules};
use crate::rule::{aggregate_cidrs, wildcard_to_regex, DomainEntry, IpVersion};

/// Sorted, deduplicated snapshot of a rule set, shared by every emitter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessed {
    /// Whitelisted and suffix-deduplicated domains
    pub domains: Vec<DomainEntry>,
    pub domain_keywords: Vec<String>,
    pub domain_wildcards: Vec<String>,
    /// Regex sources compiled from `domain_wildcards`, invalid ones dropped
    pub domain_regexes: Vec<String>,
    pub user_agents: Vec<String>,
    pub process_names: Vec<String>,
    pub process_paths: Vec<String>,
    pub url_regexes: Vec<String>,
    pub ip_cidr: ResolveLists,
    pub ip_cidr6: ResolveLists,
    pub ip_asn: ResolveLists,
    pub geoip: ResolveLists,
    pub source_ip_or_cidr: Vec<String>,
    pub source_ports: Vec<String>,
    pub dest_ports: Vec<String>,
    pub other_rules: Vec<String>,
}

/// Sorted resolve / no-resolve lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveLists {
    pub resolve: Vec<String>,
    pub no_resolve: Vec<String>,
}

impl ResolveLists {
    fn sorted(buckets: &ResolveBuckets) -> Self {
        Self {
            resolve: sorted(&buckets.resolve),
            no_resolve: sorted(&buckets.no_resolve),
        }
    }

    fn aggregated(buckets: &ResolveBuckets, version: IpVersion) -> Self {
        Self {
            resolve: aggregate_cidrs(&buckets.resolve, version),
            no_resolve: aggregate_cidrs(&buckets.no_resolve, version),
        }
    }

    pub fn len(&self) -> usize {
        self.resolve.len() + self.no_resolve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Preprocessed {
    /// Build the view from settled buckets.
    pub fn from_rules(rules: &Rules) -> Self {
        let domain_wildcards = sorted(&rules.domain_wildcards);
        let domain_regexes = domain_wildcards
            .iter()
            .filter_map(|pattern| {
                let source = wildcard_to_regex(pattern);
                match Regex::new(&source) {
                    Ok(_) => Some(source),
                    Err(e) => {
                        log::warn!("Dropping invalid wildcard {:?}: {}", pattern, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            domains: rules.domains.dump(),
            domain_keywords: sorted(&rules.domain_keywords),
            domain_wildcards,
            domain_regexes,
            user_agents: sorted(&rules.user_agents),
            process_names: sorted(&rules.process_names),
            process_paths: sorted(&rules.process_paths),
            url_regexes: sorted(&rules.url_regexes),
            ip_cidr: ResolveLists::aggregated(&rules.ip_cidr, IpVersion::V4),
            ip_cidr6: ResolveLists::aggregated(&rules.ip_cidr6, IpVersion::V6),
            ip_asn: ResolveLists::sorted(&rules.ip_asn),
            geoip: ResolveLists::sorted(&rules.geoip),
            source_ip_or_cidr: sorted(&rules.source_ip_or_cidr),
            source_ports: sorted(&rules.source_ports),
            dest_ports: sorted(&rules.dest_ports),
            other_rules: rules.other_rules().to_vec(),
        }
    }

    /// Exact domains in dump order.
    pub fn exact_domains(&self) -> impl Iterator<Item = &str> {
        self.domains
            .iter()
            .filter(|e| !e.include_subdomains)
            .map(|e| e.name.as_str())
    }

    /// Suffix domains in dump order.
    pub fn suffix_domains(&self) -> impl Iterator<Item = &str> {
        self.domains
            .iter()
            .filter(|e| e.include_subdomains)
            .map(|e| e.name.as_str())
    }

    /// Number of rules the view describes.
    pub fn rule_count(&self) -> usize {
        self.domains.len()
            + self.domain_keywords.len()
            + self.domain_wildcards.len()
            + self.user_agents.len()
            + self.process_names.len()
            + self.process_paths.len()
            + self.url_regexes.len()
            + self.ip_cidr.len()
            + self.ip_cidr6.len()
            + self.ip_asn.len()
            + self.geoip.len()
            + self.source_ip_or_cidr.len()
            + self.source_ports.len()
            + self.dest_ports.len()
            + self.other_rules.len()
    }
}

fn sorted(set: &AHashSet<String>) -> Vec<String> {
    let mut out: Vec<String> = set.iter().cloned().collect();
    out.sort();
    out
}

//! Rule buckets accumulated for one rule set.

use ahash::AHashSet;

use crate::rule::{classify, classify_domainset, ip_to_cidr, DomainSet, IpVersion, ParsedRule};

/// A pair of buckets split by the `no-resolve` argument.
#[derive(Debug, Default, Clone)]
pub struct ResolveBuckets {
    pub resolve: AHashSet<String>,
    pub no_resolve: AHashSet<String>,
}

impl ResolveBuckets {
    /// Insert into the variant selected by `no_resolve`.
    pub fn insert(&mut self, value: &str, no_resolve: bool) {
        let bucket = if no_resolve {
            &mut self.no_resolve
        } else {
            &mut self.resolve
        };
        insert_non_empty(bucket, value);
    }

    pub fn len(&self) -> usize {
        self.resolve.len() + self.no_resolve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rules holds every bucket a rule line can be routed into.
///
/// Every bucket has set semantics and never holds an empty string.
/// `other_rules` keeps first-seen order because some clients depend on
/// rule precedence.
#[derive(Debug, Default, Clone)]
pub struct Rules {
    pub domains: DomainSet,
    pub domain_keywords: AHashSet<String>,
    pub domain_wildcards: AHashSet<String>,
    pub user_agents: AHashSet<String>,
    pub process_names: AHashSet<String>,
    pub process_paths: AHashSet<String>,
    pub url_regexes: AHashSet<String>,
    pub ip_cidr: ResolveBuckets,
    pub ip_cidr6: ResolveBuckets,
    pub ip_asn: ResolveBuckets,
    pub geoip: ResolveBuckets,
    pub source_ip_or_cidr: AHashSet<String>,
    pub source_ports: AHashSet<String>,
    pub dest_ports: AHashSet<String>,
    other_rules: Vec<String>,
    other_seen: AHashSet<String>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unrecognised lines in first-seen order.
    pub fn other_rules(&self) -> &[String] {
        &self.other_rules
    }

    /// Classify one `TYPE,VALUE[,ARG]` line and route it to its bucket.
    pub fn add_rule(&mut self, line: &str) {
        match classify(line) {
            ParsedRule::Domain(v) => self.add_domain(v),
            ParsedRule::DomainSuffix(v) => self.add_domain_suffix(v),
            ParsedRule::DomainKeyword(v) => insert_non_empty(&mut self.domain_keywords, v),
            ParsedRule::DomainWildcard(v) => insert_non_empty(&mut self.domain_wildcards, v),
            ParsedRule::UserAgent(v) => insert_non_empty(&mut self.user_agents, v),
            ParsedRule::ProcessName(v) => insert_non_empty(&mut self.process_names, v),
            ParsedRule::ProcessPath(v) => insert_non_empty(&mut self.process_paths, v),
            ParsedRule::UrlRegex(v) => insert_non_empty(&mut self.url_regexes, v),
            ParsedRule::IpCidr { value, no_resolve } => {
                self.ip_cidr
                    .insert(&ip_to_cidr(value, IpVersion::V4), no_resolve);
            }
            ParsedRule::IpCidr6 { value, no_resolve } => {
                self.ip_cidr6
                    .insert(&ip_to_cidr(value, IpVersion::V6), no_resolve);
            }
            ParsedRule::IpAsn { value, no_resolve } => self.ip_asn.insert(value, no_resolve),
            ParsedRule::GeoIp { value, no_resolve } => self.geoip.insert(value, no_resolve),
            ParsedRule::SrcIp(v) => insert_non_empty(&mut self.source_ip_or_cidr, v),
            ParsedRule::SrcPort(v) => insert_non_empty(&mut self.source_ports, v),
            ParsedRule::DestPort(v) => insert_non_empty(&mut self.dest_ports, v),
            ParsedRule::Other(line) => self.add_other_rule(line),
            ParsedRule::Ignored => {}
        }
    }

    /// Route a bare domain-set line.
    pub fn add_domainset_line(&mut self, line: &str) {
        if let Some((domain, suffix)) = classify_domainset(line) {
            self.domains.add(domain, suffix);
        }
    }

    pub fn add_domain(&mut self, domain: &str) {
        self.domains.add(domain, false);
    }

    pub fn bulk_add_domain<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        for domain in domains.into_iter().flatten() {
            self.add_domain(domain.as_ref());
        }
    }

    /// Add a suffix rule; a leading dot is stripped before storing.
    pub fn add_domain_suffix(&mut self, domain: &str) {
        self.domains.add_suffix(domain);
    }

    pub fn bulk_add_domain_suffix<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for domain in domains {
            self.add_domain_suffix(domain.as_ref());
        }
    }

    pub fn add_domain_keyword(&mut self, keyword: &str) {
        insert_non_empty(&mut self.domain_keywords, keyword);
    }

    pub fn add_domain_wildcard(&mut self, pattern: &str) {
        insert_non_empty(&mut self.domain_wildcards, pattern);
    }

    pub fn add_user_agent(&mut self, agent: &str) {
        insert_non_empty(&mut self.user_agents, agent);
    }

    /// Add a process matcher, routed to paths when it contains a separator.
    pub fn add_process(&mut self, process: &str) {
        if process.contains(['/', '\\']) {
            insert_non_empty(&mut self.process_paths, process);
        } else {
            insert_non_empty(&mut self.process_names, process);
        }
    }

    pub fn add_url_regex(&mut self, regex: &str) {
        insert_non_empty(&mut self.url_regexes, regex);
    }

    pub fn add_source_ip(&mut self, ip_or_cidr: &str) {
        insert_non_empty(&mut self.source_ip_or_cidr, ip_or_cidr);
    }

    pub fn add_source_port(&mut self, port: &str) {
        insert_non_empty(&mut self.source_ports, port);
    }

    pub fn add_dest_port(&mut self, port: &str) {
        insert_non_empty(&mut self.dest_ports, port);
    }

    pub fn bulk_add_cidr4<I, S>(&mut self, cidrs: I, no_resolve: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for cidr in cidrs {
            let cidr = cidr.as_ref().trim();
            if !cidr.is_empty() {
                self.ip_cidr
                    .insert(&ip_to_cidr(cidr, IpVersion::V4), no_resolve);
            }
        }
    }

    pub fn bulk_add_cidr6<I, S>(&mut self, cidrs: I, no_resolve: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for cidr in cidrs {
            let cidr = cidr.as_ref().trim();
            if !cidr.is_empty() {
                self.ip_cidr6
                    .insert(&ip_to_cidr(cidr, IpVersion::V6), no_resolve);
            }
        }
    }

    /// Add mixed IPv4/IPv6 CIDRs, split by address family.
    pub fn bulk_add_cidr<I, S>(&mut self, cidrs: I, no_resolve: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for cidr in cidrs {
            let cidr = cidr.as_ref().trim();
            if cidr.is_empty() {
                continue;
            }
            let version = IpVersion::of(cidr);
            let bucket = match version {
                IpVersion::V4 => &mut self.ip_cidr,
                IpVersion::V6 => &mut self.ip_cidr6,
            };
            bucket.insert(&ip_to_cidr(cidr, version), no_resolve);
        }
    }

    pub fn whitelist_domain(&mut self, domain: &str) {
        self.domains.whitelist(domain);
    }

    pub fn add_other_rule(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.other_seen.contains(line) {
            return;
        }
        self.other_seen.insert(line.to_string());
        self.other_rules.push(line.to_string());
    }

    /// Total number of stored values across all buckets.
    pub fn len(&self) -> usize {
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

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert_non_empty(bucket: &mut AHashSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !bucket.contains(value) {
        bucket.insert(value.to_string());
    }
}

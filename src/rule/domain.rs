//! Deduplicating domain set with suffix semantics and whitelisting.

use ahash::{AHashMap, AHashSet};

/// A domain emitted from a [`DomainSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainEntry {
    /// Domain name without a leading dot, lowercase
    pub name: String,
    /// Whether the entry also matches every subdomain
    pub include_subdomains: bool,
}

impl DomainEntry {
    /// Domain-set notation: `.example.com` for suffixes, `example.com` otherwise.
    pub fn to_domainset_line(&self) -> String {
        if self.include_subdomains {
            format!(".{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// DomainSet collects exact and suffix domains.
///
/// # Semantics
/// - A suffix entry `example.com` covers `example.com` and all of its
///   subdomains, so covered exact and suffix entries are dropped on dump.
/// - Adding the same name as exact and suffix keeps the suffix.
/// - Whitelisting is applied on dump and wins over every add, regardless of
///   call order. A whitelist entry with a leading dot removes the domain and
///   all of its subdomains; without one it removes only the entry of that name.
///
/// # Examples
/// ```
/// use rulecast::rule::DomainSet;
///
/// let mut set = DomainSet::new();
/// set.add("www.google.com", false);
/// set.add(".google.com", true);
/// set.whitelist(".ads.google.com");
/// assert_eq!(set.dump().len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DomainSet {
    /// name -> include_subdomains
    entries: AHashMap<String, bool>,
    /// Whitelisted names (exact)
    whitelist_exact: AHashSet<String>,
    /// Whitelisted names including subdomains
    whitelist_suffix: AHashSet<String>,
}

impl DomainSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a domain.
    ///
    /// A leading dot is stripped before storing. Empty names are ignored.
    pub fn add(&mut self, domain: &str, include_subdomains: bool) {
        let name = normalize(domain);
        if name.is_empty() {
            return;
        }
        let slot = self.entries.entry(name).or_insert(include_subdomains);
        *slot |= include_subdomains;
    }

    /// Add a suffix rule, covering the domain and all its subdomains.
    pub fn add_suffix(&mut self, domain: &str) {
        self.add(domain, true);
    }

    /// Exclude a domain from the dump.
    pub fn whitelist(&mut self, domain: &str) {
        let trimmed = domain.trim();
        let name = normalize(trimmed);
        if name.is_empty() {
            return;
        }
        if trimmed.starts_with('.') {
            self.whitelist_suffix.insert(name);
        } else {
            self.whitelist_exact.insert(name);
        }
    }

    /// Number of stored entries, before dedup and whitelisting.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the deduplicated, whitelisted entries.
    ///
    /// Entries are sorted by reversed labels so a domain is grouped with its
    /// siblings under the same parent.
    pub fn dump(&self) -> Vec<DomainEntry> {
        let mut out: Vec<DomainEntry> = self
            .entries
            .iter()
            .filter(|(name, _)| !self.covered_by_ancestor(name))
            .filter(|(name, _)| !self.is_whitelisted(name))
            .map(|(name, include_subdomains)| DomainEntry {
                name: name.clone(),
                include_subdomains: *include_subdomains,
            })
            .collect();

        out.sort_by(|a, b| reversed_labels(&a.name).cmp(&reversed_labels(&b.name)));
        out
    }

    /// Whether a strict parent domain is stored as a suffix rule.
    fn covered_by_ancestor(&self, name: &str) -> bool {
        parents(name).any(|parent| self.entries.get(parent).copied().unwrap_or(false))
    }

    fn is_whitelisted(&self, name: &str) -> bool {
        if self.whitelist_exact.contains(name) || self.whitelist_suffix.contains(name) {
            return true;
        }
        parents(name).any(|parent| self.whitelist_suffix.contains(parent))
    }
}

fn normalize(domain: &str) -> String {
    let domain = domain.trim();
    domain.strip_prefix('.').unwrap_or(domain).to_lowercase()
}

/// Iterate strict parent domains: `a.b.c` yields `b.c`, then `c`.
fn parents(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices('.').map(move |(pos, _)| &name[pos + 1..])
}

fn reversed_labels(name: &str) -> Vec<&str> {
    name.rsplit('.').collect()
}

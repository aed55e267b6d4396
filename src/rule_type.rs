//! Rule type definitions.

use std::fmt;

/// RuleType is the leading token of a `TYPE,VALUE[,ARG]` rule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    /// Exact domain match
    Domain,
    /// Domain and all of its subdomains
    DomainSuffix,
    /// Substring match on the domain
    DomainKeyword,
    /// Glob-style domain pattern
    DomainWildcard,
    UserAgent,
    /// Process name, or full path when the value contains a separator
    ProcessName,
    UrlRegex,
    IpCidr,
    IpCidr6,
    IpAsn,
    GeoIp,
    SrcIp,
    SrcPort,
    DestPort,
}

impl RuleType {
    /// Every supported rule type.
    pub const ALL: [RuleType; 14] = [
        RuleType::Domain,
        RuleType::DomainSuffix,
        RuleType::DomainKeyword,
        RuleType::DomainWildcard,
        RuleType::UserAgent,
        RuleType::ProcessName,
        RuleType::UrlRegex,
        RuleType::IpCidr,
        RuleType::IpCidr6,
        RuleType::IpAsn,
        RuleType::GeoIp,
        RuleType::SrcIp,
        RuleType::SrcPort,
        RuleType::DestPort,
    ];

    /// Parse a rule type token.
    ///
    /// Tokens are case-sensitive: `domain,example.com` is not a DOMAIN rule.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DOMAIN" => Some(RuleType::Domain),
            "DOMAIN-SUFFIX" => Some(RuleType::DomainSuffix),
            "DOMAIN-KEYWORD" => Some(RuleType::DomainKeyword),
            "DOMAIN-WILDCARD" => Some(RuleType::DomainWildcard),
            "USER-AGENT" => Some(RuleType::UserAgent),
            "PROCESS-NAME" => Some(RuleType::ProcessName),
            "URL-REGEX" => Some(RuleType::UrlRegex),
            "IP-CIDR" => Some(RuleType::IpCidr),
            "IP-CIDR6" => Some(RuleType::IpCidr6),
            "IP-ASN" => Some(RuleType::IpAsn),
            "GEOIP" => Some(RuleType::GeoIp),
            "SRC-IP" => Some(RuleType::SrcIp),
            "SRC-PORT" => Some(RuleType::SrcPort),
            "DEST-PORT" => Some(RuleType::DestPort),
            _ => None,
        }
    }

    /// Get the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Domain => "DOMAIN",
            RuleType::DomainSuffix => "DOMAIN-SUFFIX",
            RuleType::DomainKeyword => "DOMAIN-KEYWORD",
            RuleType::DomainWildcard => "DOMAIN-WILDCARD",
            RuleType::UserAgent => "USER-AGENT",
            RuleType::ProcessName => "PROCESS-NAME",
            RuleType::UrlRegex => "URL-REGEX",
            RuleType::IpCidr => "IP-CIDR",
            RuleType::IpCidr6 => "IP-CIDR6",
            RuleType::IpAsn => "IP-ASN",
            RuleType::GeoIp => "GEOIP",
            RuleType::SrcIp => "SRC-IP",
            RuleType::SrcPort => "SRC-PORT",
            RuleType::DestPort => "DEST-PORT",
        }
    }

    /// Whether the rule accepts a trailing `no-resolve` argument.
    pub fn is_resolvable(&self) -> bool {
        matches!(
            self,
            RuleType::IpCidr | RuleType::IpCidr6 | RuleType::IpAsn | RuleType::GeoIp
        )
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_from_str() {
        assert_eq!(RuleType::parse("DOMAIN"), Some(RuleType::Domain));
        assert_eq!(RuleType::parse("DOMAIN-SUFFIX"), Some(RuleType::DomainSuffix));
        assert_eq!(RuleType::parse("IP-CIDR6"), Some(RuleType::IpCidr6));
        assert_eq!(RuleType::parse("GEOIP"), Some(RuleType::GeoIp));
        assert_eq!(RuleType::parse("DEST-PORT"), Some(RuleType::DestPort));
        assert_eq!(RuleType::parse("domain"), None);
        assert_eq!(RuleType::parse("AND"), None);
    }

    #[test]
    fn test_rule_type_roundtrip() {
        for rule_type in RuleType::ALL {
            assert_eq!(RuleType::parse(rule_type.as_str()), Some(rule_type));
        }
    }

    #[test]
    fn test_resolvable_types() {
        assert!(RuleType::IpCidr.is_resolvable());
        assert!(RuleType::GeoIp.is_resolvable());
        assert!(!RuleType::Domain.is_resolvable());
        assert!(!RuleType::SrcIp.is_resolvable());
    }
}

//! Rule line classification and bucket normalization helpers.

mod cidr;
mod domain;
mod wildcard;

pub use cidr::{aggregate_cidrs, ip_to_cidr, IpVersion};
pub use domain::{DomainEntry, DomainSet};
pub use wildcard::wildcard_to_regex;

use crate::RuleType;

/// Trailing argument selecting the no-resolve variant of IP rules.
pub const NO_RESOLVE: &str = "no-resolve";

/// A rule line classified into its destination bucket.
///
/// Values borrow from the input line and are already trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRule<'a> {
    Domain(&'a str),
    DomainSuffix(&'a str),
    DomainKeyword(&'a str),
    DomainWildcard(&'a str),
    UserAgent(&'a str),
    ProcessName(&'a str),
    ProcessPath(&'a str),
    UrlRegex(&'a str),
    IpCidr { value: &'a str, no_resolve: bool },
    IpCidr6 { value: &'a str, no_resolve: bool },
    IpAsn { value: &'a str, no_resolve: bool },
    GeoIp { value: &'a str, no_resolve: bool },
    SrcIp(&'a str),
    SrcPort(&'a str),
    DestPort(&'a str),
    /// Unrecognised line, kept verbatim
    Other(&'a str),
    /// Blank line, or a known type with an empty value
    Ignored,
}

/// Classify a `TYPE,VALUE[,ARG]` rule line.
///
/// A non-empty line without a known type (including one without any comma)
/// classifies as [`ParsedRule::Other`] so unknown rule kinds pass through.
pub fn classify(line: &str) -> ParsedRule<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ParsedRule::Ignored;
    }

    let mut parts = line.splitn(3, ',');
    let type_token = parts.next().unwrap_or_default().trim();
    let Some(rest) = line.split_once(',').map(|(_, rest)| rest) else {
        return ParsedRule::Other(line);
    };
    let Some(rule_type) = RuleType::parse(type_token) else {
        return ParsedRule::Other(line);
    };

    // Regex values may themselves contain commas
    if rule_type == RuleType::UrlRegex {
        let value = rest.trim();
        return if value.is_empty() {
            ParsedRule::Ignored
        } else {
            ParsedRule::UrlRegex(value)
        };
    }

    let value = parts.next().unwrap_or_default().trim();
    let arg = parts.next().map(str::trim);
    if value.is_empty() {
        return ParsedRule::Ignored;
    }
    let no_resolve = arg == Some(NO_RESOLVE);

    match rule_type {
        RuleType::Domain => ParsedRule::Domain(value),
        RuleType::DomainSuffix => ParsedRule::DomainSuffix(value),
        RuleType::DomainKeyword => ParsedRule::DomainKeyword(value),
        RuleType::DomainWildcard => ParsedRule::DomainWildcard(value),
        RuleType::UserAgent => ParsedRule::UserAgent(value),
        RuleType::ProcessName => {
            if value.contains(['/', '\\']) {
                ParsedRule::ProcessPath(value)
            } else {
                ParsedRule::ProcessName(value)
            }
        }
        RuleType::UrlRegex => ParsedRule::UrlRegex(value),
        RuleType::IpCidr => ParsedRule::IpCidr { value, no_resolve },
        RuleType::IpCidr6 => ParsedRule::IpCidr6 { value, no_resolve },
        RuleType::IpAsn => ParsedRule::IpAsn { value, no_resolve },
        RuleType::GeoIp => ParsedRule::GeoIp { value, no_resolve },
        RuleType::SrcIp => ParsedRule::SrcIp(value),
        RuleType::SrcPort => ParsedRule::SrcPort(value),
        RuleType::DestPort => ParsedRule::DestPort(value),
    }
}

/// Classify a bare domain-set line.
///
/// `.example.com` and `+.example.com` are suffix rules, anything else is an
/// exact domain. Returns `None` for blank lines.
pub fn classify_domainset(line: &str) -> Option<(&str, bool)> {
    let line = line.trim();
    let (domain, suffix) = if let Some(rest) = line.strip_prefix("+.") {
        (rest, true)
    } else if let Some(rest) = line.strip_prefix('.') {
        (rest, true)
    } else {
        (line, false)
    };
    if domain.is_empty() {
        None
    } else {
        Some((domain, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_domain_rules() {
        assert_eq!(classify("DOMAIN,example.com"), ParsedRule::Domain("example.com"));
        assert_eq!(
            classify("DOMAIN-SUFFIX, google.com "),
            ParsedRule::DomainSuffix("google.com")
        );
        assert_eq!(classify("DOMAIN-KEYWORD,ads"), ParsedRule::DomainKeyword("ads"));
        assert_eq!(
            classify("DOMAIN-WILDCARD,*.cdn?.example.com"),
            ParsedRule::DomainWildcard("*.cdn?.example.com")
        );
    }

    #[test]
    fn test_classify_ip_rules() {
        assert_eq!(
            classify("IP-CIDR,10.0.0.0/8,no-resolve"),
            ParsedRule::IpCidr {
                value: "10.0.0.0/8",
                no_resolve: true
            }
        );
        assert_eq!(
            classify("IP-CIDR6,fc00::/7"),
            ParsedRule::IpCidr6 {
                value: "fc00::/7",
                no_resolve: false
            }
        );
        assert_eq!(
            classify("IP-ASN,13335,no-resolve"),
            ParsedRule::IpAsn {
                value: "13335",
                no_resolve: true
            }
        );
        assert_eq!(
            classify("GEOIP,CN,something-else"),
            ParsedRule::GeoIp {
                value: "CN",
                no_resolve: false
            }
        );
    }

    #[test]
    fn test_classify_process_name() {
        assert_eq!(classify("PROCESS-NAME,curl"), ParsedRule::ProcessName("curl"));
        assert_eq!(
            classify("PROCESS-NAME,/usr/bin/curl"),
            ParsedRule::ProcessPath("/usr/bin/curl")
        );
        assert_eq!(
            classify(r"PROCESS-NAME,C:\Tools\curl.exe"),
            ParsedRule::ProcessPath(r"C:\Tools\curl.exe")
        );
    }

    #[test]
    fn test_url_regex_keeps_commas() {
        assert_eq!(
            classify(r"URL-REGEX,^https?://a\.com/x{1,3}/"),
            ParsedRule::UrlRegex(r"^https?://a\.com/x{1,3}/")
        );
    }

    #[test]
    fn test_classify_source_and_ports() {
        assert_eq!(classify("SRC-IP,192.168.1.2"), ParsedRule::SrcIp("192.168.1.2"));
        assert_eq!(classify("SRC-PORT,7890"), ParsedRule::SrcPort("7890"));
        assert_eq!(classify("DEST-PORT,443"), ParsedRule::DestPort("443"));
        assert_eq!(classify("USER-AGENT,Instagram*"), ParsedRule::UserAgent("Instagram*"));
    }

    #[test]
    fn test_unknown_lines_pass_through() {
        assert_eq!(
            classify("AND,((DOMAIN,a.com),(DEST-PORT,443))"),
            ParsedRule::Other("AND,((DOMAIN,a.com),(DEST-PORT,443))")
        );
        assert_eq!(classify("DOMAIN"), ParsedRule::Other("DOMAIN"));
        assert_eq!(classify("domain,example.com"), ParsedRule::Other("domain,example.com"));
    }

    #[test]
    fn test_blank_and_empty_values_ignored() {
        assert_eq!(classify(""), ParsedRule::Ignored);
        assert_eq!(classify("   "), ParsedRule::Ignored);
        assert_eq!(classify("DOMAIN,"), ParsedRule::Ignored);
        assert_eq!(classify("URL-REGEX, "), ParsedRule::Ignored);
    }

    #[test]
    fn test_classify_domainset() {
        assert_eq!(classify_domainset("example.com"), Some(("example.com", false)));
        assert_eq!(classify_domainset(".example.com"), Some(("example.com", true)));
        assert_eq!(classify_domainset("+.example.com"), Some(("example.com", true)));
        assert_eq!(classify_domainset(" "), None);
        assert_eq!(classify_domainset("."), None);
    }
}

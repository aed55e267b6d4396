//! Surge module patch (`.sgmodule`) enabling MITM for URL-REGEX hosts.
//!
//! URL-REGEX rules only see HTTPS URLs when Surge decrypts the host, so the
//! module appends every host the regexes target to the MITM hostname list.

use chrono::SecondsFormat;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ruleset::{Metadata, Preprocessed};
use crate::Result;

/// A MITM hostname: optional `*.` prefix, then at least two labels.
static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*\.)?[a-z0-9-]+(\.[a-z0-9-]+)+$").expect("hostname pattern is valid")
});

const SCHEMES: [&str; 3] = ["https?://", "https://", "http://"];

pub(super) fn render(view: &Preprocessed, meta: &Metadata) -> Result<Option<Vec<String>>> {
    let title = meta.require_title()?;

    let mut hosts: Vec<String> = view
        .url_regexes
        .iter()
        .filter_map(|pattern| mitm_host(pattern))
        .collect();
    hosts.sort();
    hosts.dedup();

    if hosts.is_empty() {
        return Ok(None);
    }

    Ok(Some(vec![
        format!("#!name=[rulecast] {}", title),
        format!(
            "#!desc=Last Updated: {}",
            meta.date.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        String::new(),
        "[MITM]".to_string(),
        format!("hostname = %APPEND% {}", hosts.join(", ")),
    ]))
}

/// Extract the hostname a URL regex is anchored to.
///
/// Returns `None` when the host part is itself a pattern that cannot be
/// expressed as a MITM hostname.
fn mitm_host(pattern: &str) -> Option<String> {
    let unescaped = pattern
        .strip_prefix('^')
        .unwrap_or(pattern)
        .replace(r"\/", "/")
        .replace(r"\.", ".")
        .replace(r"\-", "-");

    let rest = SCHEMES
        .iter()
        .find_map(|scheme| unescaped.strip_prefix(scheme))?;

    let end = rest
        .find(|c: char| matches!(c, '/' | ':' | '(' | ')' | '[' | ']' | '|' | '$'))
        .unwrap_or(rest.len());
    let host = &rest[..end];

    let host = match host
        .strip_prefix(".*.")
        .or_else(|| host.strip_prefix(".+."))
    {
        Some(parent) => format!("*.{}", parent),
        None => host.to_string(),
    }
    .to_lowercase();

    HOSTNAME.is_match(&host).then_some(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::meta;
    use crate::ruleset::{Rules, RuleSetKind};

    #[test]
    fn test_mitm_host() {
        assert_eq!(
            mitm_host(r"^https?:\/\/api\.example\.com\/ads"),
            Some("api.example.com".to_string())
        );
        assert_eq!(
            mitm_host(r"^https://.*\.example\.com/track"),
            Some("*.example.com".to_string())
        );
        assert_eq!(
            mitm_host(r"^http://ads.example.com:8080/"),
            Some("ads.example.com".to_string())
        );
        assert_eq!(mitm_host(r"^https?://(www\.)?example\.com/"), None);
        assert_eq!(mitm_host(r"^https?://[^/]+\.example\.com/"), None);
        assert_eq!(mitm_host(r"/ads/banner\.js$"), None);
    }

    #[test]
    fn test_render_module() {
        let mut rules = Rules::new();
        rules.add_url_regex(r"^https?:\/\/api\.example\.com\/ads");
        rules.add_url_regex(r"^https?:\/\/api\.example\.com\/track");
        rules.add_url_regex(r"^https?://cdn\.example\.org/");
        let view = Preprocessed::from_rules(&rules);

        let lines = render(&view, &meta(RuleSetKind::Mixed)).unwrap().unwrap();
        assert_eq!(lines[0], "#!name=[rulecast] Sample");
        assert_eq!(lines[3], "[MITM]");
        assert_eq!(
            lines[4],
            "hostname = %APPEND% api.example.com, cdn.example.org"
        );
    }

    #[test]
    fn test_no_module_without_hosts() {
        let mut rules = Rules::new();
        rules.add_domain("example.com");
        let view = Preprocessed::from_rules(&rules);

        assert!(render(&view, &meta(RuleSetKind::Mixed)).unwrap().is_none());
    }
}

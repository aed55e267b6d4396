//! sing-box source rule-set (`.json`, version 2).

use serde::Serialize;

use crate::ruleset::Preprocessed;
use crate::Result;

const RULE_SET_VERSION: u8 = 2;

#[derive(Debug, Serialize)]
struct SourceRuleSet {
    version: u8,
    rules: Vec<HeadlessRule>,
}

#[derive(Debug, Default, Serialize)]
struct HeadlessRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    domain: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    domain_suffix: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    domain_keyword: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    domain_regex: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ip_cidr: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    source_ip_cidr: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    source_port: Vec<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    source_port_range: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    port: Vec<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    port_range: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    process_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    process_path: Vec<String>,
}

impl HeadlessRule {
    fn is_empty(&self) -> bool {
        self.domain.is_empty()
            && self.domain_suffix.is_empty()
            && self.domain_keyword.is_empty()
            && self.domain_regex.is_empty()
            && self.ip_cidr.is_empty()
            && self.source_ip_cidr.is_empty()
            && self.source_port.is_empty()
            && self.source_port_range.is_empty()
            && self.port.is_empty()
            && self.port_range.is_empty()
            && self.process_name.is_empty()
            && self.process_path.is_empty()
    }
}

/// JSON carries no comments, so this format has no banner.
pub(super) fn render(view: &Preprocessed) -> Result<Vec<String>> {
    let (source_port, source_port_range) = split_ports(&view.source_ports);
    let (port, port_range) = split_ports(&view.dest_ports);

    // sing-box has no separate resolve step for rule-sets
    let ip_cidr = [&view.ip_cidr, &view.ip_cidr6]
        .into_iter()
        .flat_map(|lists| lists.resolve.iter().chain(lists.no_resolve.iter()))
        .cloned()
        .collect();

    let rule = HeadlessRule {
        domain: view.exact_domains().map(str::to_string).collect(),
        domain_suffix: view.suffix_domains().map(str::to_string).collect(),
        domain_keyword: view.domain_keywords.clone(),
        domain_regex: view.domain_regexes.clone(),
        ip_cidr,
        source_ip_cidr: view.source_ip_or_cidr.clone(),
        source_port,
        source_port_range,
        port,
        port_range,
        process_name: view.process_names.clone(),
        process_path: view.process_paths.clone(),
    };

    let rules = if rule.is_empty() { vec![] } else { vec![rule] };
    let doc = SourceRuleSet {
        version: RULE_SET_VERSION,
        rules,
    };

    let json = serde_json::to_string_pretty(&doc)?;
    Ok(json.lines().map(str::to_string).collect())
}

/// Split port values into single ports and `start:end` ranges.
///
/// Accepts `443`, `8000-9000` and `8000:9000`; anything else is dropped.
fn split_ports(values: &[String]) -> (Vec<u16>, Vec<String>) {
    let mut ports = Vec::new();
    let mut ranges = Vec::new();

    for value in values {
        if let Ok(port) = value.parse::<u16>() {
            ports.push(port);
            continue;
        }
        let bounds = value.split_once('-').or_else(|| value.split_once(':'));
        if let Some((start, end)) = bounds {
            if let (Ok(start), Ok(end)) = (start.trim().parse::<u16>(), end.trim().parse::<u16>()) {
                ranges.push(format!("{}:{}", start, end));
                continue;
            }
        }
        log::debug!("Skipping port {:?} for sing-box", value);
    }

    ports.sort_unstable();
    (ports, ranges)
}

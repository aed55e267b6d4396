//! Build every rule set described by a manifest.

use crate::manifest::{Manifest, RuleSetSpec, SourceFormat};
use crate::publish::WriteOutcome;
use crate::ruleset::{Published, RuleSet};
use crate::Result;

/// Summary of a build pass.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub published: Vec<Published>,
}

impl BuildReport {
    /// Files that were created or replaced.
    pub fn written(&self) -> usize {
        self.count(WriteOutcome::Written)
    }

    /// Files left untouched because their content was equivalent.
    pub fn unchanged(&self) -> usize {
        self.count(WriteOutcome::Unchanged)
    }

    fn count(&self, outcome: WriteOutcome) -> usize {
        self.published
            .iter()
            .filter(|p| p.outcome == outcome)
            .count()
    }
}

/// Queue everything a manifest entry describes onto a fresh rule set.
///
/// Sources are queued in manifest order, then inline domains, inline rules
/// and the whitelist.
pub fn prepare(spec: &RuleSetSpec) -> RuleSet {
    let mut ruleset = RuleSet::new(spec.id.clone(), spec.kind).with_title(spec.title.clone());
    if let Some(description) = &spec.description {
        ruleset = ruleset.with_description(description.iter().cloned());
    }

    for source in &spec.sources {
        match source.format {
            SourceFormat::Domainset => ruleset.add_from_domainset_file(&source.path),
            SourceFormat::Ruleset => ruleset.add_from_ruleset_file(&source.path),
        };
    }
    for line in &spec.domains {
        ruleset.add_domainset_line(line);
    }
    for line in &spec.rules {
        ruleset.add_rule(line);
    }
    for domain in &spec.whitelist {
        ruleset.whitelist_domain(domain);
    }

    ruleset
}

/// Build the rule sets of `manifest`, optionally restricted to `only` ids.
///
/// Rule sets are built one after another; the first failure aborts the run.
pub fn build(manifest: &Manifest, only: &[String]) -> Result<BuildReport> {
    let mut report = BuildReport::default();

    for spec in &manifest.rulesets {
        if !only.is_empty() && !only.contains(&spec.id) {
            continue;
        }

        let mut ruleset = prepare(spec);
        ruleset.settle()?;
        log::info!(
            "[{}] {} rules after dedup",
            spec.id,
            ruleset.preprocessed()?.rule_count()
        );

        let published = ruleset.write(&manifest.output, spec.formats())?;
        report.published.extend(published);
    }

    Ok(report)
}

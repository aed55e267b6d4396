//! RuleSet aggregation and publishing.

mod config;
mod preprocess;
mod rules;
mod sequencer;

pub use config::{Metadata, RuleSetKind};
pub use preprocess::{Preprocessed, ResolveLists};
pub use rules::{ResolveBuckets, Rules};

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use std::mem;
use std::path::{Path, PathBuf};

use crate::emit::{Format, Formats};
use crate::manifest::OutputLayout;
use crate::publish::{publish, WriteOutcome};
use crate::source;
use crate::{Error, Result};
use sequencer::{Job, Sequencer};

/// Where the rule buckets currently live.
enum Stage {
    /// Owned here, readable
    Ready(Box<Rules>),
    /// Owned by the ingestion worker
    Ingesting(Sequencer),
    /// Ingestion failed; the buckets are gone
    Failed,
}

/// A file produced (or confirmed unchanged) by [`RuleSet::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub format: Format,
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// RuleSet accumulates the rules for one output group and publishes them.
///
/// # Lifecycle
/// 1. Set metadata with the `with_*` builders.
/// 2. Add rules. Source-backed adds (`add_from_*`) are queued on a worker
///    thread and run strictly in call order; direct adds issued while that
///    queue is live are queued behind them.
/// 3. [`RuleSet::settle`] waits for the queue. Reading state before that
///    fails with [`Error::IngestionPending`].
/// 4. [`RuleSet::write`] renders every selected format and publishes them
///    in parallel, leaving unchanged files untouched.
///
/// # Examples
/// ```
/// use rulecast::{RuleSet, RuleSetKind};
///
/// let mut ruleset = RuleSet::new("reject", RuleSetKind::Domain)
///     .with_title("Ad blocking")
///     .with_description(["Collected from public filter lists"]);
/// ruleset.add_from_domainset(vec![".doubleclick.net", "ads.example.com"]);
/// ruleset.settle().unwrap();
/// assert_eq!(ruleset.preprocessed().unwrap().domains.len(), 2);
/// ```
pub struct RuleSet {
    meta: Metadata,
    stage: Stage,
    preprocessed: OnceCell<Preprocessed>,
}

impl RuleSet {
    /// Create an empty rule set dated now.
    pub fn new(id: impl Into<String>, kind: RuleSetKind) -> Self {
        Self {
            meta: Metadata::new(id, kind),
            stage: Stage::Ready(Box::default()),
            preprocessed: OnceCell::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn with_description<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.description = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.meta.date = date;
        self
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Whether queued ingestion has not been settled yet.
    pub fn is_pending(&self) -> bool {
        matches!(self.stage, Stage::Ingesting(_))
    }

    pub fn add_rule(&mut self, line: &str) -> &mut Self {
        let line = line.to_string();
        self.apply(move |rules| rules.add_rule(&line))
    }

    pub fn add_domainset_line(&mut self, line: &str) -> &mut Self {
        let line = line.to_string();
        self.apply(move |rules| rules.add_domainset_line(&line))
    }

    pub fn add_domain(&mut self, domain: &str) -> &mut Self {
        let domain = domain.to_string();
        self.apply(move |rules| rules.add_domain(&domain))
    }

    /// Add exact domains, skipping `None` entries.
    pub fn bulk_add_domain<I, S>(&mut self, domains: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let domains: Vec<Option<String>> =
            domains.into_iter().map(|d| d.map(Into::into)).collect();
        self.apply(move |rules| rules.bulk_add_domain(domains))
    }

    /// Add a suffix rule; a leading dot is stripped before storing.
    pub fn add_domain_suffix(&mut self, domain: &str) -> &mut Self {
        let domain = domain.to_string();
        self.apply(move |rules| rules.add_domain_suffix(&domain))
    }

    pub fn bulk_add_domain_suffix<I, S>(&mut self, domains: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domains = owned(domains);
        self.apply(move |rules| rules.bulk_add_domain_suffix(domains))
    }

    pub fn add_domain_keyword(&mut self, keyword: &str) -> &mut Self {
        let keyword = keyword.to_string();
        self.apply(move |rules| rules.add_domain_keyword(&keyword))
    }

    pub fn add_domain_wildcard(&mut self, pattern: &str) -> &mut Self {
        let pattern = pattern.to_string();
        self.apply(move |rules| rules.add_domain_wildcard(&pattern))
    }

    pub fn add_user_agent(&mut self, agent: &str) -> &mut Self {
        let agent = agent.to_string();
        self.apply(move |rules| rules.add_user_agent(&agent))
    }

    pub fn add_process(&mut self, process: &str) -> &mut Self {
        let process = process.to_string();
        self.apply(move |rules| rules.add_process(&process))
    }

    pub fn add_url_regex(&mut self, regex: &str) -> &mut Self {
        let regex = regex.to_string();
        self.apply(move |rules| rules.add_url_regex(&regex))
    }

    pub fn add_source_ip(&mut self, ip_or_cidr: &str) -> &mut Self {
        let ip = ip_or_cidr.to_string();
        self.apply(move |rules| rules.add_source_ip(&ip))
    }

    pub fn add_source_port(&mut self, port: &str) -> &mut Self {
        let port = port.to_string();
        self.apply(move |rules| rules.add_source_port(&port))
    }

    pub fn add_dest_port(&mut self, port: &str) -> &mut Self {
        let port = port.to_string();
        self.apply(move |rules| rules.add_dest_port(&port))
    }

    pub fn bulk_add_cidr4<I, S>(&mut self, cidrs: I, no_resolve: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cidrs = owned(cidrs);
        self.apply(move |rules| rules.bulk_add_cidr4(cidrs, no_resolve))
    }

    pub fn bulk_add_cidr6<I, S>(&mut self, cidrs: I, no_resolve: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cidrs = owned(cidrs);
        self.apply(move |rules| rules.bulk_add_cidr6(cidrs, no_resolve))
    }

    /// Add IPv4 and IPv6 CIDRs, split by address family.
    pub fn bulk_add_cidr<I, S>(&mut self, cidrs: I, no_resolve: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cidrs = owned(cidrs);
        self.apply(move |rules| rules.bulk_add_cidr(cidrs, no_resolve))
    }

    /// Exclude a domain (`.example.com` for the whole subtree) from every output.
    pub fn whitelist_domain(&mut self, domain: &str) -> &mut Self {
        let domain = domain.to_string();
        self.apply(move |rules| rules.whitelist_domain(&domain))
    }

    /// Queue domain-set lines from a (possibly blocking) source.
    ///
    /// The iterator is consumed on the ingestion worker.
    pub fn add_from_domainset<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S> + Send + 'static,
        S: AsRef<str>,
    {
        self.enqueue(Box::new(move |rules: &mut Rules| -> Result<()> {
            for line in lines {
                if let Some(line) = source::process_line(line.as_ref()) {
                    rules.add_domainset_line(line);
                }
            }
            Ok(())
        }))
    }

    /// Queue `TYPE,VALUE[,ARG]` lines from a (possibly blocking) source.
    pub fn add_from_ruleset<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S> + Send + 'static,
        S: AsRef<str>,
    {
        self.enqueue(Box::new(move |rules: &mut Rules| -> Result<()> {
            for line in lines {
                if let Some(line) = source::process_line(line.as_ref()) {
                    rules.add_rule(line);
                }
            }
            Ok(())
        }))
    }

    /// Queue a domain-set file; it is opened and read on the worker.
    pub fn add_from_domainset_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref().to_path_buf();
        let id = self.meta.id.clone();
        self.enqueue(Box::new(move |rules: &mut Rules| -> Result<()> {
            let count = source::for_each_line(&path, |line| rules.add_domainset_line(line))?;
            log::debug!("[{}] read {} domains from {:?}", id, count, path);
            Ok(())
        }))
    }

    /// Queue a rule-line file; it is opened and read on the worker.
    pub fn add_from_ruleset_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref().to_path_buf();
        let id = self.meta.id.clone();
        self.enqueue(Box::new(move |rules: &mut Rules| -> Result<()> {
            let count = source::for_each_line(&path, |line| rules.add_rule(line))?;
            log::debug!("[{}] read {} rules from {:?}", id, count, path);
            Ok(())
        }))
    }

    /// Wait for all queued ingestion and take the buckets back.
    ///
    /// Returns the first error raised by a queued job; after that the rule
    /// set is unusable.
    pub fn settle(&mut self) -> Result<&mut Self> {
        match mem::replace(&mut self.stage, Stage::Failed) {
            Stage::Ready(rules) => {
                self.stage = Stage::Ready(rules);
            }
            Stage::Ingesting(seq) => {
                let Some((rules, outcome)) = seq.join() else {
                    return Err(self.aborted());
                };
                outcome?;
                self.stage = Stage::Ready(Box::new(rules));
            }
            Stage::Failed => return Err(self.aborted()),
        }
        Ok(self)
    }

    /// The accumulated buckets.
    pub fn rules(&self) -> Result<&Rules> {
        match &self.stage {
            Stage::Ready(rules) => Ok(rules.as_ref()),
            Stage::Ingesting(_) => Err(Error::IngestionPending {
                id: self.meta.id.clone(),
            }),
            Stage::Failed => Err(self.aborted()),
        }
    }

    /// The derived view, computed on first use and cached.
    pub fn preprocessed(&self) -> Result<&Preprocessed> {
        let rules = self.rules()?;
        Ok(self
            .preprocessed
            .get_or_init(|| Preprocessed::from_rules(rules)))
    }

    /// Render and publish every selected format.
    ///
    /// Title and description must be set. Formats are written in parallel;
    /// the first failure is returned once all of them finished.
    pub fn write(&mut self, layout: &OutputLayout, formats: Formats) -> Result<Vec<Published>> {
        self.meta.validate()?;
        self.settle()?;

        let view = self.preprocessed()?;
        let meta = &self.meta;
        let selected: Vec<Format> = formats.formats().collect();

        let published = selected
            .into_par_iter()
            .map(|format| -> Result<Option<Published>> {
                let Some(lines) = format.render(view, meta)? else {
                    log::debug!("[{}] nothing to emit for {}", meta.id, format);
                    return Ok(None);
                };
                let path = layout.path_for(format, meta.kind, &meta.id);
                let outcome = publish(&path, &lines)?;
                Ok(Some(Published {
                    format,
                    path,
                    outcome,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(published.into_iter().flatten().collect())
    }

    fn apply<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Rules) + Send + 'static,
    {
        self.preprocessed.take();
        match &mut self.stage {
            Stage::Ready(rules) => f(rules.as_mut()),
            Stage::Ingesting(seq) => {
                // A dead worker is reported by settle()
                seq.push(Box::new(move |rules: &mut Rules| -> Result<()> {
                    f(rules);
                    Ok(())
                }));
            }
            Stage::Failed => log::warn!("[{}] dropping add on failed rule set", self.meta.id),
        }
        self
    }

    fn enqueue(&mut self, job: Job) -> &mut Self {
        self.preprocessed.take();
        self.stage = match mem::replace(&mut self.stage, Stage::Failed) {
            Stage::Ready(rules) => match Sequencer::spawn(&self.meta.id, *rules) {
                Ok(seq) => Stage::Ingesting(seq),
                Err(e) => {
                    log::error!("[{}] failed to start ingestion: {}", self.meta.id, e);
                    Stage::Failed
                }
            },
            other => other,
        };

        match &self.stage {
            Stage::Ingesting(seq) => {
                seq.push(job);
            }
            _ => log::warn!("[{}] dropping ingestion on failed rule set", self.meta.id),
        }
        self
    }

    fn aborted(&self) -> Error {
        Error::IngestionAborted {
            id: self.meta.id.clone(),
        }
    }
}

fn owned<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn titled(id: &str, kind: RuleSetKind) -> RuleSet {
        RuleSet::new(id, kind)
            .with_title("Test")
            .with_description(["Line one"])
    }

    /// An iterator that sleeps before yielding each line.
    fn slow(lines: Vec<&'static str>, delay: Duration) -> impl Iterator<Item = &'static str> {
        lines.into_iter().inspect(move |_| thread::sleep(delay))
    }

    #[test]
    fn test_direct_adds() {
        let mut ruleset = titled("direct", RuleSetKind::Mixed);
        ruleset.add_domain("example.com").add_domain("example.com");
        ruleset.add_rule("DOMAIN-KEYWORD,ads");

        let rules = ruleset.rules().unwrap();
        assert_eq!(rules.domains.len(), 1);
        assert!(rules.domain_keywords.contains("ads"));
    }

    #[test]
    fn test_read_before_settle_fails() {
        let mut ruleset = titled("pending", RuleSetKind::Mixed);
        ruleset.add_from_ruleset(slow(vec!["DOMAIN,a.com"], Duration::from_millis(20)));

        assert!(ruleset.is_pending());
        assert!(matches!(
            ruleset.rules(),
            Err(Error::IngestionPending { .. })
        ));
        assert!(matches!(
            ruleset.preprocessed(),
            Err(Error::IngestionPending { .. })
        ));

        ruleset.settle().unwrap();
        assert!(!ruleset.is_pending());
        assert_eq!(ruleset.preprocessed().unwrap().domains.len(), 1);
    }

    #[test]
    fn test_slow_source_lands_before_fast_source() {
        let mut ruleset = titled("order", RuleSetKind::Mixed);
        ruleset.add_from_ruleset(slow(
            vec!["SLOW,1", "SLOW,2"],
            Duration::from_millis(30),
        ));
        ruleset.add_from_ruleset(vec!["FAST,1"]);
        ruleset.add_rule("DIRECT,1");
        ruleset.settle().unwrap();

        assert_eq!(
            ruleset.rules().unwrap().other_rules(),
            &[
                "SLOW,1".to_string(),
                "SLOW,2".to_string(),
                "FAST,1".to_string(),
                "DIRECT,1".to_string(),
            ]
        );
    }

    #[test]
    fn test_preprocessed_is_cached() {
        let mut ruleset = titled("cache", RuleSetKind::Domain);
        ruleset.add_domain("a.com");

        let first = ruleset.preprocessed().unwrap() as *const Preprocessed;
        let second = ruleset.preprocessed().unwrap() as *const Preprocessed;
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_source_fails_settle() {
        let mut ruleset = titled("missing", RuleSetKind::Domain);
        ruleset.add_from_domainset_file("/nonexistent/list.txt");

        assert!(matches!(ruleset.settle(), Err(Error::Source { .. })));
        assert!(matches!(
            ruleset.rules(),
            Err(Error::IngestionAborted { .. })
        ));
    }

    #[test]
    fn test_write_requires_metadata() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::under(dir.path());

        let mut ruleset = RuleSet::new("untitled", RuleSetKind::Domain);
        ruleset.add_domain("a.com");
        assert!(matches!(
            ruleset.write(&layout, Formats::all()),
            Err(Error::MissingTitle { .. })
        ));

        let mut ruleset = RuleSet::new("undescribed", RuleSetKind::Domain).with_title("T");
        assert!(matches!(
            ruleset.write(&layout, Formats::all()),
            Err(Error::MissingDescription { .. })
        ));
    }

    #[test]
    fn test_write_skips_module_without_regexes() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::under(dir.path());

        let mut ruleset = titled("cdn", RuleSetKind::Mixed);
        ruleset.add_domain_suffix("cdn.example.com");
        let published = ruleset.write(&layout, Formats::all()).unwrap();

        let formats: Vec<Format> = published.iter().map(|p| p.format).collect();
        assert_eq!(formats, vec![Format::Surge, Format::Clash, Format::SingBox]);
        assert!(published
            .iter()
            .all(|p| p.outcome == WriteOutcome::Written && p.path.exists()));
    }

    #[test]
    fn test_multiline_description_rewrite_is_stable() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::under(dir.path());

        let make = || {
            let mut ruleset = RuleSet::new("notes", RuleSetKind::Domain)
                .with_title("Notes")
                .with_description(["first\nsecond"]);
            ruleset.add_domain("a.com");
            ruleset
        };

        let first = make().write(&layout, Formats::SURGE).unwrap();
        assert_eq!(first[0].outcome, WriteOutcome::Written);
        let content = std::fs::read_to_string(&first[0].path).unwrap();
        assert!(content.contains("# first\n# second\n"));

        let second = make().write(&layout, Formats::SURGE).unwrap();
        assert_eq!(second[0].outcome, WriteOutcome::Unchanged);
    }
}

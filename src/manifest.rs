//! Build manifest and output layout.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::emit::{Format, Formats};
use crate::ruleset::RuleSetKind;
use crate::{Error, Result};

/// Root directory per output format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputLayout {
    pub surge: PathBuf,
    pub clash: PathBuf,
    #[serde(alias = "sing-box")]
    pub singbox: PathBuf,
    pub module: PathBuf,
}

impl OutputLayout {
    /// Conventional layout under a single root.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            surge: root.join("List"),
            clash: root.join("Clash"),
            singbox: root.join("sing-box"),
            module: root.join("Modules"),
        }
    }

    fn root(&self, format: Format) -> &Path {
        match format {
            Format::Surge => &self.surge,
            Format::Clash => &self.clash,
            Format::SingBox => &self.singbox,
            Format::Module => &self.module,
        }
    }

    /// Destination of one rule set in one format.
    pub fn path_for(&self, format: Format, kind: RuleSetKind, id: &str) -> PathBuf {
        let file = format!("{}.{}", id, format.extension());
        match format {
            Format::Module => self.root(format).join(file),
            _ => self.root(format).join(kind.dir_name()).join(file),
        }
    }

    fn resolve(&mut self, base: &Path) {
        for dir in [
            &mut self.surge,
            &mut self.clash,
            &mut self.singbox,
            &mut self.module,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

/// How the lines of a source file are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// One domain per line, `.` prefix for suffixes
    #[default]
    Domainset,
    /// `TYPE,VALUE[,ARG]` rule lines
    Ruleset,
}

/// A source file feeding a rule set.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub format: SourceFormat,
}

/// One rule set to build.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetSpec {
    pub id: String,
    #[serde(default)]
    pub kind: RuleSetKind,
    pub title: String,
    /// Banner description; writing fails when it is missing
    #[serde(default)]
    pub description: Option<Vec<String>>,
    /// Formats to publish; all of them when omitted
    #[serde(default)]
    pub formats: Option<Vec<Format>>,
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    /// Inline domain-set lines
    #[serde(default)]
    pub domains: Vec<String>,
    /// Inline rule lines
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub whitelist: Vec<String>,
}

impl RuleSetSpec {
    /// Selected output formats.
    pub fn formats(&self) -> Formats {
        match &self.formats {
            Some(list) => list.iter().copied().collect(),
            None => Formats::default(),
        }
    }
}

/// Manifest describing a whole build.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub output: OutputLayout,
    #[serde(default)]
    pub rulesets: Vec<RuleSetSpec>,
}

impl Manifest {
    /// Parse a manifest from YAML; relative paths stay as written.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Load a manifest, resolving relative paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut manifest = Self::from_yaml(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.output.resolve(base);
        for spec in &mut manifest.rulesets {
            for source in &mut spec.sources {
                if source.path.is_relative() {
                    source.path = base.join(&source.path);
                }
            }
        }
        Ok(manifest)
    }

    fn check(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for spec in &self.rulesets {
            if spec.id.is_empty() || spec.id.contains(['/', '\\']) {
                return Err(Error::Config(format!("invalid rule set id: {:?}", spec.id)));
            }
            if !seen.insert((spec.id.as_str(), spec.kind)) {
                return Err(Error::Config(format!("duplicate rule set id: {}", spec.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
output:
  surge: public/List
  clash: public/Clash
  sing-box: public/sing-box
  module: public/Modules
rulesets:
  - id: reject
    kind: domain
    title: Ad blocking
    description:
      - Collected from public filter lists
    formats: [surge, clash]
    sources:
      - path: sources/reject.txt
    whitelist:
      - .example.com
  - id: stream
    title: Streaming services
    rules:
      - DOMAIN-SUFFIX,netflix.com
    sources:
      - path: sources/stream.conf
        format: ruleset
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        assert_eq!(manifest.rulesets.len(), 2);

        let reject = &manifest.rulesets[0];
        assert_eq!(reject.kind, RuleSetKind::Domain);
        assert_eq!(reject.formats(), Formats::SURGE | Formats::CLASH);
        assert_eq!(reject.sources[0].format, SourceFormat::Domainset);

        let stream = &manifest.rulesets[1];
        assert_eq!(stream.kind, RuleSetKind::Mixed);
        assert_eq!(stream.formats(), Formats::all());
        assert_eq!(stream.sources[0].format, SourceFormat::Ruleset);
        assert!(stream.description.is_none());
        assert_eq!(reject.description.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rulecast.yaml");
        fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.output.surge, dir.path().join("public/List"));
        assert_eq!(
            manifest.rulesets[0].sources[0].path,
            dir.path().join("sources/reject.txt")
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
output: { surge: a, clash: b, singbox: c, module: d }
rulesets:
  - { id: x, title: X }
  - { id: x, title: Y }
"#;
        assert!(matches!(Manifest::from_yaml(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_path_for() {
        let layout = OutputLayout::under("/srv/out");
        assert_eq!(
            layout.path_for(Format::Surge, RuleSetKind::Domain, "reject"),
            PathBuf::from("/srv/out/List/domainset/reject.conf")
        );
        assert_eq!(
            layout.path_for(Format::SingBox, RuleSetKind::Mixed, "stream"),
            PathBuf::from("/srv/out/sing-box/non_ip/stream.json")
        );
        assert_eq!(
            layout.path_for(Format::Module, RuleSetKind::Mixed, "stream"),
            PathBuf::from("/srv/out/Modules/stream.sgmodule")
        );
    }
}

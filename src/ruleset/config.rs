//! Rule set kinds and publication metadata.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{Error, Result};

/// What a rule set contains, which decides its output shape and directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetKind {
    /// Only exact and suffix domains
    Domain,
    /// Any rule type
    #[default]
    Mixed,
}

impl RuleSetKind {
    /// Get the internal name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            RuleSetKind::Domain => "domain",
            RuleSetKind::Mixed => "mixed",
        }
    }

    /// Output sub-directory for this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            RuleSetKind::Domain => "domainset",
            RuleSetKind::Mixed => "non_ip",
        }
    }

    /// Parse a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "domain" | "domainset" => Some(RuleSetKind::Domain),
            "mixed" | "ruleset" | "non_ip" => Some(RuleSetKind::Mixed),
            _ => None,
        }
    }
}

/// Publication metadata carried into every banner.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Slug used for output file names
    pub id: String,
    pub kind: RuleSetKind,
    pub title: Option<String>,
    pub description: Option<Vec<String>>,
    pub date: DateTime<Utc>,
}

impl Metadata {
    /// Create metadata dated now.
    pub fn new(id: impl Into<String>, kind: RuleSetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            description: None,
            date: Utc::now(),
        }
    }

    /// Title, failing if it was never set.
    pub fn require_title(&self) -> Result<&str> {
        self.title.as_deref().ok_or_else(|| Error::MissingTitle {
            id: self.id.clone(),
        })
    }

    /// Description lines, failing if they were never set.
    pub fn require_description(&self) -> Result<&[String]> {
        self.description
            .as_deref()
            .ok_or_else(|| Error::MissingDescription {
                id: self.id.clone(),
            })
    }

    /// Check everything a write needs.
    pub fn validate(&self) -> Result<()> {
        self.require_title()?;
        self.require_description()?;
        Ok(())
    }
}

//! Output formats and their emitters.
//!
//! Every emitter is a pure function of the [`Preprocessed`] view and the
//! rule set [`Metadata`]; calling it twice yields the same lines. Formats
//! are chosen per rule set through [`Formats`] rather than by type.

mod clash;
mod module;
mod singbox;
mod surge;

use bitflags::bitflags;
use chrono::SecondsFormat;
use serde::Deserialize;
use std::fmt;

use crate::ruleset::{Metadata, Preprocessed};
use crate::Result;

/// Divider framing the banner.
const BANNER_DIVIDER: &str = "########################################";

/// A single output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Surge config-file rule list
    Surge,
    /// Clash rule provider text
    Clash,
    /// sing-box source rule-set JSON
    #[serde(alias = "sing-box")]
    SingBox,
    /// Surge module patch carrying MITM hostnames
    Module,
}

impl Format {
    /// Every format, in emission order.
    pub const ALL: [Format; 4] = [Format::Surge, Format::Clash, Format::SingBox, Format::Module];

    /// File extension of the rendered file.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Surge => "conf",
            Format::Clash => "txt",
            Format::SingBox => "json",
            Format::Module => "sgmodule",
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Surge => "surge",
            Format::Clash => "clash",
            Format::SingBox => "singbox",
            Format::Module => "module",
        }
    }

    /// The selection flag for this format.
    pub fn flag(&self) -> Formats {
        match self {
            Format::Surge => Formats::SURGE,
            Format::Clash => Formats::CLASH,
            Format::SingBox => Formats::SINGBOX,
            Format::Module => Formats::MODULE,
        }
    }

    /// Render a rule set.
    ///
    /// Returns `Ok(None)` when the format has nothing to say about this rule
    /// set, in which case no file is produced.
    pub fn render(&self, view: &Preprocessed, meta: &Metadata) -> Result<Option<Vec<String>>> {
        match self {
            Format::Surge => surge::render(view, meta).map(Some),
            Format::Clash => clash::render(view, meta).map(Some),
            Format::SingBox => singbox::render(view).map(Some),
            Format::Module => module::render(view, meta),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

bitflags! {
    /// Set of formats to publish.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Formats: u8 {
        const SURGE = 1 << 0;
        const CLASH = 1 << 1;
        const SINGBOX = 1 << 2;
        const MODULE = 1 << 3;
    }
}

impl Formats {
    /// Iterate the selected formats in emission order.
    pub fn formats(self) -> impl Iterator<Item = Format> {
        Format::ALL
            .into_iter()
            .filter(move |format| self.contains(format.flag()))
    }
}

impl Default for Formats {
    fn default() -> Self {
        Formats::all()
    }
}

impl FromIterator<Format> for Formats {
    fn from_iter<I: IntoIterator<Item = Format>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Formats::empty(), |acc, format| acc | format.flag())
    }
}

/// Comment banner heading every text output.
pub fn banner(meta: &Metadata, rule_count: usize) -> Result<Vec<String>> {
    let title = meta.require_title()?;
    let description = meta.require_description()?;

    let mut lines = Vec::with_capacity(description.len() + 5);
    lines.push(BANNER_DIVIDER.to_string());
    lines.push(format!("# {}", title));
    lines.push(format!(
        "# Last Updated: {}",
        meta.date.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    lines.push(format!("# Size: {}", rule_count));
    // Multi-line entries become one comment line per line
    let description = description
        .iter()
        .flat_map(|entry| entry.split('\n'))
        .map(|line| line.trim_end_matches('\r'));
    for line in description {
        if line.is_empty() {
            lines.push("#".to_string());
        } else {
            lines.push(format!("# {}", line));
        }
    }
    lines.push(BANNER_DIVIDER.to_string());
    Ok(lines)
}

/// Append `TYPE,value[,suffix]` for every value.
fn push_typed<'a, I>(out: &mut Vec<String>, rule_type: &str, values: I, arg: Option<&str>)
where
    I: IntoIterator<Item = &'a str>,
{
    for value in values {
        match arg {
            Some(arg) => out.push(format!("{},{},{}", rule_type, value, arg)),
            None => out.push(format!("{},{}", rule_type, value)),
        }
    }
}

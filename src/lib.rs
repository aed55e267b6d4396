//! Rulecast - aggregate proxy rule sources into per-client rule files.
//!
//! This crate collects rules from domain lists and rule files, deduplicates
//! them into typed buckets, and publishes the result as Surge, Clash,
//! sing-box and Surge-module files. Publishing is idempotent: a file is only
//! rewritten when its rule content changed, not when just the banner
//! timestamp did.
//!
//! # Features
//!
//! - **Classification**: `TYPE,VALUE[,ARG]` lines are sorted into buckets by rule type
//! - **Ordered ingestion**: source reads run on a worker thread but land in call order
//! - **Whitelisting**: whitelisted domains are dropped from every output
//! - **CIDR aggregation**: adjacent and overlapping networks are merged
//! - **Change detection**: unchanged outputs are left untouched on disk
//!
//! # Quick Start
//!
//! ```no_run
//! use rulecast::{Formats, OutputLayout, RuleSet, RuleSetKind};
//!
//! let mut ruleset = RuleSet::new("stream", RuleSetKind::Mixed)
//!     .with_title("Streaming services")
//!     .with_description(["Netflix and friends"]);
//!
//! ruleset
//!     .add_from_ruleset_file("sources/stream.conf")
//!     .add_domain_suffix("netflix.com")
//!     .whitelist_domain("help.netflix.com");
//!
//! let layout = OutputLayout::under("public");
//! for file in ruleset.write(&layout, Formats::all())? {
//!     println!("{:?} {:?}", file.outcome, file.path);
//! }
//! # Ok::<(), rulecast::Error>(())
//! ```
//!
//! # Manifests
//!
//! Whole builds are described in YAML and run with [`build()`]:
//!
//! ```no_run
//! use rulecast::{build, Manifest};
//!
//! let manifest = Manifest::load("rulecast.yaml")?;
//! let report = build(&manifest, &[])?;
//! println!("{} written, {} unchanged", report.written(), report.unchanged());
//! # Ok::<(), rulecast::Error>(())
//! ```

mod error;
mod rule_type;

pub mod build;
pub mod emit;
pub mod manifest;
pub mod publish;
pub mod rule;
pub mod ruleset;
pub mod source;

// Re-export core types
pub use error::{Error, Result};
pub use rule_type::RuleType;

// Re-export ruleset types
pub use ruleset::{Metadata, Preprocessed, Published, RuleSet, RuleSetKind, Rules};

// Re-export output selection
pub use emit::{Format, Formats};
pub use manifest::{Manifest, OutputLayout};
pub use publish::{publish, WriteOutcome};

// Re-export the build entry point
pub use build::{build, BuildReport};

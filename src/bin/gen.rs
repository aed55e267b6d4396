//! rulecast-gen: CLI tool for building rule files from a manifest.

use clap::{Parser, Subcommand};
use rulecast::rule::{classify, classify_domainset, ParsedRule};
use rulecast::{build, source, Manifest, WriteOutcome};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rulecast-gen")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Build Surge, Clash and sing-box rule files from a manifest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every rule set in a manifest
    Build {
        /// Manifest YAML file
        #[arg(short, long, default_value = "rulecast.yaml")]
        manifest: PathBuf,

        /// Only build these rule set ids (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how each line of a source file is classified
    Classify {
        /// Input rule or domain-set file
        #[arg(short, long)]
        input: PathBuf,

        /// Treat the input as a domain set
        #[arg(long)]
        domainset: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        Commands::Build { verbose: true, .. } => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Build {
            manifest,
            only,
            verbose: _,
        } => run_build(&manifest, &only),
        Commands::Classify { input, domainset } => run_classify(&input, domainset),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_build(manifest: &Path, only: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = Manifest::load(manifest)?;
    let report = build(&manifest, only)?;

    for file in &report.published {
        let marker = match file.outcome {
            WriteOutcome::Written => "write",
            WriteOutcome::Unchanged => "skip",
        };
        println!("[{}] {:<8} {}", marker, file.format.as_str(), file.path.display());
    }
    println!(
        "{} written, {} unchanged",
        report.written(),
        report.unchanged()
    );
    Ok(())
}

fn run_classify(input: &Path, domainset: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    let total = source::for_each_line(input, |line| {
        let bucket = if domainset {
            match classify_domainset(line) {
                Some((_, true)) => "DOMAIN-SUFFIX",
                Some((_, false)) => "DOMAIN",
                None => "IGNORED",
            }
        } else {
            bucket_name(&classify(line))
        };
        println!("{:<15} {}", bucket, line);
        *counts.entry(bucket).or_default() += 1;
    })?;

    println!();
    for (bucket, count) in &counts {
        println!("{:<15} {}", bucket, count);
    }
    println!("{:<15} {}", "TOTAL", total);
    Ok(())
}

fn bucket_name(parsed: &ParsedRule<'_>) -> &'static str {
    match parsed {
        ParsedRule::Domain(_) => "DOMAIN",
        ParsedRule::DomainSuffix(_) => "DOMAIN-SUFFIX",
        ParsedRule::DomainKeyword(_) => "DOMAIN-KEYWORD",
        ParsedRule::DomainWildcard(_) => "DOMAIN-WILDCARD",
        ParsedRule::UserAgent(_) => "USER-AGENT",
        ParsedRule::ProcessName(_) => "PROCESS-NAME",
        ParsedRule::ProcessPath(_) => "PROCESS-PATH",
        ParsedRule::UrlRegex(_) => "URL-REGEX",
        ParsedRule::IpCidr { .. } => "IP-CIDR",
        ParsedRule::IpCidr6 { .. } => "IP-CIDR6",
        ParsedRule::IpAsn { .. } => "IP-ASN",
        ParsedRule::GeoIp { .. } => "GEOIP",
        ParsedRule::SrcIp(_) => "SRC-IP",
        ParsedRule::SrcPort(_) => "SRC-PORT",
        ParsedRule::DestPort(_) => "DEST-PORT",
        ParsedRule::Other(_) => "OTHER",
        ParsedRule::Ignored => "IGNORED",
    }
}

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! Domain liveness and certificate expiry monitor

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dms::{Checker, Registry};
use log::debug;

#[derive(Debug, Parser)]
#[command(about, version)]
struct Opts {
    /// Username owning the registry
    #[arg(short, long, env = "DMS_USER")]
    user: String,
    /// Directory holding per-user registries
    #[arg(short, long, env = "DMS_DATA_DIR", default_value = "data/domains")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Add one domain to the registry
    Add {
        /// Domain name
        domain: String,
    },
    /// Import domains from a newline-delimited file
    Import {
        /// Path to the domain list
        path: PathBuf,
    },
    /// Remove one domain from the registry
    Remove {
        /// Domain name
        domain: String,
    },
    /// Print registry records
    List,
    /// Probe one domain, or the whole registry when omitted, and merge the
    /// results back
    Check {
        /// Domain name
        domain: Option<String>,
    },
    /// Print aggregate registry counts
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts: Opts = Opts::parse();
    let registry = Registry::new(&opts.data_dir);

    match &opts.command {
        Commands::Add { domain } => {
            let report = registry.add(&opts.user, domain)?;
            println!("{} record(s) written", report.records_written);
        }
        Commands::Import { path } => {
            let content = std::fs::read_to_string(path)?;
            let domains = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect::<Vec<String>>();
            let report = registry.add_bulk(&opts.user, &domains)?;
            println!(
                "{} record(s) written, {} bad domain(s)",
                report.records_written, report.bad_domains
            );
        }
        Commands::Remove { domain } => {
            registry.delete(&opts.user, domain)?;
            println!("domain {domain} deleted");
        }
        Commands::List => {
            for record in registry.load(&opts.user)? {
                println!("{record}");
            }
        }
        Commands::Check { domain } => {
            check_command(&opts, &registry, domain.as_deref()).await?;
        }
        Commands::Stats => {
            let stats = registry.stats(&opts.user)?;
            println!("{stats}");
        }
    }
    Ok(())
}

async fn check_command(
    opts: &Opts,
    registry: &Registry,
    domain: Option<&str>,
) -> anyhow::Result<()> {
    let domains = match domain {
        Some(domain) => vec![domain.to_string()],
        None => registry.domains(&opts.user)?,
    };
    debug!("check {domains:?}");

    let checker = Checker::default();
    let results = checker.check_all(&domains).await;
    for result in &results {
        println!("{result}");
    }

    let report = registry.merge(&opts.user, &results)?;
    println!(
        "{} record(s) updated, {} result(s) dropped",
        report.updated, report.dropped
    );
    Ok(())
}

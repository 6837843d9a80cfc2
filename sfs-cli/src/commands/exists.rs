//! `sfs exists`: coalesced existence checks.

use std::path::PathBuf;

use clap::Args;
use futures::future::join_all;
use sfs::coalesce::{OperationKind, RegistryStats};
use sfs::fs::Sfs;

use crate::error::CliError;

/// Arguments for the exists command.
#[derive(Debug, Args)]
pub struct ExistsArgs {
    /// Paths to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Concurrent checks issued per path; identical checks share one lookup
    #[arg(long, default_value = "1")]
    pub repeat: usize,
}

/// Result for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReport {
    pub path: PathBuf,
    pub exists: bool,
}

/// Check every path, issuing `repeat` concurrent checks for each.
///
/// A missing path is reported as such; a check that could not complete
/// fails the command.
pub async fn check(
    sfs: &Sfs,
    paths: &[PathBuf],
    repeat: usize,
) -> Result<(Vec<PathReport>, RegistryStats), CliError> {
    if repeat == 0 {
        return Err(CliError::InvalidArgument(
            "--repeat must be at least 1".to_string(),
        ));
    }

    let checks = paths
        .iter()
        .flat_map(|path| std::iter::repeat_n(path, repeat))
        .map(move |path| async move { (path, sfs.exists(path).await) });

    let mut reports: Vec<PathReport> = Vec::with_capacity(paths.len());
    for (path, outcome) in join_all(checks).await {
        // Every check for a path shares one outcome, keep the first
        if reports.last().is_some_and(|r| &r.path == path) {
            continue;
        }
        let exists = outcome.map_err(|source| CliError::Check {
            path: path.clone(),
            source,
        })?;
        reports.push(PathReport {
            path: path.clone(),
            exists,
        });
    }

    Ok((reports, sfs.stats(OperationKind::Exists)))
}

/// Run the exists command.
pub async fn run(args: ExistsArgs) -> Result<(), CliError> {
    let sfs = Sfs::new();
    let (reports, stats) = check(&sfs, &args.paths, args.repeat).await?;

    for report in &reports {
        let status = if report.exists { "exists" } else { "missing" };
        println!("{:<8} {}", status, report.path.display());
    }

    println!();
    println!(
        "Checks: {}  Lookups: {}  Coalesced: {} ({:.1}%)",
        stats.total_requests,
        stats.new_requests,
        stats.coalesced_requests,
        stats.coalescing_ratio() * 100.0
    );
    sfs.log_stats();

    Ok(())
}

//! `sfs warm`: load files, simulate traffic and fill the hot-path cache.

use std::path::PathBuf;

use clap::Args;
use futures::future::join_all;
use sfs::config::format_size;
use sfs::factory::{FileFactory, RefreshReport};
use tracing::info;

use crate::error::CliError;

/// Arguments for the warm command.
#[derive(Debug, Args)]
pub struct WarmArgs {
    /// Files to load
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Times each file is served before the cache is refreshed
    #[arg(long, default_value = "1")]
    pub serve: u64,
}

/// State of one loaded file after warming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmedFile {
    pub path: PathBuf,
    pub fingerprint: String,
    pub size: usize,
    pub requested: u64,
    pub cached: bool,
}

/// Load `paths`, serve each `serve` times, then refresh the cache.
pub async fn warm(
    factory: &FileFactory,
    paths: &[PathBuf],
    serve: u64,
) -> Result<(Vec<WarmedFile>, RefreshReport), CliError> {
    let loaded = join_all(paths.iter().map(|path| factory.load(path)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(CliError::Load)?;

    for record in &loaded {
        let fingerprint = record.fingerprint();
        for _ in 0..serve {
            factory.serve(&fingerprint);
        }
    }

    let report = factory.refresh().await.map_err(CliError::Refresh)?;

    let files = loaded
        .iter()
        .map(|record| {
            let fingerprint = record.fingerprint();
            WarmedFile {
                path: record.path().map(PathBuf::from).unwrap_or_default(),
                size: record.buffer().map(|b| b.len()).unwrap_or(0),
                requested: record.requested(),
                cached: factory.cache().contains(fingerprint.as_str()),
                fingerprint: fingerprint.short().to_string(),
            }
        })
        .collect();

    Ok((files, report))
}

/// Run the warm command.
pub async fn run(args: WarmArgs, factory: FileFactory) -> Result<(), CliError> {
    let (files, report) = warm(&factory, &args.paths, args.serve).await?;

    for file in &files {
        println!(
            "{} {} {:>10} {:>6}x  {}",
            if file.cached { "cached" } else { "cold  " },
            file.fingerprint,
            format_size(file.size),
            file.requested,
            file.path.display()
        );
    }

    println!();
    println!(
        "Cached {} of {} files ({} of {} budget) in {:?}",
        report.cached,
        report.considered,
        format_size(factory.cache().allocated_bytes()),
        format_size(factory.cache().budget_bytes()),
        report.duration
    );

    factory.cache().log_stats();
    factory.sfs().log_stats();
    info!(records = factory.destroy(), "Warm run finished");

    Ok(())
}

//! `igfind bulk`: CSV in, timestamped CSV and JSON out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use igfind_core::AppConfig;
use igfind_finder::{export, run_batch, BulkOptions, Finder};

use crate::BulkArgs;

/// Snapshot file kept next to the final outputs while the run is in progress.
fn snapshot_path(json_path: &Path) -> PathBuf {
    json_path.with_extension("partial.json")
}

fn bulk_options(config: &AppConfig, args: &BulkArgs, snapshot: PathBuf) -> BulkOptions {
    let mut options = BulkOptions::from_config(config);
    if let Some(workers) = args.workers {
        options.max_workers = workers;
    }
    if let Some(rate) = args.starts_per_sec {
        options.starts_per_sec = rate;
    }
    options.shuffle = args.shuffle;
    options.snapshot_path = Some(snapshot);
    options
}

pub(crate) async fn run_bulk(finder: Finder, config: &AppConfig, args: BulkArgs) -> anyhow::Result<()> {
    let mut targets = export::read_targets_file(&args.input)
        .with_context(|| format!("failed to read targets from {}", args.input.display()))?;
    if let Some(limit) = args.limit {
        targets.truncate(limit);
    }
    if targets.is_empty() {
        println!("no targets to process in {}", args.input.display());
        return Ok(());
    }

    let (json_path, csv_path) = export::output_paths(&args.output_dir, chrono::Local::now());
    let snapshot = snapshot_path(&json_path);
    let options = bulk_options(config, &args, snapshot.clone());

    let outcome = run_batch(Arc::new(finder), targets, &options, shutdown_signal()).await;

    export::write_json_file(&json_path, &outcome.results)
        .with_context(|| format!("failed to write {}", json_path.display()))?;
    export::write_csv_file(&csv_path, &outcome.results)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    if outcome.interrupted {
        println!(
            "interrupted: saved {} completed rows (snapshot kept at {})",
            outcome.results.len(),
            snapshot.display()
        );
    } else if let Err(e) = std::fs::remove_file(&snapshot) {
        tracing::debug!(path = %snapshot.display(), error = %e, "no snapshot to remove");
    }

    let found = outcome.results.iter().filter(|r| r.has_handle()).count();
    let flagged = outcome
        .results
        .iter()
        .filter(|r| r.review == igfind_finder::REVIEW_FLAG)
        .count();
    println!(
        "found {found}/{} handles ({flagged} rows flagged for review)\n  {}\n  {}",
        outcome.results.len(),
        csv_path.display(),
        json_path.display()
    );
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the run simply
/// cannot be interrupted.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received ctrl-c, stopping dispatch and saving completed rows");
}

//! Bulk runner: many targets through [`Finder::discover`] on a bounded
//! worker pool, with start throttling, the shared cooldown, periodic
//! snapshots and clean interruption.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use igfind_core::{AppConfig, DiscoveryResult, SearchTarget};
use igfind_search::RateLimitCooldown;
use rand::seq::SliceRandom;
use tokio::time::Instant;

use crate::export;
use crate::pipeline::Finder;
use crate::review::apply_review_flags;

#[derive(Debug, Clone)]
pub struct BulkOptions {
    pub max_workers: usize,
    /// Task starts per second across the whole pool; `0` disables throttling.
    pub starts_per_sec: f64,
    /// Snapshot after every N completed rows; `0` disables periodic snapshots.
    pub snapshot_every: usize,
    pub snapshot_path: Option<PathBuf>,
    pub shuffle: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            max_workers: 6,
            starts_per_sec: 1.5,
            snapshot_every: 10,
            snapshot_path: None,
            shuffle: false,
        }
    }
}

impl BulkOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_workers: config.bulk_max_workers,
            starts_per_sec: config.starts_per_sec,
            snapshot_every: config.snapshot_every,
            ..Self::default()
        }
    }

    fn start_interval(&self) -> Option<Duration> {
        (self.starts_per_sec.is_finite() && self.starts_per_sec > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / self.starts_per_sec))
    }

    fn snapshot_due(&self, completed: usize) -> bool {
        self.snapshot_every > 0 && completed.is_multiple_of(self.snapshot_every)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Completed rows in completion order, review flags applied.
    pub results: Vec<DiscoveryResult>,
    /// `true` if the shutdown signal fired before every target finished.
    pub interrupted: bool,
}

/// Run every target and collect the results.
///
/// A target whose task panics becomes an `error` row; nothing aborts the
/// batch except `shutdown`, after which dispatch stops, in-flight work is
/// abandoned and the completed rows are returned (and snapshotted).
pub async fn run_batch<S>(
    finder: Arc<Finder>,
    mut targets: Vec<SearchTarget>,
    options: &BulkOptions,
    shutdown: S,
) -> BatchOutcome
where
    S: Future<Output = ()>,
{
    if options.shuffle {
        targets.shuffle(&mut rand::rng());
    }
    let total = targets.len();
    let interval = options.start_interval();
    let workers = options.max_workers.max(1);
    tracing::info!(
        total,
        workers,
        starts_per_sec = options.starts_per_sec,
        "bulk run starting"
    );

    let gate = StartGate::new(interval, finder.cooldown().clone());
    let tasks = stream::unfold(
        (targets.into_iter(), gate),
        |(mut pending, mut gate)| async move {
            let target = pending.next()?;
            gate.ready().await;
            Some((target, (pending, gate)))
        },
    )
    .map(move |target| {
        let finder = Arc::clone(&finder);
        async move {
            let task = {
                let target = target.clone();
                tokio::spawn(async move { finder.discover(&target).await })
            };
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        restaurant = %target.restaurant_name,
                        store_id = %target.store_id,
                        error = %e,
                        "discovery task failed"
                    );
                    DiscoveryResult::error(&target, format!("discovery task failed: {e}"))
                }
            }
        }
    })
    .buffer_unordered(workers);

    let mut tasks = std::pin::pin!(tasks);
    let mut shutdown = std::pin::pin!(shutdown);
    let mut results = Vec::with_capacity(total);
    let mut interrupted = false;

    loop {
        tokio::select! {
            biased;
            () = shutdown.as_mut() => {
                tracing::warn!(
                    completed = results.len(),
                    total,
                    "interrupted, abandoning in-flight targets"
                );
                interrupted = true;
                break;
            }
            next = tasks.next() => {
                let Some(result) = next else { break };
                results.push(result);
                tracing::debug!(completed = results.len(), total, "target completed");
                if options.snapshot_due(results.len()) {
                    snapshot(options, &results);
                }
            }
        }
    }

    apply_review_flags(&mut results);
    snapshot(options, &results);
    log_summary(&results, total);

    BatchOutcome {
        results,
        interrupted,
    }
}

/// Paces task starts: waits out the shared cooldown, then keeps at least
/// `interval` between consecutive starts, measured from when the previous
/// start actually happened. A stall (cooldown, slow upstream) therefore
/// never releases a burst of overdue starts.
struct StartGate {
    interval: Option<Duration>,
    cooldown: RateLimitCooldown,
    next_start: Option<Instant>,
}

impl StartGate {
    fn new(interval: Option<Duration>, cooldown: RateLimitCooldown) -> Self {
        Self {
            interval,
            cooldown,
            next_start: None,
        }
    }

    async fn ready(&mut self) {
        if let Some(next) = self.next_start {
            tokio::time::sleep_until(next).await;
        }
        self.cooldown.wait_ready().await;
        self.next_start = self.interval.map(|interval| Instant::now() + interval);
    }
}

fn snapshot(options: &BulkOptions, results: &[DiscoveryResult]) {
    let Some(path) = &options.snapshot_path else {
        return;
    };
    match export::write_json_file(path, results) {
        Ok(()) => tracing::debug!(path = %path.display(), rows = results.len(), "snapshot written"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "snapshot write failed"),
    }
}

fn log_summary(results: &[DiscoveryResult], total: usize) {
    let found = results.iter().filter(|r| r.has_handle()).count();
    let mut grades: BTreeMap<String, usize> = BTreeMap::new();
    for result in results {
        let grade = result
            .confidence
            .map_or_else(|| "none".to_string(), |c| c.grade.to_string());
        *grades.entry(grade).or_default() += 1;
    }
    let grades = grades
        .iter()
        .map(|(grade, count)| format!("{grade}={count}"))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(
        found,
        completed = results.len(),
        total,
        grades = %grades,
        "bulk run finished"
    );
}

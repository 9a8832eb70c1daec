// src/cache/refresh.rs
//! Refresh loop: pull the ranked ids, collect stories in bounded waves, and
//! publish a sorted snapshot once enough have arrived.
//!
//! One cycle runs `FetchingIds -> waves -> await completion -> publish | timed out`.
//! After a publish the loop cools down for `refresh_interval`; after a timeout
//! it starts over at once; when the id list cannot be fetched it retries with
//! exponential backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use metrics::{counter, gauge, histogram};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::cache::collector::{collect_story, Collected};
use crate::cache::ensure_metrics_described;
use crate::cache::snapshot::Snapshot;
use crate::cache::tracker::spawn_tracker;
use crate::hn::{FetchError, ItemSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Stories needed for a cycle to publish; also the serving capacity.
    pub target: usize,
    /// Workers dispatched per wave.
    pub chunk_size: usize,
    pub completion_timeout: Duration,
    /// Cooldown after a successful publish.
    pub refresh_interval: Duration,
    pub retry_initial: Duration,
    pub retry_max: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            target: 30,
            chunk_size: 30,
            completion_timeout: Duration::from_secs(5),
            refresh_interval: Duration::from_secs(60),
            retry_initial: Duration::from_secs(1),
            retry_max: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Published { stories: usize },
    /// Not enough stories before the deadline; the served snapshot was left alone.
    TimedOut { collected: usize },
    /// The ranked id list could not be fetched.
    SourceFailed(FetchError),
}

impl CycleOutcome {
    fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Published { .. } => "published",
            CycleOutcome::TimedOut { .. } => "timed_out",
            CycleOutcome::SourceFailed(_) => "source_failed",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WaveTally {
    appended: usize,
    skipped: usize,
    failed: usize,
    full: usize,
}

impl WaveTally {
    fn add(&mut self, c: Collected) {
        match c {
            Collected::Appended => self.appended += 1,
            Collected::Skipped => self.skipped += 1,
            Collected::Failed => self.failed += 1,
            Collected::Full => self.full += 1,
        }
    }
}

pub struct Refresher {
    source: Arc<dyn ItemSource>,
    served: Arc<Snapshot>,
    cfg: RefreshConfig,
}

impl Refresher {
    pub fn new(source: Arc<dyn ItemSource>, served: Arc<Snapshot>, cfg: RefreshConfig) -> Self {
        Self {
            source,
            served,
            cfg,
        }
    }

    /// Run a single refresh cycle.
    pub async fn refresh_once(&self) -> CycleOutcome {
        ensure_metrics_described();
        let t0 = Instant::now();
        let outcome = self.cycle().await;

        counter!("refresh_cycles_total", "outcome" => outcome.label()).increment(1);
        histogram!("refresh_cycle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        outcome
    }

    async fn cycle(&self) -> CycleOutcome {
        let target = self.cfg.target;
        let chunk_size = self.cfg.chunk_size.max(1);

        let ids = match self.source.top_items().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(target: "refresh", source = self.source.name(), error = %e, "failed to load top stories");
                return CycleOutcome::SourceFailed(e);
            }
        };
        info!(target: "refresh", ids = ids.len(), target_count = target, "updating cache");

        let building = Arc::new(Snapshot::new());
        let done = spawn_tracker(&building, target);

        for (wave, chunk) in ids.chunks(chunk_size).enumerate() {
            if building.len() >= target {
                break;
            }
            let base = wave * chunk_size;
            let mut workers = JoinSet::new();
            for (i, &id) in chunk.iter().enumerate() {
                let source = Arc::clone(&self.source);
                let building = Arc::clone(&building);
                workers.spawn(async move {
                    collect_story(base + i, id, source.as_ref(), &building, target).await
                });
            }

            // Barrier: the next wave starts only after every worker of this one finished.
            let mut tally = WaveTally::default();
            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(c) => tally.add(c),
                    Err(e) => warn!(target: "refresh", error = %e, "collection worker panicked"),
                }
            }
            debug!(
                target: "refresh",
                wave,
                appended = tally.appended,
                skipped = tally.skipped,
                failed = tally.failed,
                full = tally.full,
                collected = building.len(),
                "wave finished"
            );
        }

        match tokio::time::timeout(self.cfg.completion_timeout, done).await {
            Ok(Ok(())) => {
                let stories = building.publish_sorted_into(&self.served);
                gauge!("refresh_stories_published").set(stories as f64);
                info!(target: "refresh", stories, "cache updated");
                CycleOutcome::Published { stories }
            }
            _ => {
                let collected = building.len();
                warn!(target: "refresh", collected, target_count = target, "failed to update cache");
                CycleOutcome::TimedOut { collected }
            }
        }
    }

    fn retry_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.cfg.retry_initial)
            .with_max_interval(self.cfg.retry_max)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Refresh forever.
    pub async fn run(self) {
        let mut backoff = self.retry_backoff();
        loop {
            match self.refresh_once().await {
                CycleOutcome::Published { .. } => {
                    backoff.reset();
                    tokio::time::sleep(self.cfg.refresh_interval).await;
                }
                CycleOutcome::TimedOut { .. } => {
                    backoff.reset();
                }
                CycleOutcome::SourceFailed(_) => {
                    let wait = backoff.next_backoff().unwrap_or(self.cfg.retry_max);
                    info!(target: "refresh", wait_ms = wait.as_millis() as u64, "retrying top stories");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Spawn [`Refresher::run`] on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Wait for a background task and log how it ended. Returns `true` if it panicked.
pub async fn report_exit(task: JoinHandle<()>, name: &'static str) -> bool {
    match task.await {
        Ok(()) => {
            warn!(target: "refresh", task = name, "background task exited");
            false
        }
        Err(e) if e.is_panic() => {
            tracing::error!(target: "refresh", task = name, error = %e, "background task panicked");
            true
        }
        Err(e) => {
            warn!(target: "refresh", task = name, error = %e, "background task cancelled");
            false
        }
    }
}

/// Periodically empty the served snapshot so stale data is never shown for
/// longer than `every`. Off unless configured.
pub fn spawn_invalidator(served: Arc<Snapshot>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!(target: "refresh", "invalidating stories cache");
            served.clear();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hn::{Item, StaticSource};

    fn quick_cfg(target: usize) -> RefreshConfig {
        RefreshConfig {
            target,
            chunk_size: target,
            completion_timeout: Duration::from_millis(100),
            refresh_interval: Duration::from_millis(10),
            retry_initial: Duration::from_millis(5),
            retry_max: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn source_failure_leaves_served_untouched() {
        let served = Arc::new(Snapshot::new());
        let r = Refresher::new(Arc::new(StaticSource::failing_top()), served.clone(), quick_cfg(3));
        assert!(matches!(r.refresh_once().await, CycleOutcome::SourceFailed(_)));
        assert!(served.is_empty());
        assert!(served.published_at().is_none());
    }

    #[tokio::test]
    async fn later_waves_skipped_once_full() {
        let items: Vec<Item> = (0..10)
            .map(|i| Item::new(i, "story", "t", "https://example.com"))
            .collect();
        let src = Arc::new(StaticSource::new(items));
        let served = Arc::new(Snapshot::new());
        let r = Refresher::new(src.clone(), served.clone(), quick_cfg(2));

        assert!(matches!(r.refresh_once().await, CycleOutcome::Published { stories: 2 }));
        assert_eq!(src.item_calls(), 2);
    }

    #[tokio::test]
    async fn run_retries_after_source_failure() {
        let src = Arc::new(StaticSource::failing_top());
        let r = Refresher::new(src.clone(), Arc::new(Snapshot::new()), quick_cfg(1));
        let handle = r.spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();
        assert!(src.top_calls() >= 2, "expected retries, got {}", src.top_calls());
    }

    #[tokio::test]
    async fn timeout_retries_at_once_but_publish_cools_down() {
        let cfg = RefreshConfig {
            completion_timeout: Duration::from_millis(20),
            refresh_interval: Duration::from_secs(10),
            ..quick_cfg(3)
        };

        // One link story for a target of three: every cycle times out.
        let starved = Arc::new(StaticSource::new(vec![Item::new(
            1,
            "story",
            "t",
            "https://example.com",
        )]));
        let h = Refresher::new(starved.clone(), Arc::new(Snapshot::new()), cfg).spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        h.abort();
        assert!(starved.top_calls() > 1, "timeouts should retry immediately");

        let plenty = Arc::new(StaticSource::new(
            (1..=3)
                .map(|i| Item::new(i, "story", "t", "https://example.com"))
                .collect(),
        ));
        let served = Arc::new(Snapshot::new());
        let h = Refresher::new(plenty.clone(), served.clone(), cfg).spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        h.abort();
        assert_eq!(plenty.top_calls(), 1, "publish should wait out refresh_interval");
        assert_eq!(served.len(), 3);
    }

    #[tokio::test]
    async fn report_exit_flags_panics() {
        let boom = tokio::spawn(async { panic!("refresh blew up") });
        assert!(report_exit(boom, "refresh").await);

        let quiet = tokio::spawn(async {});
        assert!(!report_exit(quiet, "refresh").await);
    }

    #[tokio::test]
    async fn invalidator_clears_served() {
        let served = Arc::new(Snapshot::new());
        served.push(crate::cache::Story::new(
            Item::new(1, "story", "t", "https://example.com"),
            0,
        ));
        let h = spawn_invalidator(served.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;
        h.abort();
        assert!(served.is_empty());
        assert!(served.published_at().is_none());
    }
}

//! Pipeline orchestration: fingerprint stage, dispatch, worker pool, sink.
//!
//! ```text
//! urls ──▶ fingerprint ──▶ dispatch ──(miss)──▶ worker pool ──▶ results
//!                            │  (hit) ─────────────────────────▶ results
//! ```
//!
//! Every stage is connected by a bounded channel, so a saturated pool
//! stops URL consumption. Reports are emitted in completion order.

mod dispatch;
mod pool;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{Stream, StreamExt as _};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::analysis::{Analyzer, Fetcher};
use crate::cache::DedupCache;
use crate::error::{Error, Result};
use crate::model::{ColorReport, WorkItem};
use crate::telemetry::work::start_run_span;

use self::pool::{Shared, WorkerPool};

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent analyses. Also caps open connections and
    /// decoded images held in memory.
    pub workers: usize,
    /// Capacity of each inter-stage channel.
    pub queue_capacity: usize,
    /// Deadline for a single fetch.
    pub fetch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 5,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// URLs consumed from the source.
    pub urls: usize,
    /// Reports answered straight from the cache.
    pub cache_hits: usize,
    /// Reports that joined a computation already in flight.
    pub coalesced: usize,
    /// Computations run by the pool (one fetch each).
    pub analyzed: usize,
    /// Computations that ended in the error sentinel.
    pub errors: usize,
    /// Highest number of analyses running at once.
    pub peak_active: usize,
}

impl PipelineStats {
    /// Reports produced. Equals `urls` for a run whose sink stayed open.
    pub fn reports(&self) -> usize {
        self.cache_hits + self.coalesced + self.analyzed
    }
}

/// Lock-free counters updated by the stages of one run.
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    urls: AtomicUsize,
    cache_hits: AtomicUsize,
    coalesced: AtomicUsize,
    analyzed: AtomicUsize,
    errors: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl RunCounters {
    pub(crate) fn record_url(&self) {
        self.urls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_analyzed(&self, failed: bool) {
        self.analyzed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            urls: self.urls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            analyzed: self.analyzed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            peak_active: self.peak_active.load(Ordering::SeqCst),
        }
    }
}

/// A running pipeline. Read reports with [`PipelineRun::next`], then call
/// [`PipelineRun::finish`].
pub struct PipelineRun {
    results: mpsc::Receiver<ColorReport>,
    handle: JoinHandle<PipelineStats>,
}

impl PipelineRun {
    /// Next report in completion order; `None` once every URL is reported.
    pub async fn next(&mut self) -> Option<ColorReport> {
        self.results.recv().await
    }

    /// Wait for the run to shut down. Reports not yet read are dropped.
    pub async fn finish(self) -> Result<PipelineStats> {
        drop(self.results);
        self.handle
            .await
            .map_err(|e| Error::Other(format!("pipeline task failed: {e}")))
    }
}

/// Wires the stages together. Cheap to clone; clones share the cache.
pub struct Pipeline<F> {
    fetcher: Arc<F>,
    cache: Arc<DedupCache>,
    config: PipelineConfig,
}

impl<F> Clone for Pipeline<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

impl<F: Fetcher + 'static> Pipeline<F> {
    pub fn new(fetcher: Arc<F>, cache: Arc<DedupCache>, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<DedupCache> {
        &self.cache
    }

    /// Start processing `urls` in the background.
    pub fn start<S>(&self, urls: S) -> PipelineRun
    where
        S: Stream<Item = String> + Send + 'static,
    {
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);

        let (item_tx, item_rx) = mpsc::channel::<WorkItem>(capacity);
        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<ColorReport>(capacity);

        let shared = Arc::new(Shared {
            analyzer: Analyzer::new(Arc::clone(&self.fetcher), self.config.fetch_timeout),
            cache: Arc::clone(&self.cache),
            results: result_tx,
            counters: RunCounters::default(),
        });

        let run_id = Uuid::new_v4();
        let span = start_run_span(&run_id, workers);

        let handle = tokio::spawn(
            async move {
                info!(workers, capacity, "pipeline started");

                let fingerprinter = tokio::spawn(
                    async move {
                        let mut urls = std::pin::pin!(urls);
                        while let Some(url) = urls.next().await {
                            if item_tx.send(WorkItem::new(url)).await.is_err() {
                                break;
                            }
                        }
                    }
                    .in_current_span(),
                );

                let pool = WorkerPool::spawn(workers, work_rx, Arc::clone(&shared));

                dispatch::dispatch(item_rx, work_tx, &shared).await;
                // dispatch dropped the work sender; workers exit once drained.
                pool.join().await;

                if let Err(e) = fingerprinter.await {
                    error!("fingerprint stage failed: {e}");
                }

                let stats = shared.counters.snapshot();
                info!(
                    urls = stats.urls,
                    cache_hits = stats.cache_hits,
                    coalesced = stats.coalesced,
                    analyzed = stats.analyzed,
                    errors = stats.errors,
                    peak_active = stats.peak_active,
                    "pipeline finished"
                );
                // The result stream closes once this sender and any waiter
                // parked on another run's computation are gone.
                drop(shared);
                stats
            }
            .instrument(span),
        );

        PipelineRun {
            results: result_rx,
            handle,
        }
    }

    /// Run to completion and gather every report.
    pub async fn collect<S>(&self, urls: S) -> Result<(Vec<ColorReport>, PipelineStats)>
    where
        S: Stream<Item = String> + Send + 'static,
    {
        let mut run = self.start(urls);
        let mut reports = Vec::new();
        while let Some(report) = run.next().await {
            reports.push(report);
        }
        let stats = run.finish().await?;
        Ok((reports, stats))
    }
}

//! Fixed-size worker pool draining the shared work queue.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use opentelemetry::KeyValue;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, warn};

use crate::analysis::{Analyzer, Fetcher};
use crate::cache::{DedupCache, Waiter};
use crate::model::{ColorReport, ColorTriple, WorkItem};
use crate::telemetry::metrics;
use crate::telemetry::work::start_work_span;

use super::RunCounters;

/// State shared by the dispatcher and every worker of one run.
pub(crate) struct Shared<F> {
    pub(crate) analyzer: Analyzer<F>,
    pub(crate) cache: Arc<DedupCache>,
    pub(crate) results: mpsc::Sender<ColorReport>,
    pub(crate) counters: RunCounters,
}

impl<F> Shared<F> {
    /// Forward a report to the sink. A closed sink only loses the report.
    pub(crate) async fn emit(&self, report: ColorReport) {
        if let Err(e) = self.results.send(report).await {
            warn!(url = %e.0.url, "result sink closed, report dropped");
        }
    }

    /// Cache a claimed computation's triple and report it for the claiming
    /// URL. Coalesced URLs are answered on the sink of the run that parked
    /// them, which may be another run sharing the cache.
    pub(crate) async fn settle(&self, item: WorkItem, colors: ColorTriple) {
        let waiters = self.cache.complete(item.fingerprint, colors.clone());

        let outcome = if colors.is_error() { "error" } else { "analyzed" };
        metrics::urls_processed().add(1, &[KeyValue::new("outcome", outcome)]);
        self.counters.record_analyzed(colors.is_error());
        self.emit(ColorReport::new(item.url, colors.clone())).await;

        for Waiter { url, reply } in waiters {
            if let Err(e) = reply.send(ColorReport::new(url, colors.clone())).await {
                warn!(url = %e.0.url, "waiter sink closed, report dropped");
            }
        }
    }
}

pub(crate) struct WorkerPool {
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Spawn `size` workers that pull from `queue` until it closes.
    pub(crate) fn spawn<F>(size: usize, queue: mpsc::Receiver<WorkItem>, shared: Arc<Shared<F>>) -> Self
    where
        F: Fetcher + 'static,
    {
        let queue = Arc::new(Mutex::new(queue));
        let mut workers = JoinSet::new();
        for worker_id in 0..size {
            let queue = Arc::clone(&queue);
            let shared = Arc::clone(&shared);
            workers.spawn(run_worker(worker_id, queue, shared).in_current_span());
        }
        Self { workers }
    }

    /// Wait for every worker to drain the queue and exit.
    pub(crate) async fn join(mut self) {
        while let Some(res) = self.workers.join_next().await {
            if let Err(e) = res {
                error!("worker task failed: {e}");
            }
        }
    }
}

async fn run_worker<F: Fetcher>(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    shared: Arc<Shared<F>>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(item) = next else {
            break;
        };

        let span = start_work_span(&item.url, &item.fingerprint);
        debug!(worker_id, url = %item.url, "worker picked up item");

        shared.counters.enter();
        metrics::workers_active().add(1, &[]);
        let analysis = AssertUnwindSafe(shared.analyzer.analyze(&item, &span))
            .catch_unwind()
            .instrument(span.clone())
            .await;
        metrics::workers_active().add(-1, &[]);
        shared.counters.exit();

        let colors = analysis.unwrap_or_else(|_| {
            error!(worker_id, url = %item.url, "analysis panicked");
            ColorTriple::error()
        });

        shared.settle(item, colors).await;
    }
    debug!(worker_id, "worker exiting");
}

//! Cache check and routing between the fingerprint stage and the pool.

use opentelemetry::KeyValue;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::analysis::Fetcher;
use crate::cache::Lookup;
use crate::model::{ColorReport, ColorTriple, WorkItem};
use crate::telemetry::metrics;

use super::pool::Shared;

/// Route every incoming item: answer cache hits directly, park items whose
/// fingerprint is already being computed, and queue the rest for the pool.
///
/// Blocks on `work` while the pool is saturated, which in turn stops the
/// fingerprint stage from reading further URLs.
pub(crate) async fn dispatch<F: Fetcher>(
    mut items: mpsc::Receiver<WorkItem>,
    work: mpsc::Sender<WorkItem>,
    shared: &Shared<F>,
) {
    while let Some(item) = items.recv().await {
        shared.counters.record_url();

        match shared.cache.lookup_or_claim(&item, &shared.results) {
            Lookup::Hit(colors) => {
                trace!(url = %item.url, "cache hit");
                metrics::urls_processed().add(1, &[KeyValue::new("outcome", "cache_hit")]);
                shared.counters.record_cache_hit();
                shared.emit(ColorReport::new(item.url, colors)).await;
            }
            Lookup::Coalesced => {
                trace!(url = %item.url, "joined in-flight computation");
                metrics::urls_processed().add(1, &[KeyValue::new("outcome", "coalesced")]);
                shared.counters.record_coalesced();
            }
            Lookup::Claimed => {
                if let Err(mpsc::error::SendError(item)) = work.send(item).await {
                    // No worker left to take it; settle the claim so its
                    // waiters are still answered.
                    warn!(url = %item.url, "worker queue closed, reporting error");
                    shared.settle(item, ColorTriple::error()).await;
                }
            }
        }
    }
}

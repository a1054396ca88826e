//! Fetch, decode and color analysis for a single image.
//!
//! [`Analyzer::analyze`] never fails: every fetch or decode problem is logged
//! and turned into [`ColorTriple::error`].

pub mod fetch;
pub mod quantize;
pub mod top_k;

pub use fetch::{Fetcher, HttpFetcher};
pub use quantize::{FrequencyTable, count_colors, quantize_channel};
pub use top_k::top_k;

use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::{Span, debug, warn};

use crate::error::{Error, Result};
use crate::model::{ColorTriple, HexColor, WorkItem};
use crate::telemetry::metrics;
use crate::telemetry::work::record_state_transition;

/// Number of colors reported per image.
pub const TOP_COLORS: usize = 3;

/// Decode `bytes` and return its `k` most frequent colors.
///
/// A zero-pixel image is an error; fewer than `k` distinct colors is not.
pub fn dominant_colors(bytes: &[u8], k: usize) -> Result<Vec<HexColor>> {
    let image = image::load_from_memory(bytes)?;
    let table = count_colors(&image);
    if table.is_empty() {
        return Err(Error::EmptyImage);
    }
    Ok(table.top(k))
}

/// State an analysis was in when `error` ended it.
fn failed_stage(error: &Error) -> &'static str {
    match error {
        Error::Fetch { .. } => "fetching",
        _ => "decoding",
    }
}

/// The fetch-decode-analyze unit.
pub struct Analyzer<F> {
    fetcher: Arc<F>,
    fetch_timeout: Duration,
}

impl<F: Fetcher> Analyzer<F> {
    pub fn new(fetcher: Arc<F>, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            fetch_timeout,
        }
    }

    /// Resolve a work item to its color triple, or the error sentinel.
    pub async fn analyze(&self, item: &WorkItem, span: &Span) -> ColorTriple {
        let start = Instant::now();
        let result = self.try_analyze(item, span).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(colors) => {
                record_state_transition(span, "decoding", "done");
                metrics::analysis_duration_ms()
                    .record(elapsed_ms, &[KeyValue::new("outcome", "ok")]);
                debug!(url = %item.url, primary = %colors.primary, "analyzed");
                colors
            }
            Err(e) => {
                record_state_transition(span, failed_stage(&e), "failed");
                metrics::analysis_duration_ms()
                    .record(elapsed_ms, &[KeyValue::new("outcome", "error")]);
                metrics::analysis_failures().add(1, &[KeyValue::new("kind", e.kind())]);
                warn!(url = %item.url, kind = e.kind(), error = %e, "analysis failed");
                ColorTriple::error()
            }
        }
    }

    async fn try_analyze(&self, item: &WorkItem, span: &Span) -> Result<ColorTriple> {
        record_state_transition(span, "queued", "fetching");
        let bytes = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&item.url))
            .await
            .map_err(|_| Error::Fetch {
                url: item.url.clone(),
                reason: format!("timed out after {:?}", self.fetch_timeout),
            })??;

        record_state_transition(span, "fetching", "decoding");
        let ranked = tokio::task::spawn_blocking(move || dominant_colors(&bytes, TOP_COLORS))
            .await
            .map_err(|e| Error::Other(format!("analysis task failed: {e}")))??;

        Ok(ColorTriple::from_ranked(ranked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_timeout_errors_fail_while_fetching() {
        let err = Error::Fetch {
            url: "http://a/img1.jpg".into(),
            reason: "timed out after 30s".into(),
        };
        assert_eq!(failed_stage(&err), "fetching");
    }

    #[test]
    fn decode_errors_fail_while_decoding() {
        let decode = dominant_colors(b"not an image", TOP_COLORS).unwrap_err();
        assert_eq!(failed_stage(&decode), "decoding");
        assert_eq!(failed_stage(&Error::EmptyImage), "decoding");
        assert_eq!(failed_stage(&Error::Other("analysis task failed".into())), "decoding");
    }
}

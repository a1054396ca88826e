//! Span helpers for pipeline runs and per-image analysis.

use tracing::Span;
use uuid::Uuid;

use crate::model::Fingerprint;

/// Span covering one whole pipeline run.
pub fn start_run_span(run_id: &Uuid, workers: usize) -> Span {
    tracing::info_span!(
        "pipeline.run",
        "run.id" = %run_id,
        "run.workers" = workers,
    )
}

/// Start a span for one image computation.
///
/// The `image.state` field is declared empty and can be updated via
/// [`record_state_transition`].
pub fn start_work_span(url: &str, fingerprint: &Fingerprint) -> Span {
    tracing::info_span!(
        "image.analyze",
        "image.url" = url,
        "image.fingerprint" = %fingerprint,
        "image.state" = tracing::field::Empty,
    )
}

/// Record a state transition on the span and emit an event scoped to it.
pub fn record_state_transition(span: &Span, from: &str, to: &str) {
    span.record("image.state", to);
    span.in_scope(|| {
        tracing::debug!(from = from, to = to, "state_transition");
    });
}

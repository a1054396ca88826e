//! Metric instrument factories for topcolors.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"topcolors"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};

/// Returns the shared meter for topcolors instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("topcolors")
}

/// Counter: URLs resolved to a report.
/// Labels: `outcome` ("analyzed" | "cache_hit" | "coalesced" | "error").
pub fn urls_processed() -> Counter<u64> {
    meter()
        .u64_counter("topcolors.urls.processed")
        .with_description("Number of URLs resolved to a color report")
        .build()
}

/// Counter: analyses that ended in the error sentinel.
/// Labels: `kind` ("fetch" | "decode" | "other").
pub fn analysis_failures() -> Counter<u64> {
    meter()
        .u64_counter("topcolors.analysis.failures")
        .with_description("Number of failed image analyses")
        .build()
}

/// Histogram: fetch + decode + count duration in milliseconds.
/// Labels: `outcome` ("ok" | "error").
pub fn analysis_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("topcolors.analysis.duration_ms")
        .with_description("Image analysis duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Up/down counter: workers currently running an analysis.
pub fn workers_active() -> UpDownCounter<i64> {
    meter()
        .i64_up_down_counter("topcolors.workers.active")
        .with_description("Workers currently analyzing an image")
        .build()
}

use std::time::{Duration, Instant};

use tracing::{Level, Span, field};

use super::TraceId;

/// Root span for one stream (one engine instance).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "root",
        name = %name,
        trace_id = %trace_id,
        stream = field::Empty
    )
}

/// Child span, inherits the trace id from the current root.
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::INFO, "child", name = %name)
}

/// Run `f` and emit a `performance` warning when it takes longer than `max`.
pub fn warn_if_slow<F, T>(label: &'static str, max: Duration, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_us = elapsed.as_micros() as u64,
            "slow operation detected"
        );
    }
    out
}

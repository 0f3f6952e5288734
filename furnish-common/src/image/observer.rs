//! Instrumentation hook for image resolution
//!
//! Injected per [`ImageResolution`](super::ImageResolution); there is no
//! process-wide counter or logger state.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::delivery::DeliveryCandidate;
use super::normalize::NormalizedUrl;

/// Receives resolution progress for one or more items
///
/// All methods default to doing nothing.
pub trait ResolutionObserver: Send + Sync {
    fn on_normalized(&self, _label: &str, _raw: Option<&str>, _url: Option<&NormalizedUrl>) {}

    fn on_fallback(&self, _label: &str, _failed: &DeliveryCandidate, _next: &DeliveryCandidate) {}

    fn on_settled(&self, _label: &str, _failures: usize) {}
}

/// Observer that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ResolutionObserver for NoopObserver {}

/// Observer that logs through `tracing`
///
/// Normalization results are logged at debug level for the first
/// `sample_limit` items only; fallbacks and settles are always logged.
#[derive(Debug)]
pub struct TracingObserver {
    sample_limit: usize,
    sampled: AtomicUsize,
}

impl TracingObserver {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit,
            sampled: AtomicUsize::new(0),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ResolutionObserver for TracingObserver {
    fn on_normalized(&self, label: &str, raw: Option<&str>, url: Option<&NormalizedUrl>) {
        if self.sampled.fetch_add(1, Ordering::Relaxed) >= self.sample_limit {
            return;
        }
        tracing::debug!(
            item = label,
            raw = raw.unwrap_or("<none>"),
            normalized = url.map(NormalizedUrl::as_str).unwrap_or("<absent>"),
            "Normalized image reference"
        );
    }

    fn on_fallback(&self, label: &str, failed: &DeliveryCandidate, next: &DeliveryCandidate) {
        tracing::debug!(
            item = label,
            failed = %failed.strategy,
            next = %next.strategy,
            url = %next.url,
            "Image candidate failed, falling back"
        );
    }

    fn on_settled(&self, label: &str, failures: usize) {
        if failures > 0 {
            tracing::info!(item = label, failures, "Image settled on placeholder");
        } else {
            tracing::debug!(item = label, "No usable image reference, showing placeholder");
        }
    }
}

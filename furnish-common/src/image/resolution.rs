//! Per-item image resolution state machine
//!
//! One [`ImageResolution`] exists per rendered item. It computes the candidate
//! sequence once, exposes the source the render surface should display, and
//! advances on each reported load failure until it settles on the placeholder.
//!
//! The index only moves forward and every strategy is tried at most once, so
//! an item sees at most `sequence.len() - 1` fallbacks and can never loop. A
//! successful load needs no call at all: the machine simply stays where it is.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::delivery::{DeliveryCandidate, DeliveryConfig, Strategy};
use super::normalize::{normalize, NormalizedUrl};
use super::observer::{NoopObserver, ResolutionObserver};

/// Where the state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    /// Waiting on the render surface for the candidate at this index
    Trying(usize),
    /// Placeholder displayed; no further fallback will happen
    Settled,
}

/// Result of reporting a load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Re-request the image using the new current source
    Retry(Strategy),
    /// Fallbacks exhausted; the placeholder is now the current source
    Settled,
    /// Already settled; the report was dropped
    Ignored,
}

/// Resolution state for one rendered item
pub struct ImageResolution {
    label: String,
    normalized: Option<NormalizedUrl>,
    sequence: Vec<DeliveryCandidate>,
    index: usize,
    attempted: BTreeSet<Strategy>,
    failures: usize,
    observer: Arc<dyn ResolutionObserver>,
}

impl ImageResolution {
    /// Build the resolution for one item without instrumentation
    pub fn new(raw: Option<&str>, config: &DeliveryConfig) -> Self {
        Self::with_observer("", raw, config, Arc::new(NoopObserver))
    }

    /// Build the resolution for one item, reporting progress to `observer`
    ///
    /// `label` identifies the item in observer callbacks (typically its
    /// `uniq_id`).
    pub fn with_observer(
        label: impl Into<String>,
        raw: Option<&str>,
        config: &DeliveryConfig,
        observer: Arc<dyn ResolutionObserver>,
    ) -> Self {
        let label = label.into();
        let normalized = normalize(raw);
        observer.on_normalized(&label, raw, normalized.as_ref());

        let sequence = config.candidates(normalized.as_ref());
        let mut resolution = Self {
            label,
            normalized,
            sequence,
            index: 0,
            attempted: BTreeSet::new(),
            failures: 0,
            observer,
        };

        // A placeholder-only sequence is settled before any event arrives
        if resolution.current_strategy() == Strategy::Placeholder {
            resolution.settle();
        }
        resolution
    }

    pub fn phase(&self) -> ResolutionPhase {
        if self.current_strategy() == Strategy::Placeholder {
            ResolutionPhase::Settled
        } else {
            ResolutionPhase::Trying(self.index)
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase() == ResolutionPhase::Settled
    }

    /// Source the render surface should display right now; never empty
    pub fn current_source(&self) -> &str {
        &self.current_candidate().url
    }

    pub fn current_candidate(&self) -> &DeliveryCandidate {
        &self.sequence[self.index]
    }

    pub fn current_strategy(&self) -> Strategy {
        self.current_candidate().strategy
    }

    pub fn normalized(&self) -> Option<&NormalizedUrl> {
        self.normalized.as_ref()
    }

    pub fn sequence(&self) -> &[DeliveryCandidate] {
        &self.sequence
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of load failures that caused a transition
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Strategies already used up, in candidate order
    pub fn attempted(&self) -> impl Iterator<Item = Strategy> + '_ {
        self.attempted.iter().copied()
    }

    /// Report that the current source failed to load
    ///
    /// Marks the current strategy attempted and moves to the next candidate.
    /// Moving onto the placeholder settles the item.
    pub fn on_load_failure(&mut self) -> Transition {
        if self.is_settled() {
            return Transition::Ignored;
        }

        let failed = self.index;
        self.mark_attempted(self.sequence[failed].strategy);
        self.failures += 1;
        self.index = failed + 1;

        self.observer
            .on_fallback(&self.label, &self.sequence[failed], &self.sequence[self.index]);

        if self.current_strategy() == Strategy::Placeholder {
            self.settle();
            Transition::Settled
        } else {
            Transition::Retry(self.current_strategy())
        }
    }

    fn settle(&mut self) {
        self.mark_attempted(Strategy::Placeholder);
        self.observer.on_settled(&self.label, self.failures);
    }

    fn mark_attempted(&mut self, strategy: Strategy) {
        let first_time = self.attempted.insert(strategy);
        debug_assert!(first_time, "strategy {} attempted twice", strategy);
    }
}

impl std::fmt::Debug for ImageResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolution")
            .field("label", &self.label)
            .field("normalized", &self.normalized)
            .field("sequence", &self.sequence)
            .field("phase", &self.phase())
            .field("failures", &self.failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn config() -> DeliveryConfig {
        DeliveryConfig::default()
    }

    #[test]
    fn test_absent_reference_is_settled_on_placeholder() {
        for raw in [None, Some(""), Some("   "), Some("garbage")] {
            let resolution = ImageResolution::new(raw, &config());
            assert_eq!(resolution.phase(), ResolutionPhase::Settled);
            assert_eq!(resolution.current_source(), config().placeholder_url.as_str());
            assert_eq!(resolution.sequence().len(), 1);
            assert_eq!(resolution.failure_count(), 0);
        }
    }

    #[test]
    fn test_initial_state_tries_proxy() {
        let resolution = ImageResolution::new(Some("//a.com/x.jpg"), &config());
        assert_eq!(resolution.phase(), ResolutionPhase::Trying(0));
        assert_eq!(resolution.current_strategy(), Strategy::Proxied);
        assert_eq!(
            resolution.normalized().map(NormalizedUrl::as_str),
            Some("https://a.com/x.jpg")
        );
        assert_eq!(resolution.attempted().count(), 0);
    }

    #[test]
    fn test_proxy_fails_direct_succeeds() {
        let mut resolution = ImageResolution::new(Some("https://a.com/x.jpg"), &config());

        assert_eq!(resolution.on_load_failure(), Transition::Retry(Strategy::Direct));

        // Direct load succeeds: no further events
        assert_eq!(resolution.phase(), ResolutionPhase::Trying(1));
        assert_eq!(resolution.current_source(), "https://a.com/x.jpg");
        assert_eq!(resolution.failure_count(), 1);
        assert_eq!(resolution.attempted().collect::<Vec<_>>(), vec![Strategy::Proxied]);
    }

    #[test]
    fn test_both_fail_settles_on_placeholder() {
        let mut resolution = ImageResolution::new(Some("https://a.com/x.jpg"), &config());

        assert_eq!(resolution.on_load_failure(), Transition::Retry(Strategy::Direct));
        assert_eq!(resolution.on_load_failure(), Transition::Settled);

        assert_eq!(resolution.phase(), ResolutionPhase::Settled);
        assert_eq!(resolution.current_source(), config().placeholder_url.as_str());
        assert_eq!(resolution.failure_count(), 2);
        assert_eq!(
            resolution.attempted().collect::<Vec<_>>(),
            vec![Strategy::Proxied, Strategy::Direct, Strategy::Placeholder]
        );
    }

    #[test]
    fn test_failures_after_settled_are_ignored() {
        let mut resolution = ImageResolution::new(Some("https://a.com/x.jpg"), &config());
        resolution.on_load_failure();
        resolution.on_load_failure();

        for _ in 0..5 {
            assert_eq!(resolution.on_load_failure(), Transition::Ignored);
        }
        assert_eq!(resolution.failure_count(), 2);
        assert!(resolution.is_settled());

        let mut empty = ImageResolution::new(None, &config());
        assert_eq!(empty.on_load_failure(), Transition::Ignored);
        assert_eq!(empty.failure_count(), 0);
    }

    #[test]
    fn test_index_never_decreases_and_is_bounded() {
        for raw in [Some("https://a.com/x.jpg"), Some("a.com/x.jpg"), None] {
            let mut resolution = ImageResolution::new(raw, &config());
            let len = resolution.sequence().len();
            let mut last = 0;
            for _ in 0..10 {
                resolution.on_load_failure();
                let index = resolution
                    .sequence()
                    .iter()
                    .position(|c| c.url == resolution.current_source())
                    .unwrap();
                assert!(index >= last);
                last = index;
            }
            assert!(resolution.is_settled());
            assert!(resolution.failure_count() < len.max(1));
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ResolutionObserver for RecordingObserver {
        fn on_normalized(&self, label: &str, _raw: Option<&str>, url: Option<&NormalizedUrl>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{} normalized {}", label, url.is_some()));
        }

        fn on_fallback(&self, label: &str, failed: &DeliveryCandidate, next: &DeliveryCandidate) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{} {} -> {}", label, failed.strategy, next.strategy));
        }

        fn on_settled(&self, label: &str, failures: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{} settled after {}", label, failures));
        }
    }

    #[test]
    fn test_observer_sees_each_step() {
        let observer = Arc::new(RecordingObserver::default());
        let mut resolution = ImageResolution::with_observer(
            "item-1",
            Some("https://a.com/x.jpg"),
            &config(),
            observer.clone(),
        );
        resolution.on_load_failure();
        resolution.on_load_failure();
        resolution.on_load_failure();

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                "item-1 normalized true",
                "item-1 proxied -> direct",
                "item-1 direct -> placeholder",
                "item-1 settled after 2",
            ]
        );
    }

    #[test]
    fn test_observer_settled_immediately_when_absent() {
        let observer = Arc::new(RecordingObserver::default());
        let _resolution =
            ImageResolution::with_observer("item-2", Some(""), &config(), observer.clone());

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["item-2 normalized false", "item-2 settled after 0"]
        );
    }
}

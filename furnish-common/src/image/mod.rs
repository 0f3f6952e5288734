//! Image resolution pipeline
//!
//! Untrusted image reference -> [`normalize`] -> [`DeliveryConfig::candidates`]
//! -> [`ImageResolution`] driven by a render surface.

pub mod delivery;
pub mod normalize;
pub mod observer;
pub mod resolution;

pub use delivery::{DeliveryCandidate, DeliveryConfig, Strategy};
pub use normalize::{normalize, NormalizedUrl};
pub use observer::{NoopObserver, ResolutionObserver, TracingObserver};
pub use resolution::{ImageResolution, ResolutionPhase, Transition};

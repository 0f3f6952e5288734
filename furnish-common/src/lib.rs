//! # FurnishFindr Common Library
//!
//! Shared code for the FurnishFindr client including:
//! - Backend API request/response types
//! - Configuration loading
//! - Image reference normalization and delivery candidates
//! - Per-item image resolution state machine

pub mod api;
pub mod config;
pub mod error;
pub mod image;

pub use error::{Error, Result};
pub use image::{
    normalize, DeliveryCandidate, DeliveryConfig, ImageResolution, NormalizedUrl,
    ResolutionPhase, Strategy, Transition,
};

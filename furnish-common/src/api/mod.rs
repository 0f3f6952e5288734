//! Backend API wire types
//!
//! Request and response bodies for the recommendation and analytics
//! endpoints. Pure serde types; the HTTP client lives in `furnish-ui`.

pub mod types;

pub use types::{
    AnalyticsResponse, CountEntry, ItemRecord, RecommendRequest, RecommendResponse,
};

//! furnish-ui library - FurnishFindr search client
//!
//! Submits free-text queries to the recommendation backend, resolves every
//! result's image through the fallback pipeline and renders the outcome.
//! Also exposes the read-only analytics view.

pub mod client;
pub mod interactive;
pub mod render;
pub mod results;
pub mod session;
pub mod surface;

use furnish_common::api::{AnalyticsResponse, RecommendRequest, RecommendResponse};
use furnish_common::image::{DeliveryConfig, ResolutionObserver};
use std::sync::Arc;

use crate::client::{BackendClient, ClientError};
use crate::results::{resolve_items, SearchResults};
use crate::session::{RequestTicket, SearchSession, SearchView};
use crate::surface::RenderSurface;

/// Version, git hash, build timestamp and profile stamped by build.rs
pub fn build_info() -> String {
    format!(
        "v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    )
}

/// Application state shared across searches
#[derive(Clone)]
pub struct App {
    /// Backend API client
    pub client: BackendClient,
    /// Where image candidates are loaded
    pub surface: Arc<dyn RenderSurface>,
    /// Image proxy and placeholder configuration
    pub delivery: DeliveryConfig,
    /// Instrumentation for every item's resolution
    pub observer: Arc<dyn ResolutionObserver>,
    /// Latest-response guard and current view
    pub session: SearchSession,
    /// Results requested when the query does not specify `k`
    pub default_k: u32,
}

impl App {
    pub fn new(
        client: BackendClient,
        surface: Arc<dyn RenderSurface>,
        delivery: DeliveryConfig,
        observer: Arc<dyn ResolutionObserver>,
        default_k: u32,
    ) -> Self {
        Self {
            client,
            surface,
            delivery,
            observer,
            session: SearchSession::new(),
            default_k,
        }
    }

    /// Request with the configured default `k`
    pub fn request(&self, query: &str) -> RecommendRequest {
        RecommendRequest::new(query).with_k(self.default_k)
    }

    /// Run a search through the session guard
    ///
    /// Returns the view to display, or `None` when a newer search superseded
    /// this one while it was in flight.
    pub async fn submit(&self, request: RecommendRequest) -> Option<SearchView> {
        let ticket = self.session.begin(&request.query).await;
        self.submit_with(ticket, request).await
    }

    /// Run a search for a ticket the caller already took from the session
    ///
    /// Callers that issue tickets from one place (the interactive read loop)
    /// use this so ticket order follows submission order.
    pub async fn submit_with(
        &self,
        ticket: RequestTicket,
        request: RecommendRequest,
    ) -> Option<SearchView> {
        let outcome = match self.client.recommend(&request).await {
            Ok(response) => {
                // Skip image resolution for a response nobody will see
                if !self.session.is_current(ticket).await {
                    tracing::debug!(query = %request.query, "Search superseded before images resolved");
                    return None;
                }
                Ok(self.resolve(response).await)
            }
            Err(e) => Err(e),
        };

        self.session.complete(ticket, &request.query, outcome).await
    }

    async fn resolve(&self, response: RecommendResponse) -> SearchResults {
        let cards = resolve_items(
            response.items,
            &self.delivery,
            self.surface.as_ref(),
            Arc::clone(&self.observer),
        )
        .await;
        SearchResults {
            cards,
            message: response.message,
        }
    }

    pub async fn analytics(&self) -> Result<AnalyticsResponse, ClientError> {
        self.client.analytics().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_is_stamped() {
        let info = build_info();
        assert!(info.starts_with(&format!("v{} [", env!("CARGO_PKG_VERSION"))));
        assert!(!env!("GIT_HASH").is_empty());
        assert!(!env!("BUILD_TIMESTAMP").is_empty());
        assert!(info.ends_with(&format!("({})", env!("BUILD_PROFILE"))));
    }
}

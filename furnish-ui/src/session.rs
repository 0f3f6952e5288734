//! Search session state with a latest-response guard
//!
//! Every submitted query gets a [`RequestTicket`]. Only the response for the
//! most recently issued ticket is accepted, and only once; anything that
//! arrives late for an older query is dropped.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::ClientError;
use crate::results::{ResultCard, SearchResults};

/// Identifies one submitted search
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What the results area currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SearchView {
    Idle,
    Loading {
        query: String,
    },
    Results {
        query: String,
        cards: Vec<ResultCard>,
    },
    /// Successful request with no items
    Empty {
        query: String,
        message: Option<String>,
    },
    /// Request failed; the user may retry
    Failed {
        query: String,
        message: String,
    },
}

/// Shared search session
#[derive(Debug, Clone)]
pub struct SearchSession {
    inner: Arc<RwLock<SessionInner>>,
}

#[derive(Debug)]
struct SessionInner {
    issued: u64,
    accepted: Option<u64>,
    view: SearchView,
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                issued: 0,
                accepted: None,
                view: SearchView::Idle,
            })),
        }
    }

    /// Register a new search, superseding any still in flight
    pub async fn begin(&self, query: &str) -> RequestTicket {
        let mut inner = self.inner.write().await;
        inner.issued += 1;
        inner.view = SearchView::Loading {
            query: query.to_string(),
        };
        tracing::debug!(ticket = inner.issued, query, "Search started");
        RequestTicket(inner.issued)
    }

    /// Whether `ticket` is still the latest search
    pub async fn is_current(&self, ticket: RequestTicket) -> bool {
        self.inner.read().await.issued == ticket.0
    }

    /// Offer the outcome of a search
    ///
    /// Returns the new view if the outcome was accepted, or `None` if the
    /// ticket was superseded or already completed.
    pub async fn complete(
        &self,
        ticket: RequestTicket,
        query: &str,
        outcome: Result<SearchResults, ClientError>,
    ) -> Option<SearchView> {
        let mut inner = self.inner.write().await;

        if inner.issued != ticket.0 {
            tracing::debug!(
                ticket = ticket.0,
                latest = inner.issued,
                query,
                "Dropping stale search response"
            );
            return None;
        }
        if inner.accepted == Some(ticket.0) {
            tracing::warn!(ticket = ticket.0, "Search response already accepted");
            return None;
        }

        let query = query.to_string();
        let view = match outcome {
            Ok(results) if results.cards.is_empty() => SearchView::Empty {
                query,
                message: results.message,
            },
            Ok(results) => SearchView::Results {
                query,
                cards: results.cards,
            },
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Search failed");
                SearchView::Failed {
                    query,
                    message: e.user_message().to_string(),
                }
            }
        };

        inner.accepted = Some(ticket.0);
        inner.view = view.clone();
        Some(view)
    }

    pub async fn view(&self) -> SearchView {
        self.inner.read().await.view.clone()
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

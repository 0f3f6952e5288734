//! Render surfaces: where candidate image sources are actually loaded
//!
//! The state machine in `furnish_common::image` decides what to try; a
//! [`RenderSurface`] reports whether it loaded. [`resolve_with`] is the thin
//! adapter between the two.

use async_trait::async_trait;
use furnish_common::image::{ImageResolution, Strategy, Transition};
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("FurnishFindr/", env!("CARGO_PKG_VERSION"));

/// Outcome of one load attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

/// Display element that attempts to load a source
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn load(&self, url: &str) -> LoadOutcome;
}

/// Surface that fetches each candidate over HTTP
///
/// A load succeeds on a 2xx response whose content type is an image and whose
/// body is non-empty. The client timeout is the only bound on a pending load.
#[derive(Debug, Clone)]
pub struct HttpProbeSurface {
    http_client: reqwest::Client,
}

impl HttpProbeSurface {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl RenderSurface for HttpProbeSurface {
    async fn load(&self, url: &str) -> LoadOutcome {
        let response = match self.http_client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return LoadOutcome::Failed(format!("request failed: {}", e)),
        };

        if !response.status().is_success() {
            return LoadOutcome::Failed(format!("status {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.starts_with("image/") {
            return LoadOutcome::Failed(format!("not an image: {:?}", content_type));
        }

        match response.bytes().await {
            Ok(bytes) if bytes.is_empty() => LoadOutcome::Failed("empty body".to_string()),
            Ok(_) => LoadOutcome::Loaded,
            Err(e) => LoadOutcome::Failed(format!("body read failed: {}", e)),
        }
    }
}

/// Surface that accepts every source without fetching it
///
/// Used with `--no-probe`: items resolve to their first candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptingSurface;

#[async_trait]
impl RenderSurface for AcceptingSurface {
    async fn load(&self, _url: &str) -> LoadOutcome {
        LoadOutcome::Loaded
    }
}

/// Final displayed image for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    /// Source being displayed
    pub source: String,
    pub strategy: Strategy,
    /// Load failures seen before settling on `source`
    pub failures: usize,
    /// Normalized original URL, if one could be extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_url: Option<String>,
}

/// Drive `resolution` against `surface` until a source loads or it settles
///
/// The placeholder is never loaded: it is always displayable.
pub async fn resolve_with(
    resolution: &mut ImageResolution,
    surface: &dyn RenderSurface,
) -> ResolvedImage {
    while !resolution.is_settled() {
        match surface.load(resolution.current_source()).await {
            LoadOutcome::Loaded => break,
            LoadOutcome::Failed(reason) => {
                tracing::debug!(
                    item = resolution.label(),
                    strategy = %resolution.current_strategy(),
                    reason = %reason,
                    "Image load failed"
                );
                match resolution.on_load_failure() {
                    Transition::Retry(_) => continue,
                    Transition::Settled | Transition::Ignored => break,
                }
            }
        }
    }

    ResolvedImage {
        source: resolution.current_source().to_string(),
        strategy: resolution.current_strategy(),
        failures: resolution.failure_count(),
        direct_url: resolution.normalized().map(|u| u.as_str().to_string()),
    }
}

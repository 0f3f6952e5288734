//! Test helpers shared by furnish-ui integration tests
//!
//! Mock backends and image hosts are plain axum routers bound to an
//! ephemeral localhost port.

#![allow(dead_code)]

use axum::Router;
use furnish_common::image::{DeliveryConfig, NoopObserver};
use furnish_ui::client::BackendClient;
use furnish_ui::surface::RenderSurface;
use furnish_ui::App;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Serve `router` on 127.0.0.1 and return its base URL (no trailing slash)
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing is listening on
pub async fn unreachable_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{}", addr)
}

pub fn client(base: &str) -> BackendClient {
    BackendClient::new(base, Duration::from_secs(5)).expect("create backend client")
}

/// Delivery config routed at a mock image host
///
/// The proxy lives at `{base}{proxy_path}` with no extra parameters, and the
/// placeholder at `{base}/placeholder.png`.
pub fn delivery_for(base: &str, proxy_path: &str) -> DeliveryConfig {
    DeliveryConfig {
        proxy_base: Url::parse(&format!("{}{}", base, proxy_path)).expect("proxy base"),
        proxy_param: "url".to_string(),
        proxy_extra_params: BTreeMap::new(),
        placeholder_url: Url::parse(&format!("{}/placeholder.png", base)).expect("placeholder"),
    }
}

pub fn app(
    backend: &str,
    surface: Arc<dyn RenderSurface>,
    delivery: DeliveryConfig,
) -> App {
    App::new(client(backend), surface, delivery, Arc::new(NoopObserver), 8)
}

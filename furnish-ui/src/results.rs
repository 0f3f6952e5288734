//! Search results with resolved images

use furnish_common::api::ItemRecord;
use furnish_common::image::{DeliveryConfig, ImageResolution, ResolutionObserver};
use serde::Serialize;
use std::sync::Arc;

use crate::surface::{resolve_with, RenderSurface, ResolvedImage};

/// One rendered result: the backend record and its settled image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCard {
    pub item: ItemRecord,
    pub image: ResolvedImage,
}

/// Items of one successful search, ready to render
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResults {
    pub cards: Vec<ResultCard>,
    /// Backend hint accompanying an empty result set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Resolve the image of every item concurrently
///
/// Each item gets its own state machine; order of `items` is preserved.
pub async fn resolve_items(
    items: Vec<ItemRecord>,
    delivery: &DeliveryConfig,
    surface: &dyn RenderSurface,
    observer: Arc<dyn ResolutionObserver>,
) -> Vec<ResultCard> {
    let tasks = items.into_iter().map(|item| {
        let observer = Arc::clone(&observer);
        async move {
            let mut resolution = ImageResolution::with_observer(
                item.uniq_id.as_str(),
                item.image.as_deref(),
                delivery,
                observer,
            );
            let image = resolve_with(&mut resolution, surface).await;
            ResultCard { item, image }
        }
    });

    futures::future::join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::AcceptingSurface;
    use furnish_common::image::{NoopObserver, Strategy};
    use serde_json::json;

    fn item(id: &str, image: Option<&str>) -> ItemRecord {
        serde_json::from_value(json!({"uniq_id": id, "title": id, "image": image})).unwrap()
    }

    #[tokio::test]
    async fn test_every_item_ends_with_an_image() {
        let items = vec![
            item("a", Some("//a.com/1.jpg")),
            item("b", None),
            item("c", Some("garbage")),
            item("d", Some("b.com/2.jpg")),
        ];

        let cards = resolve_items(
            items,
            &DeliveryConfig::default(),
            &AcceptingSurface,
            Arc::new(NoopObserver),
        )
        .await;

        let summary: Vec<(&str, Strategy)> = cards
            .iter()
            .map(|c| (c.item.uniq_id.as_str(), c.image.strategy))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", Strategy::Proxied),
                ("b", Strategy::Placeholder),
                ("c", Strategy::Placeholder),
                ("d", Strategy::Proxied),
            ]
        );
        assert!(cards.iter().all(|c| !c.image.source.is_empty()));
    }
}

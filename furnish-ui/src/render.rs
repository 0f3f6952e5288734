//! Terminal rendering of search results and analytics

use furnish_common::api::{AnalyticsResponse, CountEntry};
use furnish_common::image::Strategy;
use std::fmt::Write;

use crate::results::ResultCard;
use crate::session::SearchView;

const EMPTY_HINT: &str = "Try: \"round glass side table under ₹9000\"";

/// How views are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Render a search view in the requested format
pub fn render_search(view: &SearchView, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_view(view),
        OutputFormat::Json => to_json(view),
    }
}

/// Pretty JSON followed by a newline
pub fn to_json<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => format!("{}\n", json),
        Err(e) => format!("{{\"error\": \"serialization failed: {}\"}}\n", e),
    }
}

/// Render the results area for `view`
pub fn render_view(view: &SearchView) -> String {
    match view {
        SearchView::Idle => format!("{}\n", EMPTY_HINT),
        SearchView::Loading { query } => format!("Searching for \"{}\"…\n", query),
        SearchView::Results { query, cards } => {
            let mut out = format!("{} result(s) for \"{}\"\n\n", cards.len(), query);
            for (rank, card) in cards.iter().enumerate() {
                render_card(&mut out, rank + 1, card);
            }
            out
        }
        SearchView::Empty { query, message } => {
            let message = message
                .as_deref()
                .unwrap_or("No matching furniture found.");
            format!("No results for \"{}\". {}\n{}\n", query, message, EMPTY_HINT)
        }
        SearchView::Failed { query, message } => {
            format!("Search for \"{}\" failed: {}\n", query, message)
        }
    }
}

fn render_card(out: &mut String, rank: usize, card: &ResultCard) {
    let item = &card.item;
    let title = match item.title.trim() {
        "" => "Untitled item",
        title => title,
    };
    let _ = writeln!(out, "{:>2}. {}", rank, title);
    let _ = writeln!(
        out,
        "    {} · {} · {}",
        item.brand.as_deref().unwrap_or("—"),
        item.category.as_deref().unwrap_or("Uncategorized"),
        item.price_label()
    );
    if let Some(blurb) = item.blurb.as_deref().filter(|b| !b.trim().is_empty()) {
        let _ = writeln!(out, "    {}", blurb.trim());
    }

    let image = &card.image;
    let tag = match image.strategy {
        Strategy::Placeholder => "no image".to_string(),
        strategy if image.failures > 0 => format!("{}, after {} failed", strategy, image.failures),
        strategy => strategy.to_string(),
    };
    let _ = writeln!(out, "    image: {} [{}]", image.source, tag);
    let _ = writeln!(out);
}

/// Render the analytics view, listing at most `top` entries per breakdown
pub fn render_analytics(analytics: &AnalyticsResponse, top: usize) -> String {
    let mut out = String::from("Dataset Analytics\n\n");
    let _ = writeln!(out, "Total products: {}", analytics.total_products);

    render_counts(&mut out, "Brands", &analytics.brand_counts, top);
    if let Some(counts) = &analytics.category_counts {
        render_counts(&mut out, "Categories", counts, top);
    }
    if let Some(counts) = &analytics.material_counts {
        render_counts(&mut out, "Materials", counts, top);
    }
    out
}

fn render_counts(out: &mut String, heading: &str, counts: &[CountEntry], top: usize) {
    let _ = writeln!(out, "\n{} ({})", heading, counts.len());
    if counts.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }

    let width = counts
        .iter()
        .take(top)
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, count) in counts.iter().take(top) {
        let _ = writeln!(out, "  {:<width$}  {:>6}", name, count, width = width);
    }
    if counts.len() > top {
        let _ = writeln!(out, "  … {} more", counts.len() - top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ResolvedImage;
    use serde_json::json;

    fn card(image: ResolvedImage) -> ResultCard {
        ResultCard {
            item: serde_json::from_value(json!({
                "uniq_id": "1",
                "title": "Oak Coffee Table",
                "brand": "Woodly",
                "price": 8999.0,
                "blurb": "  Solid oak.  "
            }))
            .unwrap(),
            image,
        }
    }

    #[test]
    fn test_render_results() {
        let view = SearchView::Results {
            query: "oak table".to_string(),
            cards: vec![card(ResolvedImage {
                source: "https://a.com/x.jpg".to_string(),
                strategy: Strategy::Direct,
                failures: 1,
                direct_url: Some("https://a.com/x.jpg".to_string()),
            })],
        };

        let text = render_view(&view);
        assert!(text.starts_with("1 result(s) for \"oak table\""));
        assert!(text.contains(" 1. Oak Coffee Table"));
        assert!(text.contains("Woodly · Uncategorized · ₹8999"));
        assert!(text.contains("    Solid oak.\n"));
        assert!(text.contains("image: https://a.com/x.jpg [direct, after 1 failed]"));
    }

    #[test]
    fn test_render_placeholder_card() {
        let view = SearchView::Results {
            query: "q".to_string(),
            cards: vec![card(ResolvedImage {
                source: "https://placehold.co/320x240?text=No+Image".to_string(),
                strategy: Strategy::Placeholder,
                failures: 2,
                direct_url: None,
            })],
        };
        assert!(render_view(&view).contains("[no image]"));
    }

    #[test]
    fn test_render_untitled_item() {
        let mut untitled = card(ResolvedImage {
            source: "https://placehold.co/320x240?text=No+Image".to_string(),
            strategy: Strategy::Placeholder,
            failures: 0,
            direct_url: None,
        });
        untitled.item.title = String::new();
        let view = SearchView::Results {
            query: "q".to_string(),
            cards: vec![untitled],
        };
        assert!(render_view(&view).contains(" 1. Untitled item\n"));
    }

    #[test]
    fn test_render_empty_and_failed_differ() {
        let empty = render_view(&SearchView::Empty {
            query: "q".to_string(),
            message: None,
        });
        let failed = render_view(&SearchView::Failed {
            query: "q".to_string(),
            message: "Server error. Try again.".to_string(),
        });
        assert!(empty.contains("No results"));
        assert!(failed.contains("failed: Server error. Try again."));
        assert_ne!(empty, failed);
    }

    #[test]
    fn test_render_search_json_is_tagged() {
        let text = render_search(
            &SearchView::Empty {
                query: "q".to_string(),
                message: None,
            },
            OutputFormat::Json,
        );
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["state"], "empty");
        assert_eq!(value["query"], "q");
    }

    #[test]
    fn test_render_analytics_truncates() {
        let analytics: AnalyticsResponse = serde_json::from_value(json!({
            "total_products": 10,
            "brand_counts": [["A", 5], ["Bb", 3], ["C", 2]],
            "category_counts": []
        }))
        .unwrap();

        let text = render_analytics(&analytics, 2);
        assert!(text.contains("Total products: 10"));
        assert!(text.contains("Brands (3)"));
        assert!(text.contains("  A        5"));
        assert!(text.contains("… 1 more"));
        assert!(text.contains("Categories (0)\n  (none)"));
        assert!(!text.contains("Materials"));
    }
}

//! Delivery strategies and candidate construction
//!
//! A normalized URL can be fetched two ways: through the configured image
//! proxy (which fixes mixed content and hot-link blocking) or directly. The
//! placeholder is the last resort and is always displayable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use super::normalize::NormalizedUrl;

const DEFAULT_PROXY_BASE: &str = "https://wsrv.nl/";
const DEFAULT_PROXY_PARAM: &str = "url";
const DEFAULT_PLACEHOLDER_URL: &str = "https://placehold.co/320x240?text=No+Image";

/// How a candidate obtains the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Proxied,
    Direct,
    Placeholder,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Strategy::Proxied => "proxied",
            Strategy::Direct => "direct",
            Strategy::Placeholder => "placeholder",
        })
    }
}

/// One fetchable URL tagged with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCandidate {
    pub strategy: Strategy,
    pub url: String,
}

/// Image delivery endpoint configuration
///
/// This is the only knob on strategy ordering: which proxy to route through
/// and what to show when nothing loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Proxy base URL; the stripped image URL is appended as a query parameter
    #[serde(default = "default_proxy_base")]
    pub proxy_base: Url,

    /// Query parameter name carrying the scheme-stripped image URL
    #[serde(default = "default_proxy_param")]
    pub proxy_param: String,

    /// Image shown once every other candidate has failed
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: Url,

    /// Additional fixed query parameters forwarded to the proxy (resize, format)
    #[serde(default = "default_proxy_extra_params")]
    pub proxy_extra_params: BTreeMap<String, String>,
}

fn default_proxy_base() -> Url {
    Url::parse(DEFAULT_PROXY_BASE).expect("default proxy base is a valid URL")
}

fn default_proxy_param() -> String {
    DEFAULT_PROXY_PARAM.to_string()
}

fn default_proxy_extra_params() -> BTreeMap<String, String> {
    [("w", "320"), ("h", "240"), ("fit", "cover"), ("output", "webp")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_placeholder_url() -> Url {
    Url::parse(DEFAULT_PLACEHOLDER_URL).expect("default placeholder is a valid URL")
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            proxy_base: default_proxy_base(),
            proxy_param: default_proxy_param(),
            placeholder_url: default_placeholder_url(),
            proxy_extra_params: default_proxy_extra_params(),
        }
    }
}

impl DeliveryConfig {
    /// Rewrite `url` through the proxy endpoint
    pub fn proxied(&self, url: &NormalizedUrl) -> String {
        let mut proxied = self.proxy_base.clone();
        {
            let mut pairs = proxied.query_pairs_mut();
            pairs.append_pair(&self.proxy_param, url.without_scheme());
            for (key, value) in &self.proxy_extra_params {
                pairs.append_pair(key, value);
            }
        }
        proxied.into()
    }

    pub fn placeholder(&self) -> DeliveryCandidate {
        DeliveryCandidate {
            strategy: Strategy::Placeholder,
            url: self.placeholder_url.to_string(),
        }
    }

    /// Ordered candidate sequence for one item
    ///
    /// `[proxied, direct, placeholder]` when a URL was extracted, otherwise
    /// just `[placeholder]`.
    pub fn candidates(&self, url: Option<&NormalizedUrl>) -> Vec<DeliveryCandidate> {
        match url {
            Some(url) => vec![
                DeliveryCandidate {
                    strategy: Strategy::Proxied,
                    url: self.proxied(url),
                },
                DeliveryCandidate {
                    strategy: Strategy::Direct,
                    url: url.as_str().to_string(),
                },
                self.placeholder(),
            ],
            None => vec![self.placeholder()],
        }
    }
}

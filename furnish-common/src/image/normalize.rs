//! Image reference normalization
//!
//! Backend records carry an `image` field of unconstrained shape: a single URL,
//! a protocol-relative URL, a comma-joined or list-literal string of several
//! URLs, a bare `host/path`, or garbage. [`normalize`] extracts at most one
//! absolute `http(s)://` URL from it. It is a pure function: no network access,
//! no panics, and re-feeding its output yields the same output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// First `http://` or `https://` URL embedded anywhere in the input
static EMBEDDED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^\s,"'\]\)\}]+"#).expect("embedded URL pattern is valid")
});

/// Leading `host.tld/path` with no scheme
static BARE_HOST_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+/[^\s,"'\]\)\}]+"#)
        .expect("bare host pattern is valid")
});

/// Absolute, scheme-qualified image URL
///
/// Always starts with `http://` or `https://` and never contains whitespace,
/// quotes or commas. Only [`normalize`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL with its `http://` / `https://` prefix removed
    ///
    /// This is the form the image proxy expects as its query parameter.
    pub fn without_scheme(&self) -> &str {
        self.0
            .strip_prefix("https://")
            .or_else(|| self.0.strip_prefix("http://"))
            .unwrap_or(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract a canonical absolute URL from an untrusted image reference
///
/// Rules, first match wins:
/// 1. missing, empty or whitespace-only -> `None`
/// 2. protocol-relative `//host/...` -> `https:` prefix
/// 3. already `http(s)://...` -> returned as-is
/// 4. `http(s)://` embedded anywhere (list literals, comma-joined) -> first one
/// 5. bare `host.tld/path` -> `https://` prefix
/// 6. anything else -> `None`
///
/// Results are cut at the first whitespace, comma, quote or closing bracket.
pub fn normalize(raw: Option<&str>) -> Option<NormalizedUrl> {
    let s = strip_wrapping(raw?);
    if s.is_empty() {
        return None;
    }

    // A leading scheme with nothing usable after it falls through to the
    // embedded search, e.g. `https://,https://a.com/x.jpg`
    if let Some(url) = s.strip_prefix("//").and_then(|rest| finish("https://", rest)) {
        return Some(url);
    }

    if let Some(url) = split_scheme(s).and_then(|(scheme, rest)| finish(scheme, rest)) {
        return Some(url);
    }

    if let Some(m) = EMBEDDED_URL.find(s) {
        let (scheme, rest) = split_scheme(m.as_str())?;
        return finish(scheme, rest);
    }

    if let Some(m) = BARE_HOST_PATH.find(s) {
        return finish("https://", m.as_str());
    }

    None
}

/// Trim whitespace plus list-literal and quote wrapping from both ends
///
/// Only opening characters are stripped from the front and only closing ones
/// from the back, so a normalized URL passes through unchanged.
fn strip_wrapping(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches(|c: char| matches!(c, '[' | '(' | '"' | '\'') || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, ']' | ')' | '"' | '\'') || c.is_whitespace())
}

/// Split a leading case-insensitive `http://` / `https://` off `s`
///
/// The returned scheme is always lowercase.
fn split_scheme(s: &str) -> Option<(&'static str, &str)> {
    let lower_prefix = |n: usize| s.get(..n).map(|p| p.to_ascii_lowercase());
    if lower_prefix(8).as_deref() == Some("https://") {
        return Some(("https://", &s[8..]));
    }
    if lower_prefix(7).as_deref() == Some("http://") {
        return Some(("http://", &s[7..]));
    }
    None
}

fn is_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '"' | '\'' | ']' | ')' | '}')
}

fn finish(scheme: &str, rest: &str) -> Option<NormalizedUrl> {
    let end = rest.find(is_terminator).unwrap_or(rest.len());
    let rest = &rest[..end];
    if rest.is_empty() {
        return None;
    }
    Some(NormalizedUrl(format!("{}{}", scheme, rest)))
}

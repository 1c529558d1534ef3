//! Subject modes and resource signatures
//!
//! Pages whose sanitized DOM falls below the small-DOM threshold carry no
//! discriminative tag structure, but their resource-loading fingerprint
//! (scripts, styles, images, iframes, media) is often distinctive. For
//! those pages the subject fed to the decision engine is a normalized
//! resource-URL signature instead of the tag stream. The substitution is
//! transparent to the engine: it sees bytes plus a mode tag.
//!
//! URL extraction from HTML belongs to the external sanitizer/renderer;
//! this module only normalizes and assembles an already-extracted list.

use serde::{Deserialize, Serialize};

/// Which representation produced the subject byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectMode {
    #[serde(rename = "dom-structure")]
    DomStructure,
    #[serde(rename = "resource-signature")]
    ResourceSignature,
}

/// Sanitization modes of the external DOM transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
    TagsOnly,
    TagsAttrs,
}

/// Pick the subject mode for a sanitized DOM of `dom_len` bytes.
pub fn select_mode(dom_len: usize, small_dom_threshold: usize) -> SubjectMode {
    if dom_len < small_dom_threshold {
        SubjectMode::ResourceSignature
    } else {
        SubjectMode::DomStructure
    }
}

/// Build the resource-signature byte sequence from extracted resource
/// URLs: normalize, drop empties, dedupe, sort, space-join.
pub fn build_resource_signature<S: AsRef<str>>(urls: &[S], base_url: &str) -> Vec<u8> {
    let mut resources: Vec<String> = urls
        .iter()
        .map(|u| normalize_resource_url(u.as_ref(), base_url))
        .filter(|u| !u.is_empty())
        .collect();
    resources.sort();
    resources.dedup();

    let signature = resources.join(" ");
    log::debug!(
        "Resource signature: {} resources, {} bytes",
        resources.len(),
        signature.len()
    );
    signature.into_bytes()
}

/// Normalize one resource URL for structural comparison.
///
/// Query strings and fragments are dropped, data:/blob: URIs vanish, the
/// scheme and a leading `www.` are stripped so CDN scheme variations
/// collapse, and relative paths resolve against `base_url`'s host.
pub fn normalize_resource_url(url: &str, base_url: &str) -> String {
    if url.is_empty() || url.starts_with("data:") || url.starts_with("blob:") {
        return String::new();
    }

    let url = url.split(['?', '#']).next().unwrap_or("");
    if url.is_empty() {
        return String::new();
    }

    // Protocol-relative: //cdn.example.com/app.js
    if let Some(rest) = url.strip_prefix("//") {
        return strip_www(rest).to_string();
    }

    // Absolute with scheme.
    if let Some(idx) = url.find("://") {
        return strip_www(&url[idx + 3..]).to_string();
    }

    // Relative: resolve against the base host when one is known.
    let base_host = host_of(base_url);
    if base_host.is_empty() {
        return url.to_string();
    }
    if url.starts_with('/') {
        format!("{}{}", base_host, url)
    } else {
        format!("{}/{}", base_host, url)
    }
}

fn strip_www(host_and_path: &str) -> &str {
    host_and_path
        .strip_prefix("www.")
        .unwrap_or(host_and_path)
}

fn host_of(url: &str) -> String {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    strip_www(host).to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        assert_eq!(select_mode(100, 2000), SubjectMode::ResourceSignature);
        assert_eq!(select_mode(2000, 2000), SubjectMode::DomStructure);
        assert_eq!(select_mode(5000, 2000), SubjectMode::DomStructure);
    }

    #[test]
    fn test_normalize_strips_scheme_query_and_www() {
        assert_eq!(
            normalize_resource_url("https://www.example.com/app.js?v=3#frag", ""),
            "example.com/app.js"
        );
        assert_eq!(
            normalize_resource_url("//cdn.example.com/lib.css", ""),
            "cdn.example.com/lib.css"
        );
    }

    #[test]
    fn test_normalize_drops_data_and_blob() {
        assert_eq!(normalize_resource_url("data:image/png;base64,AAAA", ""), "");
        assert_eq!(normalize_resource_url("blob:https://x/y", ""), "");
    }

    #[test]
    fn test_normalize_resolves_relative_against_base() {
        assert_eq!(
            normalize_resource_url("/static/app.js", "https://www.shop.example/checkout"),
            "shop.example/static/app.js"
        );
        assert_eq!(
            normalize_resource_url("img/logo.png", "https://shop.example"),
            "shop.example/img/logo.png"
        );
    }

    #[test]
    fn test_signature_is_sorted_and_deduplicated() {
        let urls = [
            "https://b.example/late.js",
            "https://a.example/early.js",
            "https://b.example/late.js?cachebust=1",
            "data:image/gif;base64,AA",
        ];
        let sig = build_resource_signature(&urls, "");
        assert_eq!(
            String::from_utf8(sig).unwrap(),
            "a.example/early.js b.example/late.js"
        );
    }
}

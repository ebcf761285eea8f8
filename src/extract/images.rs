//! Image URL normalization and optimization.
//!
//! Listing pages mix content photos with icons, badges, and tracking pixels.
//! The normalizer drops decorative assets, deduplicates, caps the list, and
//! rewrites known CDN URLs to bounded renditions so the analysis stage never
//! downloads full-resolution photos.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum images kept per listing.
pub const MAX_IMAGES: usize = 20;

/// Substrings that mark decorative assets rather than property photos.
const DECORATIVE_SIGNALS: &[&str] = &[
    "icon", "logo", "badge", "flag", "button", "arrow", "profile", "avatar", "sprite",
    "placeholder", "spacer", "pixel", "banner-ad",
];

/// Fixed pixel sizes that only ever belong to UI chrome.
const TINY_SIZES: &[&str] = &["1x1", "16x16", "32x32", "50x50", "64x64"];

/// CDN hosts that only serve listing photos; always accepted.
const CONTENT_CDNS: &[&str] = &[
    "ssl.cdn-redfin.com",
    "cdn.realtor.ca",
    "zealty.ca/images",
    "photos.zillowstatic.com",
];

/// How a matching CDN URL is rewritten to a bounded rendition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RewriteKind {
    /// Replace one path segment with another (`/genHiRes.` -> `/genMid.`).
    PathSegment { from: String, to: String },
    /// Replace the whole query string with a fixed size query.
    ReplaceQuery { query: String },
    /// Append a size query unless a width parameter is already present.
    AppendQuery { query: String },
}

/// Per-CDN rewrite rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CdnRule {
    /// Substring of the URL that selects this rule.
    pub host_contains: String,
    pub rewrite: RewriteKind,
}

/// Built-in rules for the CDNs the extractor knows about.
pub fn default_cdn_rules() -> Vec<CdnRule> {
    vec![
        CdnRule {
            host_contains: "ssl.cdn-redfin.com".to_string(),
            rewrite: RewriteKind::PathSegment {
                from: "/genHiRes.".to_string(),
                to: "/genMid.".to_string(),
            },
        },
        CdnRule {
            host_contains: "cdn.realtor.ca".to_string(),
            rewrite: RewriteKind::ReplaceQuery {
                query: "w=512&h=384&fit=crop&quality=80".to_string(),
            },
        },
        CdnRule {
            host_contains: "zealty.ca".to_string(),
            rewrite: RewriteKind::AppendQuery {
                query: "w=512&h=384".to_string(),
            },
        },
    ]
}

/// Whether a URL points at a decorative asset rather than a property photo.
/// Content-CDN URLs are never decorative.
pub fn is_decorative(url: &str) -> bool {
    let lower = url.to_lowercase();
    if CONTENT_CDNS.iter().any(|cdn| lower.contains(cdn)) {
        return false;
    }
    if lower.starts_with("data:") {
        return true;
    }
    let path = lower.split('?').next().unwrap_or(&lower);
    if path.ends_with(".svg") || path.ends_with(".gif") {
        return true;
    }
    if DECORATIVE_SIGNALS.iter().any(|s| lower.contains(s)) {
        return true;
    }
    TINY_SIZES.iter().any(|s| lower.contains(s))
}

/// Rewrite one URL to a bounded rendition. Unknown domains pass through; a
/// rule that cannot apply cleanly falls back to the original URL.
pub fn optimize_url(url: &str, rules: &[CdnRule]) -> String {
    for rule in rules {
        if !url.contains(&rule.host_contains) {
            continue;
        }
        match &rule.rewrite {
            RewriteKind::PathSegment { from, to } => {
                if url.contains(from.as_str()) {
                    return url.replace(from.as_str(), to.as_str());
                }
                return url.to_string();
            }
            RewriteKind::ReplaceQuery { query } => {
                let base = url.split('?').next().unwrap_or(url);
                return format!("{base}?{query}");
            }
            RewriteKind::AppendQuery { query } => {
                if url.contains('?') {
                    let has_width =
                        ["w=", "width=", "size="].iter().any(|p| url.contains(p));
                    if has_width {
                        return url.to_string();
                    }
                    return format!("{url}&{query}");
                }
                return format!("{url}?{query}");
            }
        }
    }
    url.to_string()
}

/// Filter, dedup, cap, and optimize candidates. First seen wins; dedup runs
/// on the source URL and again on the rewritten URL, since distinct source
/// renditions can collapse to the same bounded one.
pub fn normalize(candidates: Vec<String>, rules: &[CdnRule]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut kept: Vec<String> = Vec::new();
    for url in candidates {
        let url = url.trim().to_string();
        if url.is_empty() || is_decorative(&url) {
            continue;
        }
        if seen.contains(&url) {
            continue;
        }
        seen.push(url.clone());
        let optimized = optimize_url(&url, rules);
        if kept.contains(&optimized) {
            continue;
        }
        kept.push(optimized);
        if kept.len() >= MAX_IMAGES {
            debug!(cap = MAX_IMAGES, "image list capped");
            break;
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorative_signals_rejected() {
        assert!(is_decorative("https://example.com/assets/logo.png"));
        assert!(is_decorative("https://example.com/icons/arrow-left.png"));
        assert!(is_decorative("data:image/png;base64,AAAA"));
        assert!(is_decorative("https://example.com/img/map.svg"));
        assert!(is_decorative("https://example.com/t/1x1.png"));
        assert!(!is_decorative("https://example.com/photos/kitchen-01.jpg"));
    }

    #[test]
    fn test_content_cdn_overrides_signals() {
        // "logo" substring would normally reject, but the CDN is trusted.
        assert!(!is_decorative(
            "https://cdn.realtor.ca/listings/logo-building/1.jpg"
        ));
    }

    #[test]
    fn test_redfin_hires_downgraded() {
        let rules = default_cdn_rules();
        assert_eq!(
            optimize_url("https://ssl.cdn-redfin.com/photo/123/genHiRes.4567_8.jpg", &rules),
            "https://ssl.cdn-redfin.com/photo/123/genMid.4567_8.jpg"
        );
        // Already medium: untouched.
        assert_eq!(
            optimize_url("https://ssl.cdn-redfin.com/photo/123/genMid.4567_8.jpg", &rules),
            "https://ssl.cdn-redfin.com/photo/123/genMid.4567_8.jpg"
        );
    }

    #[test]
    fn test_realtor_ca_query_replaced() {
        let rules = default_cdn_rules();
        assert_eq!(
            optimize_url(
                "https://cdn.realtor.ca/listings/TS123/reas/1/large.jpg?w=1024&h=768&fit=crop",
                &rules
            ),
            "https://cdn.realtor.ca/listings/TS123/reas/1/large.jpg?w=512&h=384&fit=crop&quality=80"
        );
        assert_eq!(
            optimize_url("https://cdn.realtor.ca/listings/TS123/reas/1/large.jpg", &rules),
            "https://cdn.realtor.ca/listings/TS123/reas/1/large.jpg?w=512&h=384&fit=crop&quality=80"
        );
    }

    #[test]
    fn test_zealty_append_respects_existing_width() {
        let rules = default_cdn_rules();
        assert_eq!(
            optimize_url("https://zealty.ca/images/property/123/photo1.jpg", &rules),
            "https://zealty.ca/images/property/123/photo1.jpg?w=512&h=384"
        );
        assert_eq!(
            optimize_url(
                "https://zealty.ca/images/property/123/photo1.jpg?existing=param",
                &rules
            ),
            "https://zealty.ca/images/property/123/photo1.jpg?existing=param&w=512&h=384"
        );
        assert_eq!(
            optimize_url(
                "https://zealty.ca/images/property/123/photo1.jpg?w=256",
                &rules
            ),
            "https://zealty.ca/images/property/123/photo1.jpg?w=256"
        );
    }

    #[test]
    fn test_rewrite_collisions_deduped() {
        // Two source renditions of the same photo collapse to one bounded URL.
        let rules = default_cdn_rules();
        let out = normalize(
            vec![
                "https://cdn.realtor.ca/listings/TS1/reas/1/large.jpg?w=1024&h=768".to_string(),
                "https://cdn.realtor.ca/listings/TS1/reas/1/large.jpg?w=640".to_string(),
            ],
            &rules,
        );
        assert_eq!(
            out,
            vec![
                "https://cdn.realtor.ca/listings/TS1/reas/1/large.jpg?w=512&h=384&fit=crop&quality=80"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_unknown_domain_passes_through() {
        let rules = default_cdn_rules();
        assert_eq!(
            optimize_url("https://example.com/property/photo.jpg", &rules),
            "https://example.com/property/photo.jpg"
        );
    }

    #[test]
    fn test_normalize_dedups_preserves_order_and_caps() {
        let rules = default_cdn_rules();
        let mut candidates: Vec<String> = (0..30)
            .map(|i| format!("https://example.com/photos/{i}.jpg"))
            .collect();
        candidates.insert(3, "https://example.com/photos/0.jpg".to_string());
        candidates.insert(5, "https://example.com/assets/logo.png".to_string());

        let out = normalize(candidates, &rules);
        assert_eq!(out.len(), MAX_IMAGES);
        assert_eq!(out[0], "https://example.com/photos/0.jpg");
        // No duplicates survived.
        let mut sorted = out.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), out.len());
        // First-seen order preserved.
        assert_eq!(out[1], "https://example.com/photos/1.jpg");
    }
}

//! Challenge-page detection.
//!
//! A blocked fetch usually still returns HTTP 200, so classification relies
//! on response size and known challenge phrases rather than status codes.
//! Phrases are matched against the page's visible text only; asset URLs and
//! script sources name vendors on perfectly legitimate pages.

use scraper::Html;
use serde::Serialize;

/// Anti-automation vendors we can name in remediation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockVendor {
    Incapsula,
    Cloudflare,
    PerimeterX,
    DataDome,
    Akamai,
}

impl BlockVendor {
    pub fn name(self) -> &'static str {
        match self {
            BlockVendor::Incapsula => "Incapsula",
            BlockVendor::Cloudflare => "Cloudflare",
            BlockVendor::PerimeterX => "PerimeterX",
            BlockVendor::DataDome => "DataDome",
            BlockVendor::Akamai => "Akamai",
        }
    }
}

/// Why an attempt was classified as blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Body smaller than the family's minimum plausible listing page.
    SuspiciouslySmall { bytes: usize, minimum: usize },
    /// A known challenge phrase appeared in the body.
    Challenge { vendor: Option<BlockVendor> },
    /// The server refused outright.
    HttpStatus(u16),
}

/// Text a browser would render for this body. Script, style, and attribute
/// content is excluded.
pub fn visible_text(body: &str) -> String {
    let doc = Html::parse_document(body);
    let mut out = String::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node
            .parent()
            .and_then(|p| p.value().as_element())
            .map(|el| el.name() == "script" || el.name() == "style")
            .unwrap_or(false);
        if !skipped {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

/// Scan visible text for configured challenge phrases, case-insensitively.
/// Returns the matched phrase when found.
pub fn find_challenge_phrase<'a>(text: &str, keywords: &'a [String]) -> Option<&'a str> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.as_str())
        .find(|k| haystack.contains(&k.to_lowercase()))
}

/// Attribute a challenge page to a vendor when its visible text names one.
pub fn classify_vendor(text: &str) -> Option<BlockVendor> {
    let haystack = text.to_lowercase();
    if haystack.contains("incapsula") || haystack.contains("imperva") {
        Some(BlockVendor::Incapsula)
    } else if haystack.contains("cloudflare") || haystack.contains("cf-ray") {
        Some(BlockVendor::Cloudflare)
    } else if haystack.contains("perimeterx") || haystack.contains("px-captcha") {
        Some(BlockVendor::PerimeterX)
    } else if haystack.contains("datadome") {
        Some(BlockVendor::DataDome)
    } else if haystack.contains("akamai") || haystack.contains("_abck") {
        Some(BlockVendor::Akamai)
    } else {
        None
    }
}

/// Classify one response. `None` means the page looks like real content.
pub fn classify_response(
    status: u16,
    body: &str,
    min_response_bytes: usize,
    keywords: &[String],
) -> Option<BlockReason> {
    // Challenge phrases win over everything: a 200 with an Incapsula
    // interstitial is a block, and a 403 naming a vendor is more actionable
    // than the bare status.
    let text = visible_text(body);
    if find_challenge_phrase(&text, keywords).is_some() {
        return Some(BlockReason::Challenge {
            vendor: classify_vendor(&text),
        });
    }
    if status == 403 || status == 429 || status == 503 {
        return Some(BlockReason::HttpStatus(status));
    }
    if body.len() < min_response_bytes {
        return Some(BlockReason::SuspiciouslySmall {
            bytes: body.len(),
            minimum: min_response_bytes,
        });
    }
    None
}

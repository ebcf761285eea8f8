//! Embedded-data extraction for zealty.ca.
//!
//! Zealty ships the whole listing record as one tilde-delimited string inside
//! an inline script variable. Positional fields map directly onto property
//! attributes, which is far more stable than scraping the rendered layout.
//! When the record is present this strategy is authoritative and
//! short-circuits every other strategy.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::extract::fields;
use crate::models::ExtractedProperty;

// Record layout observed in zealty listing pages.
const IDX_STREET: usize = 1;
const IDX_CITY: usize = 2;
const IDX_PRICE_THOUSANDS: usize = 6;
const IDX_BEDS: usize = 7;
const IDX_BATHS: usize = 8;
const IDX_SQFT: usize = 9;
const IDX_DESCRIPTION: usize = 24;
const IDX_IMAGES: usize = 27;

/// Minimum record length before we trust positional indexing.
const MIN_FIELDS: usize = 28;

fn record_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // var hJL = "…";  (single or double quoted; the other quote character
        // stays legal inside the string, apostrophes are common in
        // descriptions)
        Regex::new(r#"var\s+hJL\s*=\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#)
            .expect("static regex")
    })
}

/// Locate and decode the embedded record. `None` when the page has no record
/// or the record is too short to index safely.
pub fn extract(body: &str, source_url: &str) -> Option<ExtractedProperty> {
    let captures = record_pattern().captures(body)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();
    let record: Vec<&str> = raw.split('~').collect();
    if record.len() < MIN_FIELDS {
        debug!(
            fields = record.len(),
            "embedded record too short; falling through"
        );
        return None;
    }

    let field = |idx: usize| -> Option<String> {
        record
            .get(idx)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    let address = match (field(IDX_STREET), field(IDX_CITY)) {
        (Some(street), Some(city)) => Some(format!("{street}, {city}")),
        (Some(street), None) => Some(street),
        _ => None,
    };

    // Price is stored in thousands: "450" means $450,000.
    let price = field(IDX_PRICE_THOUSANDS)
        .and_then(|s| s.replace(',', "").parse::<f64>().ok())
        .map(|thousands| thousands * 1000.0)
        .filter(|v| fields::in_price_range(*v));

    let beds = field(IDX_BEDS).and_then(|s| fields::parse_bed_count(&s));
    let baths = field(IDX_BATHS).and_then(|s| fields::parse_bath_count(&s));
    let sqft = field(IDX_SQFT).and_then(|s| fields::parse_area(&s));
    let description = field(IDX_DESCRIPTION).map(|s| clean_description(&s));

    let image_urls: Vec<String> = field(IDX_IMAGES)
        .map(|imgs| {
            imgs.split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ExtractedProperty {
        address,
        price,
        beds,
        baths,
        sqft,
        description,
        image_urls,
        source_url: Some(source_url.to_string()),
        scraped_at: None,
    })
}

fn clean_description(s: &str) -> String {
    s.replace("\\n", " ")
        .replace("\\\"", "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

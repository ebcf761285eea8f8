//! Generic selector-based extraction.
//!
//! Last line of defense for unknown sites, and gap-filler for fields the
//! site-specific strategies left empty. Per field: an ordered candidate list
//! of selectors, most specific first; the first plausible non-empty match
//! wins. If no selector matches, a whole-text regex sweep is the final
//! resort. Every numeric candidate passes through the field parsers, so an
//! out-of-range hit is treated as a non-match and the next candidate runs.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::extract::fields;
use crate::models::ExtractedProperty;

const ADDRESS_SELECTORS: &[&str] = &[
    r#"[data-testid="address"]"#,
    ".property-address",
    ".listing-address",
    "h1.address",
    r#"[itemprop="address"]"#,
    "h1",
];

const PRICE_SELECTORS: &[&str] = &[
    r#"[data-testid="price"]"#,
    ".listing-price",
    ".property-price",
    r#"[itemprop="price"]"#,
    ".price",
];

const BED_SELECTORS: &[&str] = &[
    r#"[data-testid="beds"]"#,
    ".beds",
    ".bed-count",
    ".property-beds",
];

const BATH_SELECTORS: &[&str] = &[
    r#"[data-testid="baths"]"#,
    ".baths",
    ".bath-count",
    ".property-baths",
];

const SQFT_SELECTORS: &[&str] = &[
    r#"[data-testid="sqft"]"#,
    ".sqft",
    ".square-feet",
    ".property-size",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"[data-testid="description"]"#,
    ".listing-description",
    ".property-description",
    r#"[itemprop="description"]"#,
    "#description",
];

const IMAGE_CONTAINER_SELECTORS: &[&str] = &[".gallery img", ".photos img", ".carousel img"];

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty text among the selector candidates that `accept` keeps.
fn first_match<T>(
    doc: &Html,
    selectors: &[&str],
    accept: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for el in doc.select(&selector) {
            let text = element_text(el);
            if text.is_empty() {
                continue;
            }
            if let Some(value) = accept(&text) {
                return Some(value);
            }
        }
    }
    None
}

fn bed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,2})\s*(?:bed|bd|br)\b").expect("static regex"))
}

fn bath_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,2}(?:\.\d)?)\s*(?:bath|ba)\b").expect("static regex"))
}

fn sqft_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([\d,]{3,7})\s*(?:sq\.?\s*ft|sqft|square\s+feet)").expect("static regex")
    })
}

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\s*([\d,]{4,11})").expect("static regex"))
}

/// Fill every still-empty field from selector candidates, then regex.
pub fn fill_missing(prop: &mut ExtractedProperty, doc: &Html, body_text: &str) {
    if prop.address.is_none() {
        prop.address = first_match(doc, ADDRESS_SELECTORS, |t| {
            // A plausible address has a digit and some length.
            (t.len() >= 8 && t.chars().any(|c| c.is_ascii_digit())).then(|| t.to_string())
        });
    }

    if prop.price.is_none() {
        prop.price = first_match(doc, PRICE_SELECTORS, fields::parse_currency).or_else(|| {
            price_regex()
                .captures_iter(body_text)
                .filter_map(|c| c.get(1))
                .find_map(|m| fields::parse_currency(m.as_str()))
        });
    }

    if prop.beds.is_none() {
        prop.beds = first_match(doc, BED_SELECTORS, fields::parse_bed_count).or_else(|| {
            bed_regex()
                .captures_iter(body_text)
                .filter_map(|c| c.get(1))
                .find_map(|m| fields::parse_bed_count(m.as_str()))
        });
    }

    if prop.baths.is_none() {
        prop.baths = first_match(doc, BATH_SELECTORS, fields::parse_bath_count).or_else(|| {
            bath_regex()
                .captures_iter(body_text)
                .filter_map(|c| c.get(1))
                .find_map(|m| fields::parse_bath_count(m.as_str()))
        });
    }

    if prop.sqft.is_none() {
        prop.sqft = first_match(doc, SQFT_SELECTORS, fields::parse_area).or_else(|| {
            sqft_regex()
                .captures_iter(body_text)
                .filter_map(|c| c.get(1))
                .find_map(|m| fields::parse_area(m.as_str()))
        });
    }

    if prop.description.is_none() {
        prop.description =
            first_match(doc, DESCRIPTION_SELECTORS, |t| {
                (t.len() >= 20).then(|| t.to_string())
            });
    }

    if prop.image_urls.is_empty() {
        prop.image_urls = collect_images(doc);
    }
}

/// Gather candidate image URLs, preferring gallery containers over the whole
/// document.
fn collect_images(doc: &Html) -> Vec<String> {
    for raw in IMAGE_CONTAINER_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let urls: Vec<String> = doc
            .select(&selector)
            .filter_map(|el| el.value().attr("src").or_else(|| el.value().attr("data-src")))
            .map(str::to_string)
            .collect();
        if !urls.is_empty() {
            return urls;
        }
    }
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|el| el.value().attr("src").or_else(|| el.value().attr("data-src")))
        .map(str::to_string)
        .collect()
}

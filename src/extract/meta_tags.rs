//! Meta-tag extraction for realtor.ca.
//!
//! Realtor.ca duplicates listing data into per-field meta tags (and indexed
//! photo tags) for social previews. Those tags survive visual redesigns far
//! better than the rendered markup, so they are preferred over selectors.

use scraper::{Html, Selector};

use crate::extract::fields;
use crate::models::ExtractedProperty;

/// Highest photo index probed before giving up.
const MAX_PHOTO_INDEX: usize = 40;

fn meta_content(doc: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn og_content(doc: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pull attributes from meta tags. Fields that are missing stay `None` for
/// the generic strategy to fill.
pub fn extract(doc: &Html, source_url: &str) -> ExtractedProperty {
    let address = match (meta_content(doc, "address"), meta_content(doc, "city")) {
        (Some(street), Some(city)) => Some(format!("{street}, {city}")),
        (Some(street), None) => Some(street),
        (None, _) => og_content(doc, "og:title"),
    };

    let price = meta_content(doc, "price").and_then(|s| fields::parse_currency(&s));
    let beds = meta_content(doc, "bedrooms").and_then(|s| fields::parse_bed_count(&s));
    let baths = meta_content(doc, "bathrooms").and_then(|s| fields::parse_bath_count(&s));
    let sqft = meta_content(doc, "sqft")
        .or_else(|| meta_content(doc, "square-feet"))
        .and_then(|s| fields::parse_area(&s));
    let description = meta_content(doc, "description").or_else(|| og_content(doc, "og:description"));

    let mut image_urls: Vec<String> = Vec::new();
    if let Some(og_image) = og_content(doc, "og:image") {
        image_urls.push(og_image);
    }
    // Indexed photo tags: photo-1, photo-2, … contiguous from 1.
    for index in 1..=MAX_PHOTO_INDEX {
        match meta_content(doc, &format!("photo-{index}")) {
            Some(url) => image_urls.push(url),
            None => break,
        }
    }

    ExtractedProperty {
        address,
        price,
        beds,
        baths,
        sqft,
        description,
        image_urls,
        source_url: Some(source_url.to_string()),
        scraped_at: None,
    }
}

/// True when the page carries enough meta data to count as a match.
pub fn matches(doc: &Html) -> bool {
    meta_content(doc, "address").is_some()
        || meta_content(doc, "price").is_some()
        || meta_content(doc, "photo-1").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Html {
        Html::parse_document(
            r#"<html><head>
            <meta name="address" content="123 Main St">
            <meta name="city" content="Vancouver">
            <meta name="price" content="$1,249,900">
            <meta name="bedrooms" content="4">
            <meta name="bathrooms" content="3">
            <meta name="sqft" content="2,400">
            <meta property="og:image" content="https://cdn.realtor.ca/listings/TS1/reas/0/large.jpg">
            <meta name="photo-1" content="https://cdn.realtor.ca/listings/TS1/reas/1/large.jpg">
            <meta name="photo-2" content="https://cdn.realtor.ca/listings/TS1/reas/2/large.jpg">
            <meta name="description" content="Family home near schools.">
            </head><body></body></html>"#,
        )
    }

    #[test]
    fn test_meta_fields_extracted() {
        let prop = extract(&page(), "https://www.realtor.ca/real-estate/1");
        assert_eq!(prop.address.as_deref(), Some("123 Main St, Vancouver"));
        assert_eq!(prop.price, Some(1_249_900.0));
        assert_eq!(prop.beds, Some(4));
        assert_eq!(prop.baths, Some(3.0));
        assert_eq!(prop.sqft, Some(2400));
        assert_eq!(prop.description.as_deref(), Some("Family home near schools."));
    }

    #[test]
    fn test_indexed_photos_stop_at_gap() {
        let prop = extract(&page(), "u");
        // og:image plus photo-1 and photo-2.
        assert_eq!(prop.image_urls.len(), 3);
        assert!(prop.image_urls[1].ends_with("/1/large.jpg"));
    }

    #[test]
    fn test_bad_price_meta_is_omitted() {
        let doc = Html::parse_document(
            r#"<meta name="address" content="9 Elm St"><meta name="price" content="$1,200">"#,
        );
        let prop = extract(&doc, "u");
        assert_eq!(prop.address.as_deref(), Some("9 Elm St"));
        assert_eq!(prop.price, None);
    }

    #[test]
    fn test_matches_requires_listing_metas() {
        assert!(matches(&page()));
        assert!(!matches(&Html::parse_document("<html><head></head></html>")));
    }
}

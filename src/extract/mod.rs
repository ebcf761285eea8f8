//! Site extraction dispatcher.
//!
//! Routes a fetched document to the first extraction strategy that claims it,
//! then lets the generic strategy fill any still-empty fields. Field
//! extractors are isolated: one failing field is omitted, never an error.
//! `ParseFailure` fires only when there is no markup to work with.

pub mod embedded;
pub mod fields;
pub mod generic;
pub mod images;
pub mod meta_tags;

pub use images::{default_cdn_rules, normalize as normalize_images, CdnRule, RewriteKind};

use chrono::Utc;
use scraper::Html;
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::fetch::SiteFamily;
use crate::models::{ExtractedProperty, ListingDocument};

/// Extraction dispatcher with its CDN rewrite rules.
pub struct Extractor {
    cdn_rules: Vec<CdnRule>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            cdn_rules: default_cdn_rules(),
        }
    }
}

impl Extractor {
    pub fn new(cdn_rules: Vec<CdnRule>) -> Self {
        Self { cdn_rules }
    }

    /// Extract a property record from a fetched listing document.
    ///
    /// All fields are optional; an empty result is not an error. Dispatch is
    /// first-match-wins per listing: the embedded-data strategy short-circuits
    /// everything on success, the meta-tag strategy yields to the generic
    /// filler for the fields it misses.
    pub fn extract(&self, doc: &ListingDocument) -> Result<ExtractedProperty, ExtractError> {
        if doc.body.trim().is_empty() {
            return Err(ExtractError::ParseFailure);
        }

        let host = doc.host().unwrap_or_default();
        let family = SiteFamily::classify(&host);
        let html = Html::parse_document(&doc.body);

        let mut prop;
        let mut strategy = "generic";

        if family == SiteFamily::Zealty {
            if let Some(complete) = embedded::extract(&doc.body, &doc.url) {
                info!(strategy = "embedded", host, "extraction complete");
                return Ok(self.finalize(complete));
            }
        }

        if family == SiteFamily::RealtorCa && meta_tags::matches(&html) {
            prop = meta_tags::extract(&html, &doc.url);
            strategy = "meta_tags";
        } else {
            prop = ExtractedProperty {
                source_url: Some(doc.url.clone()),
                ..Default::default()
            };
        }

        let body_text = html.root_element().text().collect::<String>();
        generic::fill_missing(&mut prop, &html, &body_text);

        debug!(
            strategy,
            host,
            has_address = prop.address.is_some(),
            has_price = prop.price.is_some(),
            images = prop.image_urls.len(),
            "extraction finished"
        );
        Ok(self.finalize(prop))
    }

    fn finalize(&self, mut prop: ExtractedProperty) -> ExtractedProperty {
        prop.image_urls = images::normalize(std::mem::take(&mut prop.image_urls), &self.cdn_rules);
        prop.scraped_at = Some(Utc::now());
        prop
    }
}

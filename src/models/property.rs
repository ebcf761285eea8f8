//! Listing document and extracted property types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched listing page. Produced by the fetch engine, consumed once by the
/// extraction dispatcher.
#[derive(Debug, Clone)]
pub struct ListingDocument {
    /// URL the fetch was requested for.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    /// HTTP status of the final response.
    pub status: u16,
    /// Decoded response body.
    pub body: String,
    /// Body size in bytes (pre-decode size is not tracked).
    pub byte_len: usize,
}

impl ListingDocument {
    pub fn new(url: impl Into<String>, final_url: impl Into<String>, status: u16, body: String) -> Self {
        let byte_len = body.len();
        Self {
            url: url.into(),
            final_url: final_url.into(),
            status,
            body,
            byte_len,
        }
    }

    /// Host of the resolved URL, if it parses.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.final_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}

/// Structured attributes pulled out of a listing page.
///
/// Every field is optional; extraction omits anything it cannot parse or that
/// parses outside its validated range. Out-of-range values are discarded,
/// never clamped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedProperty {
    pub address: Option<String>,
    /// Listing price in whole currency units, valid range 10_000..=50_000_000.
    pub price: Option<f64>,
    /// Bedroom count, valid range 0..=50.
    pub beds: Option<u32>,
    /// Bathroom count (half baths allowed), valid range 0.5..=20.0.
    pub baths: Option<f64>,
    /// Interior area in square feet, valid range 100..=50_000.
    pub sqft: Option<u32>,
    pub description: Option<String>,
    /// Normalized image URLs: deduplicated, first-seen order, at most 20.
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub source_url: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
}

impl ExtractedProperty {
    /// True when no field extractor produced anything.
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.price.is_none()
            && self.beds.is_none()
            && self.baths.is_none()
            && self.sqft.is_none()
            && self.description.is_none()
            && self.image_urls.is_empty()
    }
}

/// Property metadata handed to the analysis stage alongside image URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFacts {
    pub address: String,
    pub price: Option<f64>,
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub sqft: Option<u32>,
    pub description: Option<String>,
    pub days_on_market: Option<u32>,
}

impl From<&ExtractedProperty> for PropertyFacts {
    fn from(p: &ExtractedProperty) -> Self {
        Self {
            address: p.address.clone().unwrap_or_default(),
            price: p.price,
            beds: p.beds,
            baths: p.baths,
            sqft: p.sqft,
            description: p.description.clone(),
            days_on_market: None,
        }
    }
}

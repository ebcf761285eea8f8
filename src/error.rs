//! Error types for the listing pipeline.
//!
//! Every public entry point maps failures into one of these enums; nothing
//! panics across the library boundary.

use std::time::Duration;

use thiserror::Error;

use crate::fetch::BlockVendor;

/// Fetch failures, in rough order of how early they are detected.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid listing URL: {0}")]
    InvalidUrl(String),

    #[error("{host} serves listings via client-side JavaScript and cannot be fetched")]
    JavascriptRequired { host: String },

    #[error("rate limited: wait {:.1}s before re-requesting {domain}", .wait.as_secs_f64())]
    RateLimited { domain: String, wait: Duration },

    #[error("all {attempts} fetch attempts were blocked{}", .vendor.map(|v| format!(" by {}", v.name())).unwrap_or_default())]
    AllAttemptsBlocked {
        attempts: u32,
        vendor: Option<BlockVendor>,
    },

    #[error("network failure after {attempts} attempts: {message}")]
    Network { attempts: u32, message: String },
}

impl FetchError {
    /// Human-actionable guidance for surfacing to an end user.
    pub fn remediation(&self) -> String {
        match self {
            FetchError::InvalidUrl(_) => {
                "Check that the listing URL is complete and starts with http:// or https://".to_string()
            }
            FetchError::JavascriptRequired { host } => format!(
                "{host} cannot be read without a browser. Open the listing manually and enter the details by hand or via CSV import."
            ),
            FetchError::RateLimited { domain, wait } => format!(
                "Too many recent requests to {domain}. Retry in {} seconds.",
                wait.as_secs().max(1)
            ),
            FetchError::AllAttemptsBlocked { vendor, .. } => match vendor {
                Some(v) => format!(
                    "The site is protected by {}. Open the listing in a normal browser and copy the details manually.",
                    v.name()
                ),
                None => "The site is refusing automated requests. Try again later or enter the listing manually.".to_string(),
            },
            FetchError::Network { .. } => {
                "The site could not be reached. Check the URL and your connection, then retry.".to_string()
            }
        }
    }
}

/// Extraction failures. Individual field extractors never error; this fires
/// only when the document is unusable as markup.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document could not be parsed as markup")]
    ParseFailure,
}

/// Analysis failures surfaced per batch. The batch runner recovers from all
/// of these; only missing input escapes to the caller.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("missing required analysis input: {0}")]
    MissingInput(&'static str),

    #[error("analysis API key not configured; set GEMINI_API_KEY")]
    MissingApiKey,

    #[error("HTTP request to analysis API failed: {0}")]
    Http(String),

    #[error("analysis API error: {0}")]
    Api(String),

    #[error("analysis API returned an empty response")]
    EmptyResponse,

    #[error("no batch image could be downloaded")]
    NoUsableImages,
}

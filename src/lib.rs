//! propscope - real-estate listing acquisition and AI condition analysis.
//!
//! Pipeline: URL -> [`fetch::FetchEngine`] -> [`models::ListingDocument`] ->
//! [`extract::Extractor`] -> [`models::ExtractedProperty`] -> optional
//! [`analysis::AnalysisRunner`] -> [`models::CombinedVerdict`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;

pub use config::AppConfig;
pub use error::{AnalysisError, ExtractError, FetchError};

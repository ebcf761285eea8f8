//! Core data types shared across fetch, extraction, and analysis.

mod property;
mod verdict;

pub use property::{ExtractedProperty, ListingDocument, PropertyFacts};
pub use verdict::{AnalysisVerdict, CombinedVerdict, Grade, RedFlag, Severity};

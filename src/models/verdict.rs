//! Analysis verdict types.

use serde::{Deserialize, Serialize};

/// Letter grade assigned to a property's visible condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Ordering priority, worst first. Used when merging batch verdicts:
    /// the most conservative grade wins.
    pub fn priority(self) -> u8 {
        match self {
            Grade::F => 0,
            Grade::D => 1,
            Grade::C => 2,
            Grade::B => 3,
            Grade::A => 4,
        }
    }

    /// Parse a grade letter; anything unrecognized becomes `C`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim() {
            "A" => Grade::A,
            "B" => Grade::B,
            "C" => Grade::C,
            "D" => Grade::D,
            "F" => Grade::F,
            _ => Grade::C,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Severity of a flagged issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse a severity label; anything unrecognized becomes `Medium`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            _ => Severity::Medium,
        }
    }
}

/// A problem spotted in the listing images or description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlag {
    pub issue: String,
    pub severity: Severity,
    pub explanation: String,
    #[serde(default)]
    pub rooms_affected: Vec<String>,
}

/// Result of one external analysis call over one image batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    pub overall_grade: Grade,
    pub red_flags: Vec<RedFlag>,
    pub positive_indicators: Vec<String>,
    pub price_assessment: String,
    pub price_assessment_explanation: String,
    pub buyer_recommendation: String,
    /// Model confidence in 0.0..=1.0.
    pub confidence_score: f64,
    pub analysis_summary: String,
}

impl Default for AnalysisVerdict {
    fn default() -> Self {
        Self {
            overall_grade: Grade::C,
            red_flags: Vec::new(),
            positive_indicators: Vec::new(),
            price_assessment: "fair".to_string(),
            price_assessment_explanation: "Unable to assess".to_string(),
            buyer_recommendation: "inspect carefully".to_string(),
            confidence_score: 0.5,
            analysis_summary: "Analysis completed with limited confidence".to_string(),
        }
    }
}

/// Deterministic merge of every batch verdict for one listing.
///
/// Same shape as a single verdict; created once by the combiner and immutable
/// afterwards.
pub type CombinedVerdict = AnalysisVerdict;

impl AnalysisVerdict {
    /// Verdict used when analysis could not run or produced nothing usable.
    pub fn degraded(summary: impl Into<String>) -> Self {
        Self {
            analysis_summary: summary.into(),
            ..Self::default()
        }
    }
}

//! Property condition analysis.
//!
//! Splits listing images into bounded batches, runs one vision-model call per
//! batch, and merges the per-batch verdicts deterministically. The model
//! backend sits behind [`VisionAnalyzer`] so batching and combination logic
//! are testable without network access.

pub mod batch;
pub mod gemini;
pub mod prompt;

pub use batch::AnalysisRunner;
pub use gemini::GeminiAnalyzer;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::error::AnalysisError;
use crate::models::{AnalysisVerdict, Grade, PropertyFacts, RedFlag, Severity};

/// One external vision+text analysis backend.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    fn model_name(&self) -> &str;

    /// Analyze one image batch for one property. Implementations return an
    /// already-repaired verdict or an error; the runner treats any error as a
    /// failed batch.
    async fn analyze_batch(
        &self,
        facts: &PropertyFacts,
        image_urls: &[String],
    ) -> Result<AnalysisVerdict, AnalysisError>;
}

/// Extract the JSON object embedded in a model response and repair it.
///
/// Models wrap JSON in prose or markdown fences often enough that we take
/// everything between the first `{` and the last `}` and parse that.
pub fn parse_model_response(text: &str) -> AnalysisVerdict {
    let start = text.find('{');
    let end = text.rfind('}');
    let value = match (start, end) {
        (Some(s), Some(e)) if e > s => serde_json::from_str::<Value>(&text[s..=e]).ok(),
        _ => None,
    };
    match value {
        Some(v) => repair_verdict(v),
        None => {
            warn!("no JSON object found in model response");
            repair_verdict(Value::Null)
        }
    }
}

/// Coerce a raw model response into a well-formed verdict.
///
/// Missing fields take fixed defaults, the grade is forced into A-F,
/// confidence is clamped to [0, 1] (0.5 when non-numeric), and non-list
/// flag/positive fields become empty lists.
pub fn repair_verdict(raw: Value) -> AnalysisVerdict {
    let mut verdict = AnalysisVerdict::default();
    let Some(obj) = raw.as_object() else {
        return verdict;
    };

    if let Some(grade) = obj.get("overall_grade").and_then(Value::as_str) {
        verdict.overall_grade = Grade::parse_or_default(grade);
    }

    if let Some(flags) = obj.get("red_flags").and_then(Value::as_array) {
        verdict.red_flags = flags.iter().filter_map(repair_flag).collect();
    }

    if let Some(positives) = obj.get("positive_indicators").and_then(Value::as_array) {
        verdict.positive_indicators = positives
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    if let Some(s) = obj.get("price_assessment").and_then(Value::as_str) {
        verdict.price_assessment = s.to_string();
    }
    if let Some(s) = obj.get("price_assessment_explanation").and_then(Value::as_str) {
        verdict.price_assessment_explanation = s.to_string();
    }
    if let Some(s) = obj.get("buyer_recommendation").and_then(Value::as_str) {
        verdict.buyer_recommendation = s.to_string();
    }
    if let Some(s) = obj.get("analysis_summary").and_then(Value::as_str) {
        verdict.analysis_summary = s.to_string();
    }

    if let Some(confidence) = obj.get("confidence_score") {
        verdict.confidence_score = match confidence.as_f64() {
            Some(c) => c.clamp(0.0, 1.0),
            None => 0.5,
        };
    }

    verdict
}

fn repair_flag(raw: &Value) -> Option<RedFlag> {
    let obj = raw.as_object()?;
    let issue = obj.get("issue").and_then(Value::as_str)?.to_string();
    if issue.is_empty() {
        return None;
    }
    Some(RedFlag {
        issue,
        severity: obj
            .get("severity")
            .and_then(Value::as_str)
            .map(Severity::parse_or_default)
            .unwrap_or(Severity::Medium),
        explanation: obj
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        rooms_affected: obj
            .get("rooms_affected")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

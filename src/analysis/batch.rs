//! Image batching and verdict combination.
//!
//! Three states: no images yields a terminal degraded verdict, a list within
//! the batch size runs as one call, anything larger is split into consecutive
//! batches (ceiling division) run sequentially. Failed batches are dropped;
//! the result degrades only when every batch fails. Combination is
//! deterministic and order-independent over its inputs.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::analysis::VisionAnalyzer;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::fetch::{Sleeper, TokioSleeper};
use crate::models::{AnalysisVerdict, CombinedVerdict, Grade, PropertyFacts, RedFlag, Severity};

/// Caps applied when merging batch results.
const MAX_COMBINED_FLAGS: usize = 10;
const MAX_COMBINED_POSITIVES: usize = 10;
/// Combined confidence never exceeds this: multiple partial views are less
/// trustworthy than one full view.
const CONFIDENCE_CAP: f64 = 0.95;

/// Runs batched analysis for one listing.
pub struct AnalysisRunner {
    analyzer: Arc<dyn VisionAnalyzer>,
    config: AnalysisConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl AnalysisRunner {
    pub fn new(analyzer: Arc<dyn VisionAnalyzer>, config: AnalysisConfig) -> Self {
        Self {
            analyzer,
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Inject a sleeper for tests.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Analyze a property's images and merge all batch verdicts.
    ///
    /// Never hard-fails past input validation: API problems produce a
    /// degraded verdict whose summary says what went wrong.
    pub async fn analyze(
        &self,
        facts: &PropertyFacts,
        image_urls: &[String],
    ) -> Result<CombinedVerdict, AnalysisError> {
        if facts.address.is_empty() {
            return Err(AnalysisError::MissingInput("address"));
        }

        let mut images: Vec<String> = image_urls.to_vec();
        if images.is_empty() {
            info!("no images; returning degraded verdict");
            return Ok(AnalysisVerdict::degraded("No images available for analysis"));
        }
        if images.len() > self.config.max_total_images {
            warn!(
                count = images.len(),
                cap = self.config.max_total_images,
                "too many images; truncating"
            );
            images.truncate(self.config.max_total_images);
        }

        let batch_size = self.config.max_images_per_batch.max(1);
        if images.len() <= batch_size {
            return Ok(match self.analyzer.analyze_batch(facts, &images).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!(error = %e, "single-batch analysis failed");
                    AnalysisVerdict::degraded(format!("Analysis failed: {e}"))
                }
            });
        }

        let batches: Vec<&[String]> = images.chunks(batch_size).collect();
        info!(
            images = images.len(),
            batches = batches.len(),
            batch_size,
            "running multi-batch analysis"
        );

        let mut batch_verdicts: Vec<AnalysisVerdict> = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            match self.analyzer.analyze_batch(facts, batch).await {
                Ok(verdict) => batch_verdicts.push(verdict),
                Err(e) => {
                    // Failed batches are dropped silently from the verdict;
                    // the trace is the only record.
                    warn!(batch = index + 1, error = %e, "batch failed; dropping");
                }
            }
            if index + 1 < batches.len() {
                self.sleeper.sleep(self.config.inter_batch_pause()).await;
            }
        }

        if batch_verdicts.is_empty() {
            warn!("all analysis batches failed");
            return Ok(AnalysisVerdict::degraded("All image analysis batches failed"));
        }

        Ok(combine_verdicts(&batch_verdicts, images.len()))
    }
}

/// Number of batches a list of `count` images produces at `batch_size`.
pub fn batch_count(count: usize, batch_size: usize) -> usize {
    if count == 0 {
        return 0;
    }
    count.div_ceil(batch_size.max(1))
}

/// Merge per-batch verdicts into one combined verdict.
pub fn combine_verdicts(batch_verdicts: &[AnalysisVerdict], total_images: usize) -> CombinedVerdict {
    // Worst grade wins; no grades at all defaults to C.
    let overall_grade = batch_verdicts
        .iter()
        .map(|v| v.overall_grade)
        .min_by_key(|g| g.priority())
        .unwrap_or(Grade::C);

    let confidences: Vec<f64> = batch_verdicts.iter().map(|v| v.confidence_score).collect();
    let mean_confidence = if confidences.is_empty() {
        0.7
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };
    let confidence_score = mean_confidence.min(CONFIDENCE_CAP);

    // Flags dedup case-insensitively on issue text, first occurrence kept.
    let mut seen_issues: HashSet<String> = HashSet::new();
    let mut red_flags: Vec<RedFlag> = Vec::new();
    for verdict in batch_verdicts {
        for flag in &verdict.red_flags {
            if seen_issues.insert(flag.issue.to_lowercase()) {
                red_flags.push(flag.clone());
            }
        }
    }
    red_flags.truncate(MAX_COMBINED_FLAGS);

    // Positives dedup case-sensitively with set semantics; input order is not
    // preserved. Differs from flag dedup on purpose: this matches the
    // long-standing observed behavior, so "Hardwood floors" and "hardwood
    // floors" both survive.
    let positive_set: HashSet<String> = batch_verdicts
        .iter()
        .flat_map(|v| v.positive_indicators.iter().cloned())
        .collect();
    let mut positive_indicators: Vec<String> = positive_set.into_iter().collect();
    if positive_indicators.len() > MAX_COMBINED_POSITIVES {
        // Sorted tiebreak so the surviving ten do not depend on hash order.
        positive_indicators.sort();
        positive_indicators.truncate(MAX_COMBINED_POSITIVES);
    }

    let high_severity = red_flags
        .iter()
        .filter(|f| f.severity == Severity::High)
        .count();

    let (price_assessment, buyer_recommendation) = if high_severity >= 2 {
        (
            "high".to_string(),
            "proceed with extreme caution - multiple serious concerns".to_string(),
        )
    } else if red_flags.len() >= 5 {
        (
            "fair".to_string(),
            "proceed with caution - multiple concerns identified".to_string(),
        )
    } else if positive_indicators.len() > red_flags.len() {
        (
            "fair".to_string(),
            "good property with noted strengths".to_string(),
        )
    } else {
        (
            "fair".to_string(),
            "proceed with thorough inspection".to_string(),
        )
    };

    let mut analysis_summary = format!(
        "Comprehensive analysis of {} images across {} batches. ",
        total_images,
        batch_verdicts.len()
    );
    if !red_flags.is_empty() {
        analysis_summary.push_str(&format!("Found {} potential issues. ", red_flags.len()));
    }
    if !positive_indicators.is_empty() {
        analysis_summary.push_str(&format!(
            "Identified {} positive aspects. ",
            positive_indicators.len()
        ));
    }
    analysis_summary.push_str(&format!(
        "Overall assessment: {} grade.",
        overall_grade.as_str()
    ));

    AnalysisVerdict {
        overall_grade,
        red_flags,
        positive_indicators,
        price_assessment,
        price_assessment_explanation: "Derived from combined batch analysis".to_string(),
        buyer_recommendation,
        confidence_score,
        analysis_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::fetch::RecordingSleeper;

    fn verdict(grade: Grade, confidence: f64) -> AnalysisVerdict {
        AnalysisVerdict {
            overall_grade: grade,
            confidence_score: confidence,
            ..Default::default()
        }
    }

    fn flag(issue: &str, severity: Severity) -> RedFlag {
        RedFlag {
            issue: issue.to_string(),
            severity,
            explanation: String::new(),
            rooms_affected: Vec::new(),
        }
    }

    /// Scripted analyzer: pops one result per call.
    struct ScriptedAnalyzer {
        results: Mutex<Vec<Result<AnalysisVerdict, AnalysisError>>>,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedAnalyzer {
        fn new(results: Vec<Result<AnalysisVerdict, AnalysisError>>) -> Self {
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VisionAnalyzer for ScriptedAnalyzer {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn analyze_batch(
            &self,
            _facts: &PropertyFacts,
            image_urls: &[String],
        ) -> Result<AnalysisVerdict, AnalysisError> {
            self.calls.lock().unwrap().push(image_urls.len());
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(AnalysisVerdict::default())
            } else {
                results.remove(0)
            }
        }
    }

    fn facts() -> PropertyFacts {
        PropertyFacts {
            address: "123 Main St".to_string(),
            ..Default::default()
        }
    }

    fn runner(analyzer: ScriptedAnalyzer, batch_size: usize) -> AnalysisRunner {
        let config = AnalysisConfig {
            max_images_per_batch: batch_size,
            ..Default::default()
        };
        AnalysisRunner::new(Arc::new(analyzer), config)
            .with_sleeper(Arc::new(RecordingSleeper::new()))
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://img.example/{i}.jpg")).collect()
    }

    #[test]
    fn test_batch_count_ceiling_division() {
        assert_eq!(batch_count(25, 2), 13);
        assert_eq!(batch_count(4, 2), 2);
        assert_eq!(batch_count(5, 2), 3);
        assert_eq!(batch_count(1, 2), 1);
        assert_eq!(batch_count(0, 2), 0);
    }

    #[test]
    fn test_worst_grade_wins() {
        let verdicts = vec![
            verdict(Grade::B, 0.9),
            verdict(Grade::F, 0.95),
            verdict(Grade::C, 0.99),
        ];
        let combined = combine_verdicts(&verdicts, 6);
        assert_eq!(combined.overall_grade, Grade::F);
    }

    #[test]
    fn test_confidence_mean_is_capped() {
        let verdicts = vec![
            verdict(Grade::A, 0.9),
            verdict(Grade::A, 0.95),
            verdict(Grade::A, 0.99),
        ];
        let combined = combine_verdicts(&verdicts, 6);
        // Mean of these is ~0.9467, still under the cap.
        assert!(combined.confidence_score <= 0.95);
        let verdicts = vec![verdict(Grade::A, 0.99), verdict(Grade::A, 0.99)];
        assert_eq!(combine_verdicts(&verdicts, 4).confidence_score, 0.95);
    }

    #[test]
    fn test_empty_input_defaults() {
        let combined = combine_verdicts(&[], 0);
        assert_eq!(combined.overall_grade, Grade::C);
        assert!((combined.confidence_score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_flag_dedup_case_insensitive_first_kept() {
        let mut a = verdict(Grade::C, 0.8);
        a.red_flags = vec![
            flag("Water stain on ceiling", Severity::High),
            flag("Cracked tile", Severity::Low),
        ];
        let mut b = verdict(Grade::C, 0.8);
        b.red_flags = vec![flag("water stain on CEILING", Severity::Low)];
        let combined = combine_verdicts(&[a, b], 4);
        assert_eq!(combined.red_flags.len(), 2);
        // First occurrence kept, including its casing and severity.
        assert_eq!(combined.red_flags[0].issue, "Water stain on ceiling");
        assert_eq!(combined.red_flags[0].severity, Severity::High);
    }

    #[test]
    fn test_positive_dedup_is_case_sensitive() {
        let mut a = verdict(Grade::B, 0.8);
        a.positive_indicators = vec![
            "Hardwood floors".to_string(),
            "hardwood floors".to_string(),
        ];
        let mut b = verdict(Grade::B, 0.8);
        b.positive_indicators = vec!["New roof".to_string(), "Hardwood floors".to_string()];
        let combined = combine_verdicts(&[a, b], 4);
        // The two casings are NOT merged.
        assert_eq!(combined.positive_indicators.len(), 3);
    }

    #[test]
    fn test_positive_overflow_truncated_deterministically() {
        let mut a = verdict(Grade::B, 0.8);
        a.positive_indicators = (0..7).map(|i| format!("feature {i:02}")).collect();
        let mut b = verdict(Grade::B, 0.8);
        b.positive_indicators = (7..12).rev().map(|i| format!("feature {i:02}")).collect();
        let combined = combine_verdicts(&[a, b], 4);
        assert_eq!(combined.positive_indicators.len(), 10);
        // Same ten survive on every run: sorted order, highest two dropped.
        assert!(combined.positive_indicators.contains(&"feature 00".to_string()));
        assert!(combined.positive_indicators.contains(&"feature 09".to_string()));
        assert!(!combined.positive_indicators.contains(&"feature 10".to_string()));
        assert!(!combined.positive_indicators.contains(&"feature 11".to_string()));
    }

    #[test]
    fn test_recommendation_thresholds() {
        let mut two_high = verdict(Grade::D, 0.8);
        two_high.red_flags = vec![
            flag("Foundation crack", Severity::High),
            flag("Active leak", Severity::High),
        ];
        let combined = combine_verdicts(&[two_high], 2);
        assert_eq!(combined.price_assessment, "high");
        assert!(combined.buyer_recommendation.contains("extreme caution"));

        let mut many = verdict(Grade::C, 0.8);
        many.red_flags = (0..5)
            .map(|i| flag(&format!("issue {i}"), Severity::Low))
            .collect();
        let combined = combine_verdicts(&[many], 2);
        assert!(combined.buyer_recommendation.contains("proceed with caution"));

        let mut positive = verdict(Grade::B, 0.8);
        positive.positive_indicators = vec!["Updated kitchen".to_string()];
        let combined = combine_verdicts(&[positive], 2);
        assert!(combined.buyer_recommendation.contains("noted strengths"));
    }

    #[test]
    fn test_summary_mentions_counts_and_grade() {
        let mut v = verdict(Grade::B, 0.8);
        v.red_flags = vec![flag("Worn carpet", Severity::Low)];
        v.positive_indicators = vec!["Bright rooms".to_string()];
        let combined = combine_verdicts(&[v.clone(), v], 7);
        assert!(combined.analysis_summary.contains("7 images"));
        assert!(combined.analysis_summary.contains("2 batches"));
        assert!(combined.analysis_summary.contains("B grade"));
    }

    #[tokio::test]
    async fn test_no_images_degrades() {
        let r = runner(ScriptedAnalyzer::new(vec![]), 2);
        let verdict = r.analyze(&facts(), &[]).await.unwrap();
        assert_eq!(verdict.analysis_summary, "No images available for analysis");
    }

    #[tokio::test]
    async fn test_missing_address_is_invalid_input() {
        let r = runner(ScriptedAnalyzer::new(vec![]), 2);
        let err = r.analyze(&PropertyFacts::default(), &urls(2)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput("address")));
    }

    #[tokio::test]
    async fn test_25_images_batch_size_2_runs_13_batches() {
        let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));
        let config = AnalysisConfig {
            max_images_per_batch: 2,
            ..Default::default()
        };
        let r = AnalysisRunner::new(analyzer.clone(), config)
            .with_sleeper(Arc::new(RecordingSleeper::new()));
        let verdict = r.analyze(&facts(), &urls(25)).await.unwrap();
        assert!(verdict.analysis_summary.contains("13 batches"));
        assert!(verdict.analysis_summary.contains("25 images"));

        let calls = analyzer.calls.lock().unwrap();
        assert_eq!(calls.len(), 13);
        assert_eq!(calls.iter().sum::<usize>(), 25);
        // Last batch carries the odd image out.
        assert_eq!(*calls.last().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_batches_dropped_silently() {
        let mut good = verdict(Grade::B, 0.9);
        good.positive_indicators = vec!["Good light".to_string()];
        let analyzer = ScriptedAnalyzer::new(vec![
            Err(AnalysisError::EmptyResponse),
            Ok(good),
            Err(AnalysisError::Api("503".to_string())),
        ]);
        let r = runner(analyzer, 1);
        let combined = r.analyze(&facts(), &urls(3)).await.unwrap();
        assert_eq!(combined.overall_grade, Grade::B);
        assert!(combined.analysis_summary.contains("1 batches"));
    }

    #[tokio::test]
    async fn test_all_batches_failed_degrades() {
        let analyzer = ScriptedAnalyzer::new(vec![
            Err(AnalysisError::EmptyResponse),
            Err(AnalysisError::EmptyResponse),
        ]);
        let r = runner(analyzer, 1);
        let combined = r.analyze(&facts(), &urls(2)).await.unwrap();
        assert_eq!(combined.analysis_summary, "All image analysis batches failed");
    }

    #[tokio::test]
    async fn test_single_batch_error_degrades() {
        let analyzer = ScriptedAnalyzer::new(vec![Err(AnalysisError::NoUsableImages)]);
        let r = runner(analyzer, 2);
        let combined = r.analyze(&facts(), &urls(2)).await.unwrap();
        assert!(combined.analysis_summary.starts_with("Analysis failed:"));
    }
}

//! Fuzzy matcher
//!
//! Maps noisy strings onto a list of canonical reference values. Each input
//! is matched independently: the best-scoring reference wins, ties go to the
//! reference seen first, and anything under the threshold falls back to the
//! original input with a [`MatchDiagnostic`].

use crate::similarity::{IndelRatio, SimilarityMetric};
use serde::Serialize;
use tracing::warn;

/// Default minimum similarity for a match to be accepted
pub const DEFAULT_THRESHOLD: f64 = 85.0;

/// Outcome of matching one input value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Position of the input in the batch
    pub index: usize,
    /// The input as given
    pub input: String,
    /// Best-scoring reference value, if there were any references
    pub candidate: Option<String>,
    /// Score of the best candidate (0 when there is none)
    pub score: f64,
    /// Whether the candidate met the threshold
    pub accepted: bool,
}

/// Why an input was passed through unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Best score was under the threshold
    BelowThreshold,
    /// The reference list was empty
    NoCandidates,
}

/// Structured record emitted for every fallback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDiagnostic {
    /// Position of the input in the batch
    pub index: usize,
    /// The input that could not be matched
    pub input: String,
    /// Threshold in effect
    pub threshold: f64,
    /// Closest reference value found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_candidate: Option<String>,
    /// Score of the closest reference value
    pub best_score: f64,
    /// Why the input fell back
    pub reason: FallbackReason,
}

impl std::fmt::Display for MatchDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "No adequate replacement found for item {} ({:?}). \
             Try lowering the similarity threshold {} or removing special characters",
            self.index, self.input, self.threshold
        )
    }
}

/// Result of a batch match
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    /// Output values, same length and order as the inputs
    pub values: Vec<String>,
    /// Per-item details
    pub results: Vec<MatchResult>,
    /// One entry per input that fell back
    pub diagnostics: Vec<MatchDiagnostic>,
}

/// Matches inputs against a borrowed reference list
pub struct FuzzyMatcher<'a> {
    references: Vec<&'a str>,
    metric: Box<dyn SimilarityMetric + 'a>,
}

impl<'a> FuzzyMatcher<'a> {
    /// Matcher using the default [`IndelRatio`] metric
    ///
    /// Duplicate references are dropped, keeping first-seen order.
    pub fn new<I>(references: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::with_metric(references, Box::new(IndelRatio))
    }

    /// Matcher using a custom metric
    pub fn with_metric<I>(references: I, metric: Box<dyn SimilarityMetric + 'a>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut unique: Vec<&'a str> = Vec::new();
        for r in references {
            if !unique.contains(&r) {
                unique.push(r);
            }
        }
        Self {
            references: unique,
            metric,
        }
    }

    /// Distinct reference values in first-seen order
    pub fn references(&self) -> &[&'a str] {
        &self.references
    }

    /// Best reference for one value, first-seen wins on ties
    pub fn best_match(&self, value: &str) -> Option<(&'a str, f64)> {
        let mut best: Option<(&'a str, f64)> = None;
        for &candidate in &self.references {
            let score = self.metric.score(value, candidate);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best
    }

    /// Match every input; `threshold` is inclusive
    pub fn match_values<S: AsRef<str>>(&self, dirty: &[S], threshold: f64) -> MatchReport {
        let mut report = MatchReport {
            values: Vec::with_capacity(dirty.len()),
            results: Vec::with_capacity(dirty.len()),
            diagnostics: Vec::new(),
        };

        for (index, value) in dirty.iter().enumerate() {
            let value = value.as_ref();
            let best = self.best_match(value);
            let accepted = matches!(best, Some((_, score)) if score >= threshold);

            match best {
                Some((candidate, _)) if accepted => report.values.push(candidate.to_string()),
                _ => {
                    let diagnostic = MatchDiagnostic {
                        index,
                        input: value.to_string(),
                        threshold,
                        best_candidate: best.map(|(c, _)| c.to_string()),
                        best_score: best.map_or(0.0, |(_, s)| s),
                        reason: if best.is_some() {
                            FallbackReason::BelowThreshold
                        } else {
                            FallbackReason::NoCandidates
                        },
                    };
                    warn!(
                        index,
                        input = %value,
                        threshold,
                        best_score = diagnostic.best_score,
                        metric = self.metric.name(),
                        "{}",
                        diagnostic
                    );
                    report.diagnostics.push(diagnostic);
                    report.values.push(value.to_string());
                }
            }

            report.results.push(MatchResult {
                index,
                input: value.to_string(),
                candidate: best.map(|(c, _)| c.to_string()),
                score: best.map_or(0.0, |(_, s)| s),
                accepted,
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGIONS: [&str; 3] = ["Andalucía", "Aragón", "Cataluña"];

    /// Scores by absolute length difference, for tie and boundary tests
    struct LengthMetric;

    impl SimilarityMetric for LengthMetric {
        fn name(&self) -> &'static str {
            "length"
        }

        fn score(&self, a: &str, b: &str) -> f64 {
            100.0 - (a.len() as f64 - b.len() as f64).abs()
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let matcher = FuzzyMatcher::new(REGIONS);
        let report = matcher.match_values(&["andalucia", "aragon", "xyz123"], DEFAULT_THRESHOLD);

        assert_eq!(report.values, vec!["Andalucía", "Aragón", "xyz123"]);
        assert_eq!(report.diagnostics.len(), 1);
        let diag = &report.diagnostics[0];
        assert_eq!(diag.index, 2);
        assert_eq!(diag.input, "xyz123");
        assert_eq!(diag.threshold, 85.0);
        assert_eq!(diag.reason, FallbackReason::BelowThreshold);
    }

    #[test]
    fn test_exact_value_scores_100() {
        let matcher = FuzzyMatcher::new(REGIONS);
        for region in REGIONS {
            let report = matcher.match_values(&[region], DEFAULT_THRESHOLD);
            assert_eq!(report.values, vec![region]);
            assert_eq!(report.results[0].score, 100.0);
            assert!(report.results[0].accepted);
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let matcher = FuzzyMatcher::new(["abce"]);
        // "abcd" vs "abce" scores exactly 75
        let report = matcher.match_values(&["abcd"], 75.0);
        assert_eq!(report.values, vec!["abce"]);
        assert!(report.diagnostics.is_empty());

        let report = matcher.match_values(&["abcd"], 76.0);
        assert_eq!(report.values, vec!["abcd"]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].best_score, 75.0);
        assert_eq!(report.diagnostics[0].best_candidate.as_deref(), Some("abce"));
    }

    #[test]
    fn test_length_and_order_preserved() {
        let matcher = FuzzyMatcher::new(REGIONS);
        let input = ["cataluna", "???", "ANDALUCIA", "", "aragon", "aragon"];
        let report = matcher.match_values(&input, DEFAULT_THRESHOLD);
        assert_eq!(report.values.len(), input.len());
        assert_eq!(report.results.len(), input.len());
        assert_eq!(
            report.values,
            vec!["Cataluña", "???", "Andalucía", "", "Aragón", "Aragón"]
        );
        let indices: Vec<_> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let matcher = FuzzyMatcher::with_metric(["bbb", "ccc", "aaa"], Box::new(LengthMetric));
        assert_eq!(matcher.best_match("xyz"), Some(("bbb", 100.0)));
    }

    #[test]
    fn test_duplicate_references_collapsed() {
        let matcher = FuzzyMatcher::new(["Jaén", "Jaén", "Huelva", "Jaén"]);
        assert_eq!(matcher.references(), &["Jaén", "Huelva"]);
    }

    #[test]
    fn test_empty_references_fall_back() {
        let matcher = FuzzyMatcher::new(Vec::<&str>::new());
        let report = matcher.match_values(&["Soria"], 0.0);
        assert_eq!(report.values, vec!["Soria"]);
        assert_eq!(report.diagnostics[0].reason, FallbackReason::NoCandidates);
        assert_eq!(report.results[0].candidate, None);
    }

    #[test]
    fn test_zero_threshold_accepts_any_candidate() {
        let matcher = FuzzyMatcher::new(REGIONS);
        let report = matcher.match_values(&["qqq"], 0.0);
        assert!(report.results[0].accepted);
        assert!(REGIONS.contains(&report.values[0].as_str()));
    }

    #[test]
    fn test_diagnostic_message() {
        let diag = MatchDiagnostic {
            index: 3,
            input: "Sevila!!".to_string(),
            threshold: 95.0,
            best_candidate: Some("Sevilla".to_string()),
            best_score: 80.0,
            reason: FallbackReason::BelowThreshold,
        };
        let msg = diag.to_string();
        assert!(msg.contains("item 3"));
        assert!(msg.contains("Sevila!!"));
        assert!(msg.contains("95"));
        assert!(msg.contains("special characters"));
    }

    #[test]
    fn test_report_serialization() {
        let matcher = FuzzyMatcher::new(REGIONS);
        let report = matcher.match_values(&["xyz"], DEFAULT_THRESHOLD);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["values"][0], "xyz");
        assert_eq!(json["diagnostics"][0]["reason"], "below_threshold");
    }
}

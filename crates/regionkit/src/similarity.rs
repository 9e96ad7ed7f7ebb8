//! String similarity metrics
//!
//! Scores are on a 0-100 scale where 100 means identical after
//! preprocessing. The matcher only depends on [`SimilarityMetric`], so the
//! metric can be swapped without touching matching logic.

/// A string similarity metric scoring in `[0, 100]`
pub trait SimilarityMetric: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Similarity between `a` and `b`, 100 = identical
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Normalized Indel similarity over preprocessed strings
///
/// `100 * 2 * LCS(a, b) / (|a| + |b|)`, counted in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl SimilarityMetric for IndelRatio {
    fn name(&self) -> &'static str {
        "indel_ratio"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = preprocess(a).chars().collect();
        let b: Vec<char> = preprocess(b).chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 100.0;
        }
        (2 * lcs_len(&a, &b) * 100) as f64 / total as f64
    }
}

/// Score `a` against `b` with the default metric
pub fn similarity(a: &str, b: &str) -> f64 {
    IndelRatio.score(a, b)
}

/// Trim, collapse whitespace, lowercase and fold Spanish diacritics
pub fn preprocess(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            out.push(fold_diacritic(c));
        }
    }
    out
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}

/// Longest common subsequence length, two-row DP
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_scores_100() {
        assert_eq!(similarity("Andalucía", "Andalucía"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
    }

    #[test]
    fn test_case_and_accents_ignored() {
        assert_eq!(similarity("andalucia", "Andalucía"), 100.0);
        assert_eq!(similarity("ARAGON", "Aragón"), 100.0);
        assert_eq!(similarity("cataluna", "Cataluña"), 100.0);
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(similarity("  Castilla   y León ", "Castilla y León"), 100.0);
    }

    #[test]
    fn test_known_ratio() {
        // LCS("abcd", "abce") = 3 -> 2*3/8
        assert_eq!(similarity("abcd", "abce"), 75.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(similarity("Gipuzkoa", "Guipúzcoa"), similarity("Guipúzcoa", "Gipuzkoa"));
    }

    #[test]
    fn test_typo_scores_high() {
        let score = similarity("Valensia", "Valencia");
        assert!(score > 85.0 && score < 100.0, "score was {}", score);
    }

    #[test]
    fn test_preprocess() {
        assert_eq!(preprocess(" Ávila  Ñ "), "avila n");
        assert_eq!(preprocess(""), "");
    }

    #[test]
    fn test_lcs_len() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(lcs_len(&a, &b), 4);
    }
}

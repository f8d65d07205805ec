//! String similarity metrics used for fuzzy content matching

/// A normalized similarity between two strings, in [0, 1]
pub trait SimilarityMetric: Send + Sync {
    fn name(&self) -> &'static str;

    /// 1.0 for identical strings, 0.0 for nothing in common
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))` over the whole strings
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl SimilarityMetric for LevenshteinRatio {
    fn name(&self) -> &'static str {
        "levenshtein_ratio"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// Best Levenshtein ratio of the shorter string against every equally long
/// window of the longer one
///
/// Scores a short pattern highly when it appears nearly verbatim inside a long
/// line, which the whole-string ratio penalizes for the extra length.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl SimilarityMetric for PartialRatio {
    fn name(&self) -> &'static str {
        "partial_ratio"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        let (short, long) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };

        let short_len = short.chars().count();
        if short_len == 0 {
            return if long.is_empty() { 1.0 } else { 0.0 };
        }

        let boundaries: Vec<usize> = long
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(long.len()))
            .collect();
        let windows = boundaries.len() - short_len;

        let mut best = 0.0_f64;
        for start in 0..windows {
            let window = &long[boundaries[start]..boundaries[start + short_len]];
            let score = strsim::normalized_levenshtein(short, window);
            if score > best {
                best = score;
                if best >= 1.0 {
                    break;
                }
            }
        }
        best
    }
}

/// Jaro-Winkler similarity, favouring strings that share a prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl SimilarityMetric for JaroWinkler {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

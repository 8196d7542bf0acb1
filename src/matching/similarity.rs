use std::collections::BTreeSet;

use super::normalize::normalize_name;

/// Weights of the three name-similarity components.
pub mod weights {
    pub const CHAR_OVERLAP: f64 = 0.3;
    pub const EDIT_DISTANCE: f64 = 0.3;
    /// Favored: name order varies more than spelling.
    pub const TOKEN_OVERLAP: f64 = 0.4;
}

/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Characters shared by `a` and `b`: longest common block, then recurse on
/// what lies left and right of it.
fn common_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (mut best, mut pos_a, mut pos_b) = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > best {
                best = k;
                pos_a = i;
                pos_b = j;
            }
        }
    }
    if best == 0 {
        return 0;
    }
    best + common_chars(&a[..pos_a], &b[..pos_b])
        + common_chars(&a[pos_a + best..], &b[pos_b + best..])
}

/// Character-overlap ratio in percent.
///
/// Block matching depends on argument order when blocks tie, so both orders
/// are averaged to keep the score symmetric.
pub fn char_overlap_percent(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let shared = common_chars(&a, &b) + common_chars(&b, &a);
    shared as f64 * 100.0 / total as f64
}

/// `1 - distance / longest` in percent.
pub fn edit_similarity_percent(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100.0;
    }
    (1.0 - levenshtein(a, b) as f64 / longest as f64) * 100.0
}

/// Shared distinct tokens over the larger token set, in percent.
pub fn token_overlap_percent(a: &str, b: &str) -> f64 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    let larger = ta.len().max(tb.len());
    if larger == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 * 100.0 / larger as f64
}

/// Weighted similarity of two already-normalized names, in whole percent.
pub fn normalized_name_similarity(a: &str, b: &str) -> u32 {
    if a == b {
        return 100;
    }
    let score = weights::CHAR_OVERLAP * char_overlap_percent(a, b)
        + weights::EDIT_DISTANCE * edit_similarity_percent(a, b)
        + weights::TOKEN_OVERLAP * token_overlap_percent(a, b);
    (score as u32).min(99)
}

/// Name similarity in whole percent (0-100). Symmetric; 100 exactly when the
/// names are identical after normalization.
pub fn name_similarity_percent(a: &str, b: &str) -> u32 {
    normalized_name_similarity(&normalize_name(a), &normalize_name(b))
}

/// Name similarity in [0, 1].
pub fn name_similarity(a: &str, b: &str) -> f64 {
    f64::from(name_similarity_percent(a, b)) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn char_overlap_matches_classic_ratio() {
        // "WORLD" vs "WORD": blocks "WOR" + "D" = 4 shared, 2*4/9.
        let p = char_overlap_percent("WORLD", "WORD");
        assert!((p - 800.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn identical_after_normalization_scores_one() {
        assert_eq!(name_similarity("Mr. Abebé Kebede", "ABEBE KEBEDE"), 1.0);
        assert_eq!(name_similarity_percent("jane doe", "JANE  DOE"), 100);
    }

    #[test]
    fn similarity_is_symmetric() {
        let pairs = [
            ("ABEBE KEBEDE", "KEBEDE ABEBE"),
            ("JOHN SMITH", "JON SMYTH"),
            ("ALEMAYEHU TESFAYE", "TESFAYE ALEMU"),
            ("AAB", "ABA"),
            ("MARIE CLAIRE", "CLAIRE"),
        ];
        for (a, b) in pairs {
            assert_eq!(name_similarity(a, b), name_similarity(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn reordered_names_score_high() {
        assert!(name_similarity_percent("ABEBE KEBEDE", "KEBEDE ABEBE") >= 55);
    }

    #[test]
    fn different_names_score_low() {
        assert!(name_similarity("ABEBE KEBEDE", "JOHN SMITH") < 0.5);
    }

    #[test]
    fn non_identical_never_reaches_one() {
        assert!(name_similarity_percent("JOHN SMITH", "JOHN SMITHE") < 100);
    }
}

use serde::{Deserialize, Serialize};

use super::normalize::normalize_name;
use super::similarity::{char_overlap_percent, normalized_name_similarity};
use crate::config::thresholds;
use crate::parsing::{days_between, parse_date};

/// How two values relate after fuzzy comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    /// Names above the similarity threshold.
    Fuzzy,
    /// One name contains the other. Counts as a pass.
    Partial,
    /// Dates within tolerance, numbers within 5%.
    Close,
    /// Free text above the similarity threshold.
    Similar,
    Mismatch,
    Missing,
}

/// Result of comparing an expected value with an extracted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub kind: MatchKind,
    pub is_match: bool,
    /// 0-100
    pub similarity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Comparison {
    fn new(kind: MatchKind, is_match: bool, similarity: u32) -> Self {
        Self {
            kind,
            is_match,
            similarity,
            message: None,
        }
    }

    fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }

    pub fn missing() -> Self {
        Self::new(MatchKind::Missing, false, 0)
    }
}

/// Name, date, number and text comparators with tunable tolerances.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    /// Names at or above this similarity (percent) are a fuzzy match.
    pub name_threshold: u32,
    /// Dates at most this many days apart are "close".
    pub date_tolerance_days: i64,
    /// Similarity lost per day of date difference beyond tolerance.
    pub date_decay_per_day: u32,
    pub number_threshold: u32,
    pub text_threshold: u32,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            name_threshold: thresholds::SYNC_MATCH,
            date_tolerance_days: thresholds::DATE_DELTA_DAYS,
            date_decay_per_day: 5,
            number_threshold: thresholds::NUMBER_MATCH,
            text_threshold: thresholds::SYNC_MATCH,
        }
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare_names(&self, expected: &str, extracted: &str) -> Comparison {
        let a = normalize_name(expected);
        let b = normalize_name(extracted);
        if a == b {
            return Comparison::new(MatchKind::Exact, true, 100);
        }

        let similarity = normalized_name_similarity(&a, &b);
        if similarity >= self.name_threshold {
            return Comparison::new(MatchKind::Fuzzy, true, similarity)
                .with_message(format!("Names are similar ({similarity}% match)"));
        }

        if !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a)) {
            return Comparison::new(MatchKind::Partial, true, similarity)
                .with_message("Partial name match detected".to_string());
        }

        Comparison::new(MatchKind::Mismatch, false, similarity).with_message(format!(
            "Names differ: '{expected}' vs '{extracted}' ({similarity}% similarity)"
        ))
    }

    /// Compare two date strings. Falls back to text comparison when either
    /// side does not parse.
    pub fn compare_dates(&self, expected: &str, extracted: &str) -> Comparison {
        let (Some(a), Some(b)) = (parse_date(expected), parse_date(extracted)) else {
            return self.compare_text(expected, extracted);
        };

        let days = days_between(a, b).abs();
        if days == 0 {
            return Comparison::new(MatchKind::Exact, true, 100);
        }
        if days <= self.date_tolerance_days {
            return Comparison::new(MatchKind::Close, true, 95)
                .with_message(format!("Dates differ by {days} day (timezone adjustment)"));
        }

        let decay = days.saturating_mul(i64::from(self.date_decay_per_day));
        let similarity = (100 - decay).max(0) as u32;
        Comparison::new(MatchKind::Mismatch, false, similarity)
            .with_message(format!("Dates differ by {days} days"))
    }

    pub fn compare_numbers(&self, expected: f64, extracted: f64) -> Comparison {
        if expected == extracted {
            return Comparison::new(MatchKind::Exact, true, 100);
        }
        let average = (expected + extracted) / 2.0;
        let percent_diff = if average > 0.0 {
            (expected - extracted).abs() / average * 100.0
        } else {
            100.0
        };
        let similarity = (100.0 - percent_diff).max(0.0) as u32;
        let is_match = similarity >= self.number_threshold;
        let kind = if is_match { MatchKind::Close } else { MatchKind::Mismatch };
        Comparison::new(kind, is_match, similarity)
    }

    /// Case-insensitive text comparison.
    pub fn compare_text(&self, expected: &str, extracted: &str) -> Comparison {
        let a = expected.trim().to_lowercase();
        let b = extracted.trim().to_lowercase();
        if a == b {
            return Comparison::new(MatchKind::Exact, true, 100);
        }
        let similarity = char_overlap_percent(&a, &b) as u32;
        let is_match = similarity >= self.text_threshold;
        let kind = if is_match { MatchKind::Similar } else { MatchKind::Mismatch };
        Comparison::new(kind, is_match, similarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_name_after_normalization() {
        let m = FuzzyMatcher::new();
        let c = m.compare_names("Mr John Smith", "JOHN SMITH");
        assert_eq!(c.kind, MatchKind::Exact);
        assert_eq!(c.similarity, 100);
    }

    #[test]
    fn substring_name_is_partial_pass() {
        let m = FuzzyMatcher::new();
        let c = m.compare_names("ABEBE KEBEDE TESFAYE", "ABEBE KEBEDE");
        assert!(c.is_match);
        assert!(matches!(c.kind, MatchKind::Partial | MatchKind::Fuzzy));
    }

    #[test]
    fn unrelated_names_mismatch() {
        let m = FuzzyMatcher::new();
        let c = m.compare_names("ABEBE KEBEDE", "JOHN SMITH");
        assert_eq!(c.kind, MatchKind::Mismatch);
        assert!(!c.is_match);
    }

    #[test]
    fn dates_exact_close_and_decay() {
        let m = FuzzyMatcher::new();
        assert_eq!(m.compare_dates("2025-06-01", "01/06/2025").kind, MatchKind::Exact);

        let close = m.compare_dates("2025-06-01", "2025-06-02");
        assert_eq!(close.kind, MatchKind::Close);
        assert_eq!(close.similarity, 95);
        assert!(close.is_match);

        let far = m.compare_dates("2025-06-01", "2025-06-05");
        assert!(!far.is_match);
        assert_eq!(far.similarity, 80);

        assert_eq!(m.compare_dates("2025-01-01", "2025-12-31").similarity, 0);
    }

    #[test]
    fn unparseable_dates_fall_back_to_text() {
        let m = FuzzyMatcher::new();
        let c = m.compare_dates("next monday", "next monday");
        assert_eq!(c.kind, MatchKind::Exact);
    }

    #[test]
    fn numbers_within_five_percent() {
        let m = FuzzyMatcher::new();
        assert_eq!(m.compare_numbers(50_000.0, 50_000.0).kind, MatchKind::Exact);
        let close = m.compare_numbers(50_000.0, 49_000.0);
        assert!(close.is_match);
        assert_eq!(close.similarity, 97);
        assert!(!m.compare_numbers(50_000.0, 40_000.0).is_match);
    }

    #[test]
    fn tolerances_are_tunable() {
        let strict = FuzzyMatcher {
            date_tolerance_days: 0,
            ..FuzzyMatcher::default()
        };
        assert!(!strict.compare_dates("2025-06-01", "2025-06-02").is_match);
    }

    #[test]
    fn text_comparison_is_case_insensitive() {
        let m = FuzzyMatcher::new();
        assert_eq!(m.compare_text("Abidjan", "ABIDJAN ").kind, MatchKind::Exact);
        assert!(!m.compare_text("Abidjan", "Nairobi").is_match);
    }
}

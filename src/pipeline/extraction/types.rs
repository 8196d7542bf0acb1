use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    is_empty_value, DocumentType, ExtractedField, FieldMap, FieldSource, ValidationCheck,
};
use crate::parsing::parse_date;

/// Fields and validation verdicts produced by one extractor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractorOutput {
    pub fields: FieldMap,
    pub validations: Vec<ValidationCheck>,
}

/// Deterministic pattern-based extraction for one document type.
///
/// Implementations are pure and total: a pattern that does not match leaves
/// its field absent rather than failing the run.
pub trait FieldExtractor: Send + Sync {
    fn document_type(&self) -> DocumentType;

    /// Pull candidate fields out of OCR text.
    fn extract(&self, raw_text: &str) -> FieldMap;

    /// Type-specific predicates over the extracted fields. Date-relative
    /// checks are evaluated against `today`.
    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck>;

    fn run(&self, raw_text: &str, today: NaiveDate) -> ExtractorOutput {
        let fields = self.extract(raw_text);
        let validations = self.validate(&fields, today);
        ExtractorOutput { fields, validations }
    }
}

// ---------------------------------------------------------------------------
// Field building helpers
// ---------------------------------------------------------------------------

/// Accumulates extracted fields; empty values are dropped and the first
/// value recorded for a name wins.
pub struct FieldBuilder {
    fields: FieldMap,
    source: FieldSource,
}

impl FieldBuilder {
    pub fn new() -> Self {
        Self::with_source(FieldSource::Extractor)
    }

    pub fn with_source(source: FieldSource) -> Self {
        Self {
            fields: FieldMap::new(),
            source,
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>, confidence: f32) {
        let value = value.into();
        if is_empty_value(&value) || self.fields.contains_key(name) {
            return;
        }
        self.fields
            .insert(name.to_string(), ExtractedField::new(name, value, confidence, self.source));
    }

    pub fn set_opt<V: Into<Value>>(&mut self, name: &str, value: Option<V>, confidence: f32) {
        if let Some(v) = value {
            self.set(name, v, confidence);
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ExtractedField> {
        self.fields.get(name)
    }

    pub fn build(self) -> FieldMap {
        self.fields
    }
}

impl Default for FieldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// First capture group of the first matching pattern, trimmed.
pub fn capture_first(patterns: &[&Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Collapse runs of whitespace and uppercase.
pub fn clean_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// Date capture normalized to ISO `YYYY-MM-DD`, or the raw text when it
/// does not parse (so the structuring layer and reviewers still see it).
pub fn iso_or_raw(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

static RE_NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}|\d{1,2}[/\-.]\d{1,2}[/\-.](?:\d{4}|\d{2}))\b").unwrap()
});
static RE_ALPHA_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:ST|ND|RD|TH|ER)?[\s\-]?([A-ZÉÛ]{3,9})\.?[\s\-,]?(\d{4}|\d{2})\b").unwrap()
});

/// Every parseable date in `text`, in order of appearance. Handles numeric
/// dates and airline-style `01JUN25` / `1 June 2025` spellings.
pub fn find_dates(text: &str) -> Vec<NaiveDate> {
    let mut found: Vec<(usize, NaiveDate)> = RE_NUMERIC_DATE
        .captures_iter(text)
        .filter_map(|c| {
            let m = c.get(1)?;
            parse_date(m.as_str()).map(|d| (m.start(), d))
        })
        .collect();
    found.extend(RE_ALPHA_DATE.captures_iter(text).filter_map(|c| {
        let spelled = format!("{} {} {}", &c[1], &c[2], &c[3]);
        let start = c.get(0)?.start();
        parse_date(&spelled).map(|d| (start, d))
    }));
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, d)| d).collect()
}

/// `word` occurs in `text` delimited by non-alphanumerics.
pub fn has_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + word.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric()) && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Class of the first table row with a keyword present as a whole word.
pub fn keyword_class(text: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| has_word(text, w)))
        .map(|(class, _)| *class)
}

pub fn field_text(fields: &FieldMap, name: &str) -> Option<String> {
    match &fields.get(name)?.value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn field_date(fields: &FieldMap, name: &str) -> Option<NaiveDate> {
    field_text(fields, name).and_then(|s| parse_date(&s))
}

pub fn field_number(fields: &FieldMap, name: &str) -> Option<f64> {
    match &fields.get(name)?.value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn field_bool(fields: &FieldMap, name: &str) -> Option<bool> {
    fields.get(name)?.value.as_bool()
}

/// Shorthand for an extractor-sourced validation check.
pub fn check(name: &str, passed: bool) -> ValidationCheck {
    ValidationCheck::new(name, passed, FieldSource::Extractor)
}

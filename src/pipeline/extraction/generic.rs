use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use super::types::*;
use crate::models::{DocumentType, FieldMap, FieldSource, ValidationCheck};
use crate::parsing::parse_amount;

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,})\b").unwrap());
static RE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\+\d{1,3}[\s.\-]?(?:\d[\s.\-]?){7,12}\d)").unwrap());
static RE_PASSPORT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{1,2}\d{6,9})\b").unwrap());
static RE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d[\d\s.,]*\d\s*(?:XOF|FCFA|CFA|EUR|USD|ETB)|(?:XOF|FCFA|CFA|EUR|USD|ETB)\s*\d[\d\s.,]*\d)\b").unwrap()
});

const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Catch-all extractor for documents of unknown type: a handful of
/// type-agnostic patterns, tagged `regex_fallback`.
pub struct GenericExtractor;

impl GenericExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for GenericExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Other
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let mut b = FieldBuilder::with_source(FieldSource::RegexFallback);

        let dates: Vec<Value> = find_dates(raw_text)
            .into_iter()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .collect();
        if let Some(first) = dates.first() {
            b.set("date", first.clone(), FALLBACK_CONFIDENCE);
        }
        if dates.len() > 1 {
            b.set("dates", dates, FALLBACK_CONFIDENCE);
        }

        b.set_opt(
            "email",
            capture_first(&[&RE_EMAIL], raw_text).map(|e| e.to_lowercase()),
            FALLBACK_CONFIDENCE,
        );
        b.set_opt(
            "phone",
            capture_first(&[&RE_PHONE], raw_text)
                .map(|p| p.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect::<String>()),
            FALLBACK_CONFIDENCE,
        );
        b.set_opt(
            "passport_number",
            capture_first(&[&RE_PASSPORT_NUMBER], &raw_text.to_uppercase()),
            FALLBACK_CONFIDENCE,
        );
        if let Some(amount) = capture_first(&[&RE_AMOUNT], raw_text).and_then(|a| parse_amount(&a)) {
            b.set("amount", amount.value, FALLBACK_CONFIDENCE);
            b.set_opt("currency", amount.currency, FALLBACK_CONFIDENCE);
        }

        b.build()
    }

    fn validate(&self, _fields: &FieldMap, _today: NaiveDate) -> Vec<ValidationCheck> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_up_common_patterns() {
        let text = "Contact: Jane.Doe@Example.org, +251 911 234 567\n\
                    Ref passport EP1234567, issued 12/03/2020, paid 50 000 FCFA on 01/04/2025";
        let fields = GenericExtractor::new().extract(text);
        assert_eq!(field_text(&fields, "email").as_deref(), Some("jane.doe@example.org"));
        assert_eq!(field_text(&fields, "phone").as_deref(), Some("+251911234567"));
        assert_eq!(field_text(&fields, "passport_number").as_deref(), Some("EP1234567"));
        assert_eq!(field_text(&fields, "date").as_deref(), Some("2020-03-12"));
        assert_eq!(field_number(&fields, "amount"), Some(50_000.0));
        assert_eq!(field_text(&fields, "currency").as_deref(), Some("XOF"));
        assert!(fields.values().all(|f| f.source == FieldSource::RegexFallback));
    }

    #[test]
    fn empty_text_yields_nothing() {
        let out = GenericExtractor::new().run("", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(out.fields.is_empty());
        assert!(out.validations.is_empty());
    }
}

//! Text and date helpers shared by extractors, the canonical document layer
//! and the validators.
//!
//! Every function here is total: unparseable input yields `None`, never an
//! error, so callers can skip a derivation without aborting the evaluation.

use std::sync::LazyLock;

use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;

static RE_DAY_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})$").unwrap());
static RE_YEAR_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})(?:[T\s].*)?$").unwrap());
static RE_COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap());
static RE_DAY_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:ST|ND|RD|TH|ER)?[\s\-]+([A-ZÉÛ]+)\.?[\s\-,]+(\d{4}|\d{2})$").unwrap()
});
static RE_MONTH_NAME_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-ZÉÛ]+)\.?\s+(\d{1,2})(?:ST|ND|RD|TH)?,?\s+(\d{4})$").unwrap()
});
static RE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:[,.\s]\d{3})+|\d+)(?:[,.](\d{2}))?(?:\s*(XOF|FCFA|CFA|ETB|EUR|USD))?")
        .unwrap()
});

/// Two-digit years at or below this pivot are read as 20xx.
const TWO_DIGIT_YEAR_PIVOT: i32 = 40;

/// Parse a date written in any of the formats seen on dossier documents.
///
/// Numeric dates are read day-first (`DD/MM/YYYY`) unless they start with a
/// four-digit year. Month names are accepted in English and French, full or
/// abbreviated.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim().to_uppercase();
    if s.is_empty() || s == "N/A" {
        return None;
    }

    if let Some(c) = RE_YEAR_FIRST.captures(&s) {
        return ymd(num(&c[1])?, num(&c[2])?, num(&c[3])?);
    }
    if let Some(c) = RE_DAY_FIRST.captures(&s) {
        return ymd(expand_year(&c[3])?, num(&c[2])?, num(&c[1])?);
    }
    if let Some(c) = RE_COMPACT.captures(&s) {
        return ymd(num(&c[1])?, num(&c[2])?, num(&c[3])?);
    }
    if let Some(c) = RE_DAY_MONTH_NAME.captures(&s) {
        return ymd(expand_year(&c[3])?, month_from_name(&c[2])?, num(&c[1])?);
    }
    if let Some(c) = RE_MONTH_NAME_DAY.captures(&s) {
        return ymd(num(&c[3])?, month_from_name(&c[1])?, num(&c[2])?);
    }

    tracing::debug!(input, "Unrecognized date format");
    None
}

fn num<T: std::str::FromStr>(s: &str) -> Option<T> {
    s.parse().ok()
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_year(s: &str) -> Option<i32> {
    let year: i32 = num(s)?;
    if s.len() == 2 {
        Some(if year <= TWO_DIGIT_YEAR_PIVOT { 2000 + year } else { 1900 + year })
    } else {
        Some(year)
    }
}

/// Month number from an English or French month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    let folded = fold_diacritics(&name.to_uppercase());
    let month = match folded.as_str() {
        "JAN" | "JANUARY" | "JANV" | "JANVIER" => 1,
        "FEB" | "FEBRUARY" | "FEV" | "FEVR" | "FEVRIER" => 2,
        "MAR" | "MARCH" | "MARS" => 3,
        "APR" | "APRIL" | "AVR" | "AVRIL" => 4,
        "MAY" | "MAI" => 5,
        "JUN" | "JUNE" | "JUIN" => 6,
        "JUL" | "JULY" | "JUIL" | "JUILLET" => 7,
        "AUG" | "AUGUST" | "AOU" | "AOUT" => 8,
        "SEP" | "SEPT" | "SEPTEMBER" | "SEPTEMBRE" => 9,
        "OCT" | "OCTOBER" | "OCTOBRE" => 10,
        "NOV" | "NOVEMBER" | "NOVEMBRE" => 11,
        "DEC" | "DECEMBER" | "DECEMBRE" => 12,
        _ => return None,
    };
    Some(month)
}

/// Signed day count from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `date` shifted forward by `months`, clamped to the end of the month.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Age in completed years on `today`.
pub fn age_at(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Replace accented Latin letters with their unaccented form.
pub fn fold_diacritics(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => out.push('A'),
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'Ç' => out.push('C'),
            'ç' => out.push('c'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'Ñ' => out.push('N'),
            'ñ' => out.push('n'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => out.push('O'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => out.push('o'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('U'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'Ý' | 'Ÿ' => out.push('Y'),
            'ý' | 'ÿ' => out.push('y'),
            'Æ' => out.push_str("AE"),
            'æ' => out.push_str("ae"),
            'Œ' => out.push_str("OE"),
            'œ' => out.push_str("oe"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}

/// City key for equality checks: lowercase ASCII letters only.
pub fn normalize_city(city: &str) -> String {
    fold_diacritics(city.trim())
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// A monetary amount with an optional ISO currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    pub value: f64,
    pub currency: Option<String>,
}

/// Parse the first amount in `text`. `FCFA` and `CFA` normalize to `XOF`.
pub fn parse_amount(text: &str) -> Option<Amount> {
    let caps = RE_AMOUNT.captures(text)?;
    let integer: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
    let mut value: f64 = integer.parse().ok()?;
    if let Some(decimals) = caps.get(2) {
        let cents: f64 = decimals.as_str().parse().ok()?;
        value += cents / 100.0;
    }
    let currency = caps.get(3).map(|m| match m.as_str().to_uppercase().as_str() {
        "FCFA" | "CFA" => "XOF".to_string(),
        other => other.to_string(),
    });
    Some(Amount { value, currency })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_numeric_formats() {
        assert_eq!(parse_date("2025-06-01"), Some(d(2025, 6, 1)));
        assert_eq!(parse_date("01/06/2025"), Some(d(2025, 6, 1)));
        assert_eq!(parse_date("01-06-2025"), Some(d(2025, 6, 1)));
        assert_eq!(parse_date("01.06.2025"), Some(d(2025, 6, 1)));
        assert_eq!(parse_date("2025/06/01"), Some(d(2025, 6, 1)));
        assert_eq!(parse_date("20250601"), Some(d(2025, 6, 1)));
        assert_eq!(parse_date("2025-06-01T10:30:00Z"), Some(d(2025, 6, 1)));
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(parse_date("15 March 2025"), Some(d(2025, 3, 15)));
        assert_eq!(parse_date("15 MAR 25"), Some(d(2025, 3, 15)));
        assert_eq!(parse_date("March 15, 2025"), Some(d(2025, 3, 15)));
        assert_eq!(parse_date("1er août 2024"), Some(d(2024, 8, 1)));
        assert_eq!(parse_date("12 FEV 85"), Some(d(1985, 2, 12)));
    }

    #[test]
    fn rejects_garbage_and_invalid_days() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("N/A"), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("31/02/2025"), None);
    }

    #[test]
    fn age_counts_completed_years() {
        assert_eq!(age_at(d(2008, 6, 2), d(2026, 6, 1)), 17);
        assert_eq!(age_at(d(2008, 6, 1), d(2026, 6, 1)), 18);
    }

    #[test]
    fn add_months_clamps() {
        assert_eq!(add_months(d(2025, 8, 31), 6), d(2026, 2, 28));
    }

    #[test]
    fn folds_accents_and_normalizes_cities() {
        assert_eq!(fold_diacritics("Yaoundé"), "Yaounde");
        assert_eq!(normalize_city(" San-Pédro "), "sanpedro");
        assert_eq!(normalize_city("ABIDJAN"), normalize_city("Abidjan"));
    }

    #[test]
    fn parses_amounts_with_currency() {
        let a = parse_amount("Montant: 73 000 FCFA").unwrap();
        assert_eq!(a.value, 73_000.0);
        assert_eq!(a.currency.as_deref(), Some("XOF"));

        let b = parse_amount("1,234.56 EUR").unwrap();
        assert!((b.value - 1234.56).abs() < 1e-9);
        assert_eq!(b.currency.as_deref(), Some("EUR"));

        let c = parse_amount("150000").unwrap();
        assert_eq!(c.value, 150_000.0);
        assert_eq!(c.currency, None);
    }
}

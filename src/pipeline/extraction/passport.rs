use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::mrz::parse_td3;
use super::types::*;
use crate::models::{DocumentType, FieldMap, PassportType, ValidationCheck};
use crate::parsing::add_months;

static RE_SURNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:SURNAME|NOM DE FAMILLE|FAMILY\s*NAME|\bNOM\b)\s*[:./]*[ \t]*([A-Z][A-Z\-' ]+)$").unwrap()
});
static RE_GIVEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:GIVEN\s*NAMES?|PR[EÉ]NOMS?|FIRST\s*NAMES?)\s*[:./]*[ \t]*([A-Z][A-Z\-' ]+)$").unwrap()
});
static RE_DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:DATE\s*OF\s*BIRTH|DATE\s*DE\s*NAISSANCE|\bDOB\b|BIRTH\s*DATE|N[EÉ]\(?E?\)?\s*LE)\s*[:./]*\s*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}\s+[A-Z]{3,9}\.?\s+\d{2,4})").unwrap()
});
static RE_EXPIRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:DATE\s*OF\s*EXPIRY|EXPIRY\s*DATE|EXPIRES?|VALID\s*UNTIL|EXPIRATION)\s*[:./]*\s*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}\s+[A-Z]{3,9}\.?\s+\d{2,4})").unwrap()
});
static RE_ISSUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:DATE\s*OF\s*ISSUE|DATE\s*(?:DE\s*)?D[EÉ]LIVRANCE|ISSUE\s*DATE)\s*[:./]*\s*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}\s+[A-Z]{3,9}\.?\s+\d{2,4})").unwrap()
});
static RE_PLACE_OF_BIRTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:PLACE\s*OF\s*BIRTH|LIEU\s*DE\s*NAISSANCE)\s*[:./]*[ \t]*([A-Z][A-Z\-', ]+)$").unwrap()
});
static RE_NATIONALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:NATIONALITY|NATIONALIT[EÉ])\s*[:./]*\s*([A-Z]+)").unwrap()
});
static RE_NUMBER_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:PASSPORT|PASSEPORT)\s*(?:NO\.?|NUMBER|N[°O]?)\s*[:.]?\s*([A-Z]{1,2}\d{6,9})\b").unwrap()
});
static RE_NUMBER_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{1,2}\d{6,9})\b").unwrap());
static RE_NUMBER_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{1,2}\d{6,9}$|^[A-Z0-9]{6,9}$").unwrap());
static RE_SEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bSEX|SEXE)\s*[:./]*\s*(MALE|FEMALE|MASCULIN|F[EÉ]MININ|M|F)\b").unwrap()
});
static RE_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:ISSUING\s*AUTHORITY|AUTHORITY|AUTORIT[EÉ])\s*[:./]*[ \t]*([A-Z][A-Z \-.]+)$").unwrap()
});

const MRZ_CONFIDENCE: f32 = 0.95;
const MRZ_UNVERIFIED_CONFIDENCE: f32 = 0.7;
const VIZ_CONFIDENCE: f32 = 0.8;

/// Passport extractor: MRZ first, visual zone as fallback.
///
/// MRZ values win on merge because they are check-digit protected, except
/// for names, where the MRZ truncates and drops accents.
pub struct PassportExtractor;

impl PassportExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassportExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn iso(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn normalize_sex(raw: &str) -> String {
    match raw.to_uppercase().chars().next() {
        Some('M') => "M".to_string(),
        _ => "F".to_string(),
    }
}

impl FieldExtractor for PassportExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Passport
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let mut b = FieldBuilder::new();
        let today = chrono::Local::now().date_naive();

        // Step 1: visual-zone names take precedence
        b.set_opt("surname", capture_first(&[&RE_SURNAME], raw_text).map(|s| clean_name(&s)), VIZ_CONFIDENCE);
        b.set_opt("given_names", capture_first(&[&RE_GIVEN], raw_text).map(|s| clean_name(&s)), VIZ_CONFIDENCE);

        // Step 2: MRZ for everything it carries
        if let Some(mrz) = parse_td3(raw_text, today) {
            let conf = if mrz.checks.all_valid() { MRZ_CONFIDENCE } else { MRZ_UNVERIFIED_CONFIDENCE };
            b.set("surname", mrz.surname.clone(), conf);
            b.set("given_names", mrz.given_names.clone(), conf);
            b.set("passport_number", mrz.passport_number.clone(), conf);
            b.set("nationality", mrz.nationality.clone(), conf);
            b.set("issuing_country", mrz.issuing_country.clone(), conf);
            b.set_opt("date_of_birth", iso(mrz.date_of_birth), conf);
            b.set_opt("expiry_date", iso(mrz.expiry_date), conf);
            b.set_opt("sex", mrz.sex.clone(), conf);
            b.set("passport_type", PassportType::from_mrz_code(&mrz.document_code).as_str(), conf);
            b.set("mrz_line1", mrz.line1.clone(), conf);
            b.set("mrz_line2", mrz.line2.clone(), conf);
            b.set("mrz_valid", mrz.checks.all_valid(), 1.0);
        }

        // Step 3: visual zone fills what the MRZ did not provide
        let number = capture_first(&[&RE_NUMBER_LABELED, &RE_NUMBER_BARE], raw_text);
        b.set_opt("passport_number", number.map(|n| n.to_uppercase()), VIZ_CONFIDENCE);
        b.set_opt("nationality", capture_first(&[&RE_NATIONALITY], raw_text).map(|s| s.to_uppercase()), VIZ_CONFIDENCE);
        b.set_opt("date_of_birth", capture_first(&[&RE_DOB], raw_text).map(|s| iso_or_raw(&s)), VIZ_CONFIDENCE);
        b.set_opt("expiry_date", capture_first(&[&RE_EXPIRY], raw_text).map(|s| iso_or_raw(&s)), VIZ_CONFIDENCE);
        b.set_opt("issue_date", capture_first(&[&RE_ISSUE], raw_text).map(|s| iso_or_raw(&s)), VIZ_CONFIDENCE);
        b.set_opt("place_of_birth", capture_first(&[&RE_PLACE_OF_BIRTH], raw_text).map(|s| clean_name(&s)), VIZ_CONFIDENCE);
        b.set_opt("sex", capture_first(&[&RE_SEX], raw_text).map(|s| normalize_sex(&s)), VIZ_CONFIDENCE);
        b.set_opt("issuing_authority", capture_first(&[&RE_AUTHORITY], raw_text).map(|s| clean_name(&s)), VIZ_CONFIDENCE);

        if b.has("passport_number") || b.has("surname") {
            b.set("passport_type", PassportType::Ordinaire.as_str(), 0.5);
        }

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        if let Some(valid) = field_bool(fields, "mrz_valid") {
            checks.push(check("mrz_checksum_valid", valid));
        }
        if let Some(expiry) = field_date(fields, "expiry_date") {
            checks.push(check("expiry_valid", expiry > today));
            checks.push(check("expiry_6months", expiry > add_months(today, 6)));
        }
        if let Some(number) = field_text(fields, "passport_number") {
            checks.push(check("passport_number_format", RE_NUMBER_FORMAT.is_match(&number)));
        }
        checks.push(check(
            "holder_identified",
            fields.contains_key("surname") && fields.contains_key("given_names"),
        ));

        checks
    }
}

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::types::*;
use crate::models::{DocumentType, FieldMap, ValidationCheck};
use crate::parsing::fold_diacritics;
use crate::reference::is_in_jurisdiction;

const DATE: &str = r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2}";

static RE_SURNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:SURNAME|FAMILY\s*NAME|^[ \t]*NOM)\s*:[ \t]*([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_GIVEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:GIVEN\s*NAMES?|FIRST\s*NAMES?|PRENOMS?)\s*:[ \t]*([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_FULL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:FULL\s*NAME|HOLDER|TITULAIRE|NOM\s+ET\s+PRENOMS?|\bNAME)\s*:[ \t]*([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:CARD|CARTE|PERMIT|PERMIS|RESIDENCE|RESIDENT)\s*(?:NO\.?|N°|NUMBER)[.:\s]*([A-Z0-9][A-Z0-9\-/]{4,})").unwrap()
});
static RE_CARD_NUMBER_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(RP[/\-]?\d{6,})\b").unwrap());
static RE_NATIONALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:NATIONALITY|NATIONALITE|CITIZEN\s*OF|COUNTRY\s*OF\s*ORIGIN)\s*:?[ \t]*([A-Z][A-Z ]+?)[ \t]*$").unwrap()
});
static RE_DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:DATE\s*OF\s*BIRTH|\bDOB|NAISSANCE|\bBORN|NE\(E\))[:\s]*({DATE})")).unwrap()
});
static RE_ISSUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:ISSUE\s*DATE|DATE\s*(?:OF\s*)?ISSUE|DELIVRANCE|EMIS\s*LE|VALID\s*FROM|VALABLE\s*DU)[:\s]*({DATE})"
    ))
    .unwrap()
});
static RE_EXPIRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:EXPIRY\s*DATE|DATE\s*OF\s*EXPIRY|EXPIR(?:Y|ES?|ATION)|VALID\s*UNTIL|VALABLE\s*JUSQU'?(?:AU)?)[:\s]*({DATE})"
    ))
    .unwrap()
});
static RE_EMPLOYER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:EMPLOYER|EMPLOYEUR|COMPANY|SOCIETE)\s*:[ \t]*([A-Z][A-Z0-9 \-.&']+?)[ \t]*$").unwrap()
});
static RE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:ADDRESS|ADRESSE)\s*:[ \t]*([^\n]+?)[ \t]*$").unwrap());

/// Residence categories and their keywords, most specific first.
const RESIDENCE_TYPES: &[(&str, &[&str])] = &[
    ("WORK", &["WORK PERMIT", "PERMIS DE TRAVAIL", "TRAVAIL", "EMPLOYMENT", "EMPLOI"]),
    ("STUDY", &["STUDENT", "ETUDIANT", "STUDIES", "ETUDES", "ACADEMIC"]),
    ("FAMILY", &["FAMILY", "FAMILLE", "DEPENDANT", "SPOUSE", "REGROUPEMENT"]),
    ("REFUGEE", &["REFUGEE", "REFUGIE", "ASYLUM", "ASILE", "UNHCR", "HCR"]),
    ("PERMANENT", &["PERMANENT", "INDEFINITE", "LONG TERM", "RESIDENT CARD"]),
    ("DIPLOMATIC", &["DIPLOMATIC", "DIPLOMATIQUE", "OFFICIAL", "MISSION"]),
];

/// Issuing countries recognized on the card face, by alpha-3 code.
const ISSUING_COUNTRIES: &[(&str, &[&str])] = &[
    ("ETH", &["ETHIOPIA", "ETHIOPIE", "FEDERAL DEMOCRATIC REPUBLIC"]),
    ("DJI", &["DJIBOUTI"]),
    ("ERI", &["ERITREA", "ERYTHREE"]),
    ("KEN", &["KENYA"]),
    ("UGA", &["UGANDA", "OUGANDA"]),
    ("SOM", &["SOMALIA", "SOMALIE"]),
    ("SSD", &["SOUTH SUDAN", "SOUDAN DU SUD"]),
];

const PHOTO_MARKERS: &[&str] = &["PHOTO", "PHOTOGRAPH", "PICTURE"];

const LABEL_CONFIDENCE: f32 = 0.8;
const FALLBACK_CONFIDENCE: f32 = 0.6;

/// Residence permit / card extractor. Applicants residing in a
/// jurisdiction country prove residence with it.
pub struct ResidenceCardExtractor;

impl ResidenceCardExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResidenceCardExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ResidenceCardExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::ResidenceCard
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = fold_diacritics(&raw_text.to_uppercase());
        let mut b = FieldBuilder::new();

        let surname = capture_first(&[&RE_SURNAME], &text).map(|n| clean_name(&n));
        let given = capture_first(&[&RE_GIVEN], &text).map(|n| clean_name(&n));
        if let (Some(surname), Some(given)) = (&surname, &given) {
            b.set("holder_name", format!("{given} {surname}"), LABEL_CONFIDENCE);
        }
        b.set_opt(
            "holder_name",
            capture_first(&[&RE_FULL_NAME], &text).map(|n| clean_name(&n)),
            LABEL_CONFIDENCE,
        );
        b.set_opt("surname", surname, LABEL_CONFIDENCE);
        b.set_opt("given_names", given, LABEL_CONFIDENCE);

        let card_number = capture_first(&[&RE_CARD_NUMBER], &text)
            .filter(|n| n.chars().any(|c| c.is_ascii_digit()))
            .map(|n| (n, LABEL_CONFIDENCE))
            .or_else(|| capture_first(&[&RE_CARD_NUMBER_BARE], &text).map(|n| (n, FALLBACK_CONFIDENCE)));
        if let Some((number, confidence)) = card_number {
            b.set("card_number", number, confidence);
        }

        b.set_opt(
            "nationality",
            capture_first(&[&RE_NATIONALITY], &text).map(|n| clean_name(&n)),
            LABEL_CONFIDENCE,
        );
        b.set_opt("date_of_birth", capture_first(&[&RE_DOB], &text).map(|d| iso_or_raw(&d)), LABEL_CONFIDENCE);
        b.set_opt("issue_date", capture_first(&[&RE_ISSUE], &text).map(|d| iso_or_raw(&d)), LABEL_CONFIDENCE);
        b.set_opt("expiry_date", capture_first(&[&RE_EXPIRY], &text).map(|d| iso_or_raw(&d)), LABEL_CONFIDENCE);

        b.set_opt("issuing_country", keyword_class(&text, ISSUING_COUNTRIES), FALLBACK_CONFIDENCE);
        b.set_opt("residence_type", keyword_class(&text, RESIDENCE_TYPES), FALLBACK_CONFIDENCE);
        b.set_opt(
            "employer",
            capture_first(&[&RE_EMPLOYER], &text).map(|n| clean_name(&n)),
            FALLBACK_CONFIDENCE,
        );
        b.set_opt("address", capture_first(&[&RE_ADDRESS], &text), FALLBACK_CONFIDENCE);
        b.set(
            "photo_present",
            PHOTO_MARKERS.iter().any(|m| has_word(&text, m)),
            FALLBACK_CONFIDENCE,
        );

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        if let Some(expiry) = field_date(fields, "expiry_date") {
            checks.push(check("card_not_expired", expiry > today));
        }
        checks.push(check("holder_identified", fields.contains_key("holder_name")));
        if let Some(country) = field_text(fields, "issuing_country") {
            checks.push(check("issuing_country_in_jurisdiction", is_in_jurisdiction(&country)));
        }
        if let Some(number) = field_text(fields, "card_number") {
            checks.push(check("card_number_valid", number.chars().count() >= 6));
        }
        checks.push(check("photo_present", field_bool(fields, "photo_present") == Some(true)));

        checks
    }
}

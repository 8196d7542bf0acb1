use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use super::types::*;
use crate::models::{DocumentType, FieldMap, ValidationCheck};

static RE_HOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:\bNAME|\bNOM|HOLDER|TITULAIRE)\s*(?:/\s*(?:NOM|NAME)\s*)?:[ \t]*([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:DATE\s*OF\s*BIRTH|DATE\s*DE\s*NAISSANCE|\bDOB|N[EÉ]\(E\)\s*LE)[:\s]*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4})").unwrap()
});
static RE_CERTIFICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:CERTIFICATE|CERTIFICAT|ICV|YELLOW\s*CARD)\s*(?:NO\.?|N°|NUMBER)\s*[:\s]*([A-Z0-9][A-Z0-9\-/]{3,})").unwrap()
});
static RE_YELLOW_FEVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Y[E3]LL[O0]W\s*F[E3][AV][E3]R|FI[E3É]VR[E3]\s*J[AU][UN][E3]|AM[AE]R[I1]L|STAMARIL|\bYF[\-\s]?VAX").unwrap()
});
/// Yellow-fever label followed by its date within a short window.
static RE_YF_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Y[E3]LL[O0]W\s*F[E3][AV][E3]R|FI[E3É]VR[E3]\s*J[AU][UN][E3]|AM[AE]R[I1]L|STAMARIL|17D)[^0-9]{0,30}(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}\s*[A-Z]{3,9}\s*\d{2,4})").unwrap()
});
static RE_DATE_BEFORE_YF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4})[^A-Z0-9]{0,10}(?:YELLOW|JAUNE|AMARIL)").unwrap()
});
static RE_VACCINATION_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:DATE\s*(?:OF\s*)?VACCINATION|VACCINATION|VACCIN[EÉ]?)[^0-9\n]{0,20}(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2})").unwrap()
});
static RE_CENTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:CENTER|CENTRE|CLINIC|CLINIQUE|HOSPITAL|H[OÔ]PITAL|ADMINISTERED\s*BY|VACCINATED\s*AT)\s*:[ \t]*([A-Z][A-Z \-.']+?)[ \t]*$").unwrap()
});
static RE_BATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\bLOT|BATCH)\s*(?:NO\.?|N°)?[:\s#]*([A-Z0-9][A-Z0-9\-]{2,})").unwrap());

/// Days after vaccination before the certificate takes effect.
pub const VALIDITY_WINDOW_DAYS: i64 = 10;
/// Yellow-fever certificates are valid for life once effective.
pub const LIFETIME: &str = "LIFETIME";

const LABEL_CONFIDENCE: f32 = 0.8;
const FALLBACK_CONFIDENCE: f32 = 0.6;

/// International certificate of vaccination (yellow card) extractor.
pub struct VaccinationExtractor;

impl VaccinationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VaccinationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VaccinationExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Vaccination
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = raw_text.to_uppercase();
        let mut b = FieldBuilder::new();

        b.set_opt("holder_name", capture_first(&[&RE_HOLDER], &text).map(|n| clean_name(&n)), LABEL_CONFIDENCE);
        b.set_opt("date_of_birth", capture_first(&[&RE_DOB], &text).map(|d| iso_or_raw(&d)), LABEL_CONFIDENCE);
        b.set_opt("certificate_number", capture_first(&[&RE_CERTIFICATE], &text), LABEL_CONFIDENCE);

        let present = RE_YELLOW_FEVER.is_match(&text);
        b.set("yellow_fever_present", present, LABEL_CONFIDENCE);
        if present {
            let date = capture_first(&[&RE_YF_DATE, &RE_DATE_BEFORE_YF], &text)
                .and_then(|d| find_dates(&d).into_iter().next());
            let (date, confidence) = match date {
                Some(d) => (Some(d), LABEL_CONFIDENCE),
                // A yellow-fever card with one vaccination date.
                None => (
                    capture_first(&[&RE_VACCINATION_DATE], &text).and_then(|d| find_dates(&d).into_iter().next()),
                    FALLBACK_CONFIDENCE,
                ),
            };
            if let Some(d) = date {
                b.set("yellow_fever_date", d.format("%Y-%m-%d").to_string(), confidence);
                let valid_from = d + Duration::days(VALIDITY_WINDOW_DAYS);
                b.set("valid_from", valid_from.format("%Y-%m-%d").to_string(), confidence);
                b.set("valid_until", LIFETIME, confidence);
            }
        }

        b.set_opt("vaccination_center", capture_first(&[&RE_CENTER], &text).map(|c| clean_name(&c)), FALLBACK_CONFIDENCE);
        b.set_opt("batch_number", capture_first(&[&RE_BATCH], &text), FALLBACK_CONFIDENCE);

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        let date = field_date(fields, "yellow_fever_date");
        checks.push(check("yellow_fever_present", date.is_some()));
        if let Some(d) = date {
            checks.push(check("vaccination_date_valid", d <= today));
            let valid_from = d + Duration::days(VALIDITY_WINDOW_DAYS);
            checks.push(check("yellow_fever_valid", valid_from <= today));
        }
        if let Some(number) = field_text(fields, "certificate_number") {
            checks.push(check("certificate_format_valid", number.chars().count() >= 6));
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "\
INTERNATIONAL CERTIFICATE OF VACCINATION OR PROPHYLAXIS
Name: Abebe Kebede Tesfaye
Date of birth: 12/03/1988
Certificate No: ETH-2019-004512
Yellow Fever / Fièvre jaune   14/02/2019   Stamaril
Batch: R8J231
Vaccinated at: Addis Ababa Health Center
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    #[test]
    fn extracts_yellow_card() {
        let fields = VaccinationExtractor::new().extract(CARD);
        assert_eq!(field_text(&fields, "holder_name").as_deref(), Some("ABEBE KEBEDE TESFAYE"));
        assert_eq!(field_text(&fields, "date_of_birth").as_deref(), Some("1988-03-12"));
        assert_eq!(field_text(&fields, "certificate_number").as_deref(), Some("ETH-2019-004512"));
        assert_eq!(field_bool(&fields, "yellow_fever_present"), Some(true));
        assert_eq!(field_text(&fields, "yellow_fever_date").as_deref(), Some("2019-02-14"));
        assert_eq!(field_text(&fields, "valid_until").as_deref(), Some(LIFETIME));
        assert_eq!(field_text(&fields, "batch_number").as_deref(), Some("R8J231"));
    }

    #[test]
    fn tolerates_ocr_noise_in_label() {
        let fields = VaccinationExtractor::new().extract("Y3LL0W FEVER 01/01/2020");
        assert_eq!(field_text(&fields, "yellow_fever_date").as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn recent_vaccination_not_yet_effective() {
        let out = VaccinationExtractor::new().run("YELLOW FEVER 10/05/2025", today());
        let get = |name: &str| out.validations.iter().find(|c| c.name == name).map(|c| c.passed);
        assert_eq!(get("yellow_fever_present"), Some(true));
        assert_eq!(get("vaccination_date_valid"), Some(true));
        assert_eq!(get("yellow_fever_valid"), Some(false));
    }

    #[test]
    fn card_without_yellow_fever_fails_presence() {
        let out = VaccinationExtractor::new().run("COVID-19 VACCINATION 01/03/2021", today());
        assert_eq!(field_bool(&out.fields, "yellow_fever_present"), Some(false));
        let present = out.validations.iter().find(|c| c.name == "yellow_fever_present").unwrap();
        assert!(!present.passed);
    }
}

use serde_json::Value;

use crate::config::thresholds;
use crate::matching::{Comparison, FuzzyMatcher, MatchKind};
use crate::models::{is_empty_value, DocumentType};
use crate::reference::country_code;

use super::types::*;

/// Fields compared as person names.
const NAME_FIELDS: &[&str] = &[
    "full_name",
    "passenger_name",
    "guest_name",
    "patient_name",
    "invitee_name",
    "holder_name",
    "applicant_name",
    "diplomat_name",
    "surname",
    "given_names",
    "inviter_name",
];

/// Fields compared as dates.
const DATE_FIELDS: &[&str] = &[
    "departure_date",
    "return_date",
    "check_in",
    "check_out",
    "visit_from",
    "visit_to",
    "vaccination_date",
    "date_of_birth",
    "expiry_date",
    "issue_date",
];

/// Alternative names an extractor may have used for an expected field.
const FIELD_VARIATIONS: &[(&str, &[&str])] = &[
    ("full_name", &["name", "passenger_name", "guest_name", "holder_name", "patient_name"]),
    ("patient_name", &["holder_name", "full_name", "name"]),
    ("applicant_name", &["payer", "payer_name", "full_name", "name"]),
    ("total_amount", &["amount", "amount_paid"]),
    ("surname", &["last_name", "family_name"]),
    ("given_names", &["first_name", "first_names", "forename"]),
    ("check_in", &["check_in_date", "checkin", "arrival_date"]),
    ("check_out", &["check_out_date", "checkout", "departure_date"]),
    ("date_of_birth", &["dob", "birth_date", "birthdate"]),
    ("departure_date", &["depart_date", "outbound_date"]),
    ("return_date", &["return", "inbound_date", "arrival_date"]),
    ("visit_from", &["date_from", "arrival_date", "dates.from"]),
    ("visit_to", &["date_to", "departure_date", "dates.to"]),
    ("passport_number", &["document_number", "invitee_passport_number", "diplomat_passport_number"]),
    ("nationality", &["invitee_nationality", "nationality_code"]),
];

const HIGH_SEVERITY_FIELDS: &[&str] = &["full_name", "surname", "given_names", "passport_number", "date_of_birth"];
const MEDIUM_SEVERITY_FIELDS: &[&str] = &["departure_date", "return_date", "check_in", "check_out", "nationality"];

pub fn is_name_field(field: &str) -> bool {
    NAME_FIELDS.contains(&field) || field.ends_with("_surname") || field.ends_with("_given_names")
}

pub fn is_date_field(field: &str) -> bool {
    DATE_FIELDS.contains(&field)
}

/// Compared by alpha-3 code so "ETH" matches "ETHIOPIAN".
pub fn is_nationality_field(field: &str) -> bool {
    field == "nationality" || field.ends_with("_nationality")
}

pub fn severity_for(field: &str) -> DiscrepancySeverity {
    if HIGH_SEVERITY_FIELDS.contains(&field) || is_name_field(field) {
        DiscrepancySeverity::High
    } else if MEDIUM_SEVERITY_FIELDS.contains(&field) {
        DiscrepancySeverity::Medium
    } else {
        DiscrepancySeverity::Low
    }
}

fn get_path<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    (!is_empty_value(current)).then_some(current)
}

fn get_with_variations<'a>(field: &str, extracted: &'a Value) -> Option<&'a Value> {
    get_path(extracted, field).or_else(|| {
        FIELD_VARIATIONS
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, variations)| variations.iter().find_map(|v| get_path(extracted, v)))
    })
}

/// Resolve `field` in the extracted document, trying known variations.
/// `<role>_surname` and `<role>_given_names` fall back to the role's full
/// name (under any of its variations), which a name comparison then matches
/// by containment.
pub fn find_matching_field<'a>(field: &str, extracted: &'a Value) -> Option<&'a Value> {
    if let Some(value) = get_with_variations(field, extracted) {
        return Some(value);
    }
    for suffix in ["_surname", "_given_names"] {
        if let Some(role) = field.strip_suffix(suffix) {
            let generic = &suffix[1..];
            return get_path(extracted, generic)
                .or_else(|| get_with_variations(&format!("{role}_name"), extracted))
                .or_else(|| get_path(extracted, "full_name"));
        }
    }
    None
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Compares extracted documents with the values the dossier predicts.
#[derive(Debug, Clone, Default)]
pub struct CrossDocumentSync {
    matcher: FuzzyMatcher,
}

impl CrossDocumentSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matcher(matcher: FuzzyMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    fn compare_values(&self, field: &str, expected: &Value, extracted: &Value) -> Comparison {
        let expected_text = value_text(expected);
        let extracted_text = value_text(extracted);
        if is_name_field(field) {
            return self.matcher.compare_names(&expected_text, &extracted_text);
        }
        if is_date_field(field) {
            return self.matcher.compare_dates(&expected_text, &extracted_text);
        }
        if is_nationality_field(field) {
            if let (Some(a), Some(b)) = (country_code(&expected_text), country_code(&extracted_text)) {
                return self.matcher.compare_text(&a, &b);
            }
        }
        if let (Some(a), Some(b)) = (value_number(expected), value_number(extracted)) {
            return self.matcher.compare_numbers(a, b);
        }
        self.matcher.compare_text(&expected_text, &extracted_text)
    }

    /// Classify every non-empty expected field as a match or a discrepancy.
    ///
    /// Both sides are JSON objects of field name to value.
    pub fn compare_and_validate(
        &self,
        extracted: &Value,
        expected: &Value,
        document_type: DocumentType,
    ) -> SyncResult {
        let mut matches = Vec::new();
        let mut discrepancies = Vec::new();
        let mut total_fields = 0usize;

        let expected_fields = expected.as_object().into_iter().flatten();
        for (field, expected_value) in expected_fields {
            if is_empty_value(expected_value) {
                continue;
            }
            total_fields += 1;

            let Some(extracted_value) = find_matching_field(field, extracted) else {
                discrepancies.push(Discrepancy {
                    field: field.clone(),
                    kind: MatchKind::Missing,
                    expected: expected_value.clone(),
                    extracted: None,
                    similarity: 0,
                    severity: severity_for(field),
                    message: None,
                });
                continue;
            };

            let comparison = self.compare_values(field, expected_value, extracted_value);
            if comparison.is_match {
                matches.push(FieldMatch {
                    field: field.clone(),
                    kind: comparison.kind,
                    value: extracted_value.clone(),
                    similarity: comparison.similarity,
                });
            } else {
                discrepancies.push(Discrepancy {
                    field: field.clone(),
                    kind: comparison.kind,
                    expected: expected_value.clone(),
                    extracted: Some(extracted_value.clone()),
                    similarity: comparison.similarity,
                    severity: severity_for(field),
                    message: comparison.message,
                });
            }
        }

        let matched_fields = matches.len();
        let overall_score = if total_fields > 0 {
            (matched_fields * 100 / total_fields) as u32
        } else {
            0
        };
        let has_high = discrepancies
            .iter()
            .any(|d| d.severity == DiscrepancySeverity::High);
        let valid = overall_score >= thresholds::SYNC_MATCH && !has_high;

        tracing::debug!(
            document_type = %document_type,
            overall_score,
            discrepancies = discrepancies.len(),
            "Compared extracted document with expected values"
        );

        SyncResult {
            document_type,
            valid,
            has_prefill: true,
            overall_score,
            total_fields,
            matched_fields,
            requires_user_confirmation: !discrepancies.is_empty(),
            matches,
            discrepancies,
        }
    }
}

fn field_label(field: &str) -> String {
    let label = match field {
        "full_name" => "Full name",
        "surname" => "Surname",
        "given_names" => "Given names",
        "date_of_birth" => "Date of birth",
        "check_in" => "Check-in date",
        "check_out" => "Check-out date",
        "departure_date" => "Departure date",
        "return_date" => "Return date",
        "passport_number" => "Passport number",
        "nationality" => "Nationality",
        other => return other.replace('_', " "),
    };
    label.to_string()
}

/// One-line message for the applicant describing a discrepancy.
pub fn format_discrepancy_message(discrepancy: &Discrepancy) -> String {
    let label = field_label(&discrepancy.field);
    let expected = value_text(&discrepancy.expected);
    match (&discrepancy.kind, &discrepancy.extracted) {
        (MatchKind::Missing, _) | (_, None) => {
            format!("{label}: not found in document (expected: {expected})")
        }
        (_, Some(extracted)) => {
            format!("{label}: '{}' differs from '{expected}'", value_text(extracted))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matching_document_is_valid() {
        let sync = CrossDocumentSync::new();
        let expected = json!({
            "guest_name": "ABEBE KEBEDE TESFAYE",
            "check_in": "2025-06-01",
            "check_out": "2025-06-15",
        });
        let extracted = json!({
            "guest_name": "Mr Abebe Kebede Tesfaye",
            "check_in_date": "01/06/2025",
            "check_out_date": "16/06/2025",
        });
        let result = sync.compare_and_validate(&extracted, &expected, DocumentType::Hotel);
        assert!(result.valid);
        assert_eq!(result.overall_score, 100);
        assert_eq!(result.matched_fields, 3);
        assert!(!result.requires_user_confirmation);
    }

    #[test]
    fn missing_name_is_high_severity() {
        let sync = CrossDocumentSync::new();
        let expected = json!({"passenger_name": "ABEBE KEBEDE", "flight_number": ""});
        let result = sync.compare_and_validate(&json!({}), &expected, DocumentType::Ticket);
        assert_eq!(result.total_fields, 1);
        assert!(!result.valid);
        let d = &result.discrepancies[0];
        assert_eq!(d.kind, MatchKind::Missing);
        assert_eq!(d.severity, DiscrepancySeverity::High);
        assert_eq!(
            format_discrepancy_message(d),
            "passenger name: not found in document (expected: ABEBE KEBEDE)"
        );
    }

    #[test]
    fn date_mismatch_is_medium() {
        let sync = CrossDocumentSync::new();
        let expected = json!({"departure_date": "2025-06-01"});
        let extracted = json!({"departure_date": "2025-06-10"});
        let result = sync.compare_and_validate(&extracted, &expected, DocumentType::Ticket);
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.discrepancies[0].severity, DiscrepancySeverity::Medium);
        assert_eq!(result.discrepancies[0].similarity, 55);
        assert_eq!(
            format_discrepancy_message(&result.discrepancies[0]),
            "Departure date: '2025-06-10' differs from '2025-06-01'"
        );
    }

    #[test]
    fn surname_falls_back_to_full_name() {
        let extracted = json!({"guest_name": "ABEBE KEBEDE TESFAYE"});
        assert_eq!(
            find_matching_field("guest_surname", &extracted),
            Some(&json!("ABEBE KEBEDE TESFAYE"))
        );
        let sync = CrossDocumentSync::new();
        let result = sync.compare_and_validate(
            &extracted,
            &json!({"guest_surname": "TESFAYE"}),
            DocumentType::Hotel,
        );
        assert!(result.valid);
    }

    #[test]
    fn amounts_compare_numerically() {
        let sync = CrossDocumentSync::new();
        let result = sync.compare_and_validate(
            &json!({"total_amount": "124000"}),
            &json!({"total_amount": 125000}),
            DocumentType::Payment,
        );
        assert!(result.valid);
        assert_eq!(result.matches[0].kind, MatchKind::Close);
    }

    #[test]
    fn severity_table() {
        assert_eq!(severity_for("passport_number"), DiscrepancySeverity::High);
        assert_eq!(severity_for("invitee_surname"), DiscrepancySeverity::High);
        assert_eq!(severity_for("nationality"), DiscrepancySeverity::Medium);
        assert_eq!(severity_for("hotel_name"), DiscrepancySeverity::Low);
    }

    #[test]
    fn role_names_resolve_through_extractor_aliases() {
        let card = json!({"holder_name": "ABEBE KEBEDE TESFAYE"});
        assert_eq!(find_matching_field("patient_name", &card), Some(&json!("ABEBE KEBEDE TESFAYE")));
        assert_eq!(find_matching_field("patient_surname", &card), Some(&json!("ABEBE KEBEDE TESFAYE")));

        let receipt = json!({"payer": "ABEBE KEBEDE TESFAYE", "amount": 50000.0});
        assert_eq!(find_matching_field("applicant_surname", &receipt), Some(&json!("ABEBE KEBEDE TESFAYE")));
        assert_eq!(find_matching_field("total_amount", &receipt), Some(&json!(50000.0)));

        let sync = CrossDocumentSync::new();
        let expected = json!({"patient_name": "ABEBE KEBEDE TESFAYE", "patient_surname": "TESFAYE"});
        let result = sync.compare_and_validate(&card, &expected, DocumentType::Vaccination);
        assert!(result.valid, "{result:?}");
        assert_eq!(result.overall_score, 100);
    }
}

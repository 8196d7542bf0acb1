use crate::models::DocumentType;

pub const STRUCTURING_SYSTEM_PROMPT: &str = r#"
You are a travel document extraction assistant for a visa application desk.
Your ONLY role is to convert raw OCR text of one document into structured
fields. You extract information that is explicitly present in the document.

RULES:
1. Extract ONLY information explicitly stated in the document.
2. NEVER guess, complete or correct names, numbers or dates.
3. If a field is unclear or missing, output null for that field.
4. Dates are written YYYY-MM-DD.
5. Output MUST be a single valid JSON object wrapped in ```json``` fences.
"#;

/// Field names requested from the model, per document type. These are the
/// same names the pattern extractors produce, so merging is by key.
fn requested_fields(document_type: DocumentType) -> &'static [&'static str] {
    match document_type {
        DocumentType::Passport => &[
            "surname",
            "given_names",
            "passport_number",
            "nationality",
            "date_of_birth",
            "place_of_birth",
            "sex",
            "issue_date",
            "expiry_date",
            "issuing_authority",
            "passport_type",
            "mrz_line1",
            "mrz_line2",
        ],
        DocumentType::Ticket => &[
            "passenger_name",
            "airline",
            "flight_number",
            "departure_airport",
            "arrival_airport",
            "arrival_city",
            "departure_date",
            "arrival_date",
            "return_flight_number",
            "return_date",
            "booking_reference",
            "ticket_number",
            "is_round_trip",
        ],
        DocumentType::Hotel => &[
            "guest_name",
            "hotel_name",
            "hotel_address",
            "hotel_city",
            "hotel_country",
            "check_in_date",
            "check_out_date",
            "nights",
            "room_type",
            "confirmation_number",
            "booking_platform",
        ],
        DocumentType::Vaccination => &[
            "holder_name",
            "date_of_birth",
            "certificate_number",
            "yellow_fever_present",
            "yellow_fever_date",
            "valid_from",
            "valid_until",
            "vaccination_center",
            "batch_number",
        ],
        DocumentType::Invitation => &[
            "inviter_name",
            "inviter_address",
            "inviter_city",
            "inviter_phone",
            "inviter_email",
            "invitee_name",
            "invitee_passport_number",
            "invitee_nationality",
            "relationship",
            "purpose",
            "arrival_date",
            "departure_date",
            "accommodation_provided",
            "accommodation_address",
            "notarized",
        ],
        DocumentType::Payment => &[
            "amount",
            "currency",
            "date",
            "reference",
            "transaction_id",
            "payer",
            "payee",
            "payment_method",
            "bank",
        ],
        DocumentType::VerbalNote => &[
            "sending_entity",
            "receiving_entity",
            "reference_number",
            "date",
            "subject",
            "diplomat_name",
            "diplomat_title",
            "diplomat_passport_number",
            "mission_purpose",
            "mission_from",
            "mission_to",
            "visa_category",
        ],
        DocumentType::ResidenceCard => &[
            "holder_name",
            "card_number",
            "nationality",
            "date_of_birth",
            "issue_date",
            "expiry_date",
            "issuing_country",
            "residence_type",
            "employer",
            "address",
        ],
        DocumentType::Other => &[],
    }
}

/// Checks the model is asked to judge, per document type.
fn requested_validations(document_type: DocumentType) -> &'static [&'static str] {
    match document_type {
        DocumentType::Passport => &["mrz_viz_match", "expiry_valid"],
        DocumentType::Ticket => &["destination_is_abidjan", "return_flight_present"],
        DocumentType::Hotel => &["location_is_cote_divoire", "dates_coherent"],
        DocumentType::Vaccination => &["yellow_fever_present", "certificate_authentic_indicators"],
        DocumentType::Invitation => &["inviter_in_cote_divoire", "signature_present"],
        DocumentType::Payment => &["payee_is_tresor_ci"],
        DocumentType::VerbalNote => &["official_stamp", "signature_present", "addressed_to_ci_embassy"],
        DocumentType::ResidenceCard => &["official_format", "photo_present"],
        DocumentType::Other => &[],
    }
}

/// Build the structuring prompt for one document.
pub fn build_structuring_prompt(
    document_type: DocumentType,
    raw_text: &str,
    ocr_confidence: f32,
) -> String {
    let confidence_note = if ocr_confidence < 0.70 {
        "NOTE: This text was extracted with LOW confidence. Some characters may be misread. \
         Output null rather than a doubtful value.\n"
    } else {
        ""
    };

    let fields = requested_fields(document_type);
    let extracted = if fields.is_empty() {
        "    \"<field_name>\": \"every piece of information identified\"".to_string()
    } else {
        fields
            .iter()
            .map(|f| format!("    \"{f}\": null"))
            .collect::<Vec<_>>()
            .join(",\n")
    };
    let validations = requested_validations(document_type)
        .iter()
        .map(|v| format!("    \"{v}\": true"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"{confidence_note}
<document type="{doc_type}">
{raw_text}
</document>

Extract the {label} above into this JSON structure. Replace null with the
value found in the document. Answer each validation with true or false.

```json
{{
  "extracted": {{
{extracted}
  }},
  "validations": {{
{validations}
  }}
}}
```
"#,
        doc_type = document_type.as_str(),
        label = document_type.label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_document_text() {
        let prompt = build_structuring_prompt(DocumentType::Hotel, "HOTEL IVOIRE", 0.90);
        assert!(prompt.contains("HOTEL IVOIRE"));
        assert!(prompt.contains("<document type=\"hotel\">"));
        assert!(prompt.contains("\"check_in_date\": null"));
        assert!(prompt.contains("\"location_is_cote_divoire\": true"));
    }

    #[test]
    fn low_confidence_adds_warning() {
        let prompt = build_structuring_prompt(DocumentType::Passport, "some text", 0.50);
        assert!(prompt.contains("LOW confidence"));
    }

    #[test]
    fn high_confidence_no_warning() {
        let prompt = build_structuring_prompt(DocumentType::Passport, "some text", 0.90);
        assert!(!prompt.contains("LOW confidence"));
    }

    #[test]
    fn every_known_type_requests_fields() {
        for doc_type in DocumentType::KNOWN {
            assert!(!requested_fields(doc_type).is_empty(), "{doc_type}");
        }
    }

    #[test]
    fn other_type_gets_open_prompt() {
        let prompt = build_structuring_prompt(DocumentType::Other, "text", 0.9);
        assert!(prompt.contains("<field_name>"));
    }

    #[test]
    fn system_prompt_enforces_extraction_only() {
        assert!(STRUCTURING_SYSTEM_PROMPT.contains("ONLY"));
        assert!(STRUCTURING_SYSTEM_PROMPT.contains("valid JSON"));
    }
}

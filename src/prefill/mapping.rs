use crate::models::DocumentType;

/// One prefilled field of a target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSourceRule {
    pub target: &'static str,
    pub source: DocumentType,
    pub source_field: &'static str,
    /// Printed on the target document, so an upload is checked against it.
    /// Form-only fields are suggested but never compared.
    pub verified: bool,
}

const fn verified(target: &'static str, source: DocumentType, source_field: &'static str) -> FieldSourceRule {
    FieldSourceRule {
        target,
        source,
        source_field,
        verified: true,
    }
}

const fn form_only(target: &'static str, source: DocumentType, source_field: &'static str) -> FieldSourceRule {
    FieldSourceRule {
        target,
        source,
        source_field,
        verified: false,
    }
}

const TICKET: &[FieldSourceRule] = &[
    verified("passenger_name", DocumentType::Passport, "full_name"),
    verified("passenger_surname", DocumentType::Passport, "surname"),
    verified("passenger_given_names", DocumentType::Passport, "given_names"),
];

const HOTEL: &[FieldSourceRule] = &[
    verified("guest_name", DocumentType::Passport, "full_name"),
    verified("guest_surname", DocumentType::Passport, "surname"),
    verified("check_in", DocumentType::Ticket, "departure_date"),
    verified("check_out", DocumentType::Ticket, "return_date"),
];

// Yellow fever cards carry no nationality.
const VACCINATION: &[FieldSourceRule] = &[
    verified("patient_name", DocumentType::Passport, "full_name"),
    verified("patient_surname", DocumentType::Passport, "surname"),
    verified("date_of_birth", DocumentType::Passport, "date_of_birth"),
    form_only("nationality", DocumentType::Passport, "nationality"),
];

const INVITATION: &[FieldSourceRule] = &[
    verified("invitee_name", DocumentType::Passport, "full_name"),
    verified("invitee_surname", DocumentType::Passport, "surname"),
    verified("invitee_nationality", DocumentType::Passport, "nationality"),
    verified("visit_from", DocumentType::Ticket, "departure_date"),
    verified("visit_to", DocumentType::Ticket, "return_date"),
];

const RESIDENCE_CARD: &[FieldSourceRule] = &[
    verified("holder_name", DocumentType::Passport, "full_name"),
    verified("holder_surname", DocumentType::Passport, "surname"),
    verified("date_of_birth", DocumentType::Passport, "date_of_birth"),
    form_only("nationality", DocumentType::Passport, "nationality"),
];

const PAYMENT: &[FieldSourceRule] = &[
    verified("applicant_name", DocumentType::Passport, "full_name"),
    verified("applicant_surname", DocumentType::Passport, "surname"),
];

const VERBAL_NOTE: &[FieldSourceRule] = &[
    verified("diplomat_name", DocumentType::Passport, "full_name"),
    verified("diplomat_surname", DocumentType::Passport, "surname"),
    verified("passport_number", DocumentType::Passport, "passport_number"),
];

/// Derived prefill fields that the uploaded document also states.
const VERIFIED_EXTRAS: &[(DocumentType, &str)] = &[
    (DocumentType::Payment, "total_amount"),
    (DocumentType::Payment, "currency"),
];

/// Cascade rules for a target document. Empty for the passport, which is
/// the root source, and for `Other`.
pub fn rules_for(document_type: DocumentType) -> &'static [FieldSourceRule] {
    match document_type {
        DocumentType::Ticket => TICKET,
        DocumentType::Hotel => HOTEL,
        DocumentType::Vaccination => VACCINATION,
        DocumentType::Invitation => INVITATION,
        DocumentType::ResidenceCard => RESIDENCE_CARD,
        DocumentType::Payment => PAYMENT,
        DocumentType::VerbalNote => VERBAL_NOTE,
        DocumentType::Passport | DocumentType::Other => &[],
    }
}

/// Whether `field` of a `document_type` prefill is compared with the
/// extracted document.
pub fn is_verified_field(document_type: DocumentType, field: &str) -> bool {
    rules_for(document_type)
        .iter()
        .any(|rule| rule.verified && rule.target == field)
        || VERIFIED_EXTRAS
            .iter()
            .any(|(t, name)| *t == document_type && *name == field)
}

/// Target types that have prefill rules, in collection order.
pub fn prefillable_types() -> impl Iterator<Item = DocumentType> {
    DocumentType::KNOWN
        .into_iter()
        .filter(|t| !rules_for(*t).is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_are_not_verified_unless_listed() {
        assert!(is_verified_field(DocumentType::Payment, "applicant_name"));
        assert!(is_verified_field(DocumentType::Payment, "total_amount"));
        assert!(!is_verified_field(DocumentType::Payment, "expected_amount"));
        assert!(!is_verified_field(DocumentType::Payment, "visa_type"));
        assert!(!is_verified_field(DocumentType::Hotel, "num_nights"));
        assert!(!is_verified_field(DocumentType::Vaccination, "nationality"));
        assert!(is_verified_field(DocumentType::Invitation, "invitee_nationality"));
    }
}

use crate::config::{fees, thresholds};
use crate::models::{DocumentType, Dossier};
use crate::parsing::{add_months, days_between};

use super::types::*;

// ---------------------------------------------------------------------------
// Fraud indicators
// ---------------------------------------------------------------------------

/// Expected total in XOF for the visa type, express supplement included.
pub fn expected_fee(context: &RiskContext) -> i64 {
    let supplement = if context.express { fees::EXPRESS_SUPPLEMENT } else { 0 };
    fees::visa_fee(&context.visa_type) + supplement
}

fn payment_mismatch(dossier: &Dossier, context: &RiskContext) -> bool {
    let Some(payment) = &dossier.payment else {
        return false;
    };
    if let Some(matches) = payment.amount_matches_expected {
        return !matches;
    }
    let Some(amount) = payment.amount else {
        return false;
    };
    let currency_ok = payment
        .currency
        .as_deref()
        .map_or(true, |c| c.eq_ignore_ascii_case(fees::CURRENCY));
    let expected = expected_fee(context) as f64;
    if !currency_ok || expected <= 0.0 {
        return false;
    }
    (amount - expected).abs() / expected > thresholds::PAYMENT_TOLERANCE
}

/// Weighted fraud signals found in the dossier.
pub fn detect_fraud(dossier: &Dossier, context: &RiskContext) -> Vec<FraudIndicator> {
    let mut indicators = Vec::new();

    if let Some(passport) = &dossier.passport {
        if passport.mrz_valid == Some(false) {
            indicators.push(FraudIndicator::new(FraudType::InvalidMrzChecksum));
        }
        if let Some(expiry) = passport.expiry_date {
            let horizon = add_months(context.today, thresholds::PASSPORT_VALIDITY_MONTHS);
            if expiry < context.today {
                indicators.push(FraudIndicator::new(FraudType::ExpiredPassport));
            } else if expiry < horizon {
                indicators.push(FraudIndicator::new(FraudType::PassportExpiringSoon));
            }
        }
    }

    if let Some(vaccination) = &dossier.vaccination {
        if vaccination.valid == Some(false) || vaccination.yellow_fever_present == Some(false) {
            indicators.push(FraudIndicator::new(FraudType::InvalidYellowFever));
        }
    }

    if payment_mismatch(dossier, context) {
        indicators.push(FraudIndicator::new(FraudType::IncorrectPaymentAmount));
    }

    if let Some(ticket) = &dossier.ticket {
        if ticket.lands_in_host_country() == Some(false) {
            indicators.push(FraudIndicator::new(FraudType::WrongDestination));
        }
    }

    let needs_note = dossier
        .passport
        .as_ref()
        .is_some_and(|p| p.kind().requires_verbal_note());
    if needs_note && dossier.verbal_note.is_none() {
        indicators.push(FraudIndicator::new(FraudType::MissingVerbalNote));
    }

    indicators
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

pub fn identify_anomalies(dossier: &Dossier, context: &RiskContext) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if let Some(nights) = dossier.hotel.as_ref().and_then(|h| h.booked_nights()) {
        if nights > thresholds::MAX_STAY_DAYS {
            anomalies.push(Anomaly::new(
                AnomalyType::LongStay,
                format!("Stay duration of {nights} nights exceeds typical short-term visa"),
            ));
        }
    }

    if let Some(departure) = dossier.ticket.as_ref().and_then(|t| t.arrival()) {
        let days = days_between(context.today, departure);
        if days > 0 && days < thresholds::URGENT_TRAVEL_DAYS {
            anomalies.push(Anomaly::new(
                AnomalyType::UrgentTravel,
                format!("Travel date is within {} days", thresholds::URGENT_TRAVEL_DAYS),
            ));
        }
    }

    if let Some(invitation) = &dossier.invitation {
        if invitation.notarized != Some(true) {
            anomalies.push(Anomaly::new(
                AnomalyType::UnnotarizedInvitation,
                "Invitation letter is not notarized",
            ));
        }
    }

    anomalies
}

// ---------------------------------------------------------------------------
// Per-document checks
// ---------------------------------------------------------------------------

/// Canonical fields each document must carry.
pub fn required_fields(document_type: DocumentType) -> &'static [&'static str] {
    match document_type {
        DocumentType::Passport => &["passport_number", "surname", "expiry_date"],
        DocumentType::Ticket => &["passenger_name", "flight_number", "departure_date"],
        DocumentType::Hotel => &["guest_name", "hotel_name", "check_in"],
        DocumentType::Vaccination => &["holder_name", "yellow_fever_date"],
        DocumentType::Invitation => &["inviter_name", "invitee_name"],
        DocumentType::Payment => &["amount", "date", "reference"],
        DocumentType::VerbalNote => &["sending_entity", "diplomat_name"],
        DocumentType::ResidenceCard => &["holder_name", "card_number", "expiry_date"],
        DocumentType::Other => &[],
    }
}

/// Verdicts the extraction layer recorded on the document, by check name.
fn recorded_verdicts(dossier: &Dossier, document_type: DocumentType) -> Vec<(&'static str, bool)> {
    let verdicts = match document_type {
        DocumentType::Passport => {
            vec![("mrz_checksum_valid", dossier.passport.as_ref().and_then(|p| p.mrz_valid))]
        }
        DocumentType::Ticket => vec![(
            "destination_is_abidjan",
            dossier.ticket.as_ref().and_then(|t| t.destination_valid),
        )],
        DocumentType::Vaccination => {
            let v = dossier.vaccination.as_ref();
            vec![
                ("yellow_fever_present", v.and_then(|v| v.yellow_fever_present)),
                ("yellow_fever_valid", v.and_then(|v| v.valid)),
            ]
        }
        DocumentType::Payment => vec![(
            "amount_matches_expected",
            dossier.payment.as_ref().and_then(|p| p.amount_matches_expected),
        )],
        _ => Vec::new(),
    };
    verdicts
        .into_iter()
        .filter_map(|(name, verdict)| verdict.map(|v| (name, v)))
        .collect()
}

pub fn check_document(dossier: &Dossier, document_type: DocumentType) -> DocumentCheck {
    let mut check = DocumentCheck {
        valid: true,
        confidence: 1.0,
        missing_fields: Vec::new(),
        issues: Vec::new(),
    };

    for field in required_fields(document_type) {
        let present = dossier
            .field(document_type, field)
            .is_some_and(|v| !crate::models::is_empty_value(&v));
        if !present {
            check.valid = false;
            check.missing_fields.push((*field).to_string());
            check.issues.push(format!("Missing required field: {field}"));
        }
    }

    for (name, passed) in recorded_verdicts(dossier, document_type) {
        if !passed {
            check.issues.push(format!("Validation failed: {name}"));
            check.confidence *= 0.9;
        }
    }
    check.confidence = (check.confidence * 1000.0).round() / 1000.0;

    check
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn context() -> RiskContext {
        RiskContext::new(d(2025, 5, 1))
    }

    #[test]
    fn expired_and_expiring_passport() {
        let mut dossier = Dossier::new().with(CanonicalDocument::Passport(PassportData {
            expiry_date: Some(d(2025, 1, 10)),
            ..Default::default()
        }));
        let found = detect_fraud(&dossier, &context());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].indicator_type, FraudType::ExpiredPassport);

        dossier.passport.as_mut().unwrap().expiry_date = Some(d(2025, 9, 1));
        let found = detect_fraud(&dossier, &context());
        assert_eq!(found[0].indicator_type, FraudType::PassportExpiringSoon);
    }

    #[test]
    fn diplomatic_passport_needs_verbal_note() {
        let dossier = Dossier::new().with(CanonicalDocument::Passport(PassportData {
            passport_type: Some(PassportType::Diplomatique),
            ..Default::default()
        }));
        let found = detect_fraud(&dossier, &context());
        assert!(found.iter().any(|i| i.indicator_type == FraudType::MissingVerbalNote));

        let with_note = dossier.with(CanonicalDocument::VerbalNote(VerbalNoteData::default()));
        assert!(detect_fraud(&with_note, &context()).is_empty());
    }

    #[test]
    fn payment_checked_against_fee_with_tolerance() {
        let paid = |amount: f64| {
            Dossier::new().with(CanonicalDocument::Payment(PaymentData {
                amount: Some(amount),
                currency: Some("XOF".into()),
                ..Default::default()
            }))
        };
        assert!(detect_fraud(&paid(50_000.0), &context()).is_empty());
        assert!(detect_fraud(&paid(48_000.0), &context()).is_empty());
        assert_eq!(
            detect_fraud(&paid(40_000.0), &context())[0].indicator_type,
            FraudType::IncorrectPaymentAmount
        );

        let express = RiskContext {
            express: true,
            ..context()
        };
        assert_eq!(expected_fee(&express), 125_000);
        assert!(detect_fraud(&paid(125_000.0), &express).is_empty());
    }

    #[test]
    fn anomalies_for_urgent_travel_and_unnotarized_invitation() {
        let dossier = Dossier::new()
            .with(CanonicalDocument::Ticket(TicketData {
                departure_date: Some(d(2025, 5, 4)),
                ..Default::default()
            }))
            .with(CanonicalDocument::Invitation(InvitationData::default()));
        let types: Vec<AnomalyType> = identify_anomalies(&dossier, &context())
            .into_iter()
            .map(|a| a.anomaly_type)
            .collect();
        assert_eq!(types, vec![AnomalyType::UrgentTravel, AnomalyType::UnnotarizedInvitation]);
    }

    #[test]
    fn missing_required_fields_invalidate_document() {
        let dossier = Dossier::new().with(CanonicalDocument::Passport(PassportData {
            surname: Some("TESFAYE".into()),
            mrz_valid: Some(false),
            ..Default::default()
        }));
        let check = check_document(&dossier, DocumentType::Passport);
        assert!(!check.valid);
        assert_eq!(check.missing_fields, vec!["passport_number", "expiry_date"]);
        assert_eq!(check.confidence, 0.9);
    }
}

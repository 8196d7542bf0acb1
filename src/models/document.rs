//! Canonical per-type document shapes.
//!
//! Extractors and the structuring model produce loosely shaped field maps,
//! sometimes flat, sometimes nested (`mrz.parsed.surname`, `dates.from`).
//! Each `*Data::from_value` resolves those aliases once, so validators only
//! read typed fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{DocumentType, PassportType};
use super::fields::{lookup, lookup_bool, lookup_text};
use crate::parsing::{days_between, parse_amount, parse_date};
use crate::reference;

fn date(doc: &Value, keys: &[&str]) -> Option<NaiveDate> {
    let raw = lookup_text(doc, keys)?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        tracing::debug!(keys = ?keys, value = %raw, "Skipping unparseable date");
    }
    parsed
}

fn number(doc: &Value, keys: &[&str]) -> Option<f64> {
    match lookup(doc, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s).map(|a| a.value),
        _ => None,
    }
}

fn join_name(given: Option<&str>, surname: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [given, surname]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

// ---------------------------------------------------------------------------
// Passport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassportData {
    pub surname: Option<String>,
    pub given_names: Option<String>,
    pub full_name: Option<String>,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub place_of_birth: Option<String>,
    pub passport_type: Option<PassportType>,
    /// `Some(false)` only when MRZ check digits were computed and failed.
    pub mrz_valid: Option<bool>,
}

impl PassportData {
    pub fn from_value(doc: &Value) -> Self {
        let surname = lookup_text(doc, &["surname", "last_name", "viz.surname", "mrz.parsed.surname"]);
        let given_names = lookup_text(
            doc,
            &["given_names", "first_name", "first_names", "viz.given_names", "mrz.parsed.given_names"],
        );
        Self {
            full_name: lookup_text(doc, &["full_name", "name"]),
            passport_number: lookup_text(
                doc,
                &["passport_number", "document_number", "number", "mrz.parsed.passport_number"],
            ),
            nationality: lookup_text(doc, &["nationality", "nationality_code", "mrz.parsed.nationality"]),
            date_of_birth: date(doc, &["date_of_birth", "dob", "birth_date", "viz.date_of_birth"]),
            issue_date: date(doc, &["issue_date", "date_of_issue", "viz.issue_date"]),
            expiry_date: date(doc, &["expiry_date", "date_of_expiry", "viz.expiry_date"]),
            sex: lookup_text(doc, &["sex", "gender"]),
            place_of_birth: lookup_text(doc, &["place_of_birth", "viz.place_of_birth"]),
            passport_type: lookup_text(doc, &["passport_type"])
                .and_then(|t| t.to_uppercase().parse().ok()),
            mrz_valid: lookup_bool(
                doc,
                &["mrz_valid", "mrz.checksums_valid", "validations.mrz_checksum_valid"],
            ),
            surname,
            given_names,
        }
    }

    /// "GIVEN SURNAME" when both parts are known, else the recorded full name.
    pub fn display_name(&self) -> Option<String> {
        join_name(self.given_names.as_deref(), self.surname.as_deref())
            .or_else(|| self.full_name.clone())
    }

    pub fn nationality_code(&self) -> Option<String> {
        self.nationality.as_deref().and_then(reference::country_code)
    }

    pub fn kind(&self) -> PassportType {
        self.passport_type.unwrap_or(PassportType::Ordinaire)
    }
}

// ---------------------------------------------------------------------------
// Flight ticket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketData {
    pub passenger_name: Option<String>,
    pub flight_number: Option<String>,
    pub return_flight_number: Option<String>,
    pub airline: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub arrival_city: Option<String>,
    /// Outbound flight date.
    pub departure_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub booking_reference: Option<String>,
    /// From the extractor's `destination_is_abidjan` validation, when present.
    pub destination_valid: Option<bool>,
}

impl TicketData {
    pub fn from_value(doc: &Value) -> Self {
        let arrival_airport = lookup_text(
            doc,
            &["arrival_airport", "destination", "to", "outbound.arrival_airport"],
        );
        let arrival_city = lookup_text(doc, &["arrival_city", "destination_city"]).or_else(|| {
            arrival_airport
                .as_deref()
                .and_then(reference::ci_airport_city)
                .map(str::to_string)
        });
        Self {
            passenger_name: lookup_text(doc, &["passenger_name", "passenger", "full_name", "name"]),
            flight_number: lookup_text(doc, &["flight_number", "outbound.flight_number"]),
            return_flight_number: lookup_text(
                doc,
                &["return_flight_number", "return_flight", "inbound_flight_number", "return.flight_number"],
            ),
            airline: lookup_text(doc, &["airline", "airline_name", "airline_code"]),
            departure_airport: lookup_text(
                doc,
                &["departure_airport", "origin", "from", "outbound.departure_airport"],
            ),
            departure_date: date(
                doc,
                &["departure_date", "outbound_date", "depart_date", "outbound.date", "flight_date"],
            ),
            arrival_date: date(doc, &["arrival_date"]),
            return_date: date(doc, &["return_date", "inbound_date", "return.date"]),
            booking_reference: lookup_text(doc, &["booking_reference", "pnr", "reference"]),
            destination_valid: lookup_bool(
                doc,
                &["destination_is_abidjan", "validations.destination_is_abidjan"],
            ),
            arrival_airport,
            arrival_city,
        }
    }

    /// Arrival in the host country: the outbound flight date.
    pub fn arrival(&self) -> Option<NaiveDate> {
        self.departure_date.or(self.arrival_date)
    }

    pub fn has_return(&self) -> bool {
        self.return_date.is_some() || self.return_flight_number.is_some()
    }

    /// Whether the ticket lands in the host country. `None` when unknown.
    pub fn lands_in_host_country(&self) -> Option<bool> {
        if let Some(valid) = self.destination_valid {
            return Some(valid);
        }
        if let Some(code) = self.arrival_airport.as_deref().filter(|a| a.trim().len() == 3) {
            return Some(reference::ci_airport_city(code).is_some());
        }
        self.arrival_city
            .as_deref()
            .map(|city| reference::find_ci_city(city).is_some())
    }

    /// Days covered by the ticket, outbound to return.
    pub fn covered_days(&self) -> Option<i64> {
        Some(days_between(self.arrival()?, self.return_date?))
    }
}

// ---------------------------------------------------------------------------
// Hotel reservation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelData {
    pub guest_name: Option<String>,
    pub hotel_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub nights: Option<i64>,
    pub confirmation_number: Option<String>,
}

impl HotelData {
    pub fn from_value(doc: &Value) -> Self {
        let address = lookup_text(doc, &["hotel_address", "address"]);
        let city = lookup_text(doc, &["hotel_city", "city", "location.city"]).or_else(|| {
            address
                .as_deref()
                .and_then(reference::find_ci_city)
                .map(str::to_string)
        });
        Self {
            guest_name: lookup_text(doc, &["guest_name", "guest", "full_name", "name"]),
            hotel_name: lookup_text(doc, &["hotel_name", "hotel"]),
            check_in: date(
                doc,
                &["check_in_date", "check_in", "checkin", "arrival_date", "dates.check_in"],
            ),
            check_out: date(
                doc,
                &["check_out_date", "check_out", "checkout", "departure_date", "dates.check_out"],
            ),
            nights: number(doc, &["nights", "num_nights"]).map(|n| n as i64),
            confirmation_number: lookup_text(doc, &["confirmation_number", "booking_reference", "reference"]),
            address,
            city,
        }
    }

    /// Nights booked: the dates when both parse, else the stated count.
    pub fn booked_nights(&self) -> Option<i64> {
        match (self.check_in, self.check_out) {
            (Some(from), Some(to)) => Some(days_between(from, to)),
            _ => self.nights,
        }
    }
}

// ---------------------------------------------------------------------------
// Vaccination certificate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaccinationData {
    pub holder_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    pub yellow_fever_date: Option<NaiveDate>,
    /// Whether yellow fever appears on the certificate at all.
    pub yellow_fever_present: Option<bool>,
    /// Explicit validity verdict, when the document or a validator stated one.
    pub valid: Option<bool>,
}

impl VaccinationData {
    pub fn from_value(doc: &Value) -> Self {
        Self {
            holder_name: lookup_text(doc, &["holder_name", "patient_name", "full_name", "name"]),
            date_of_birth: date(doc, &["date_of_birth", "dob"]),
            certificate_number: lookup_text(doc, &["certificate_number"]),
            yellow_fever_date: date(
                doc,
                &["yellow_fever_date", "vaccination_date", "yellow_fever.date", "date"],
            ),
            yellow_fever_present: lookup_bool(
                doc,
                &["yellow_fever_present", "validations.yellow_fever_present"],
            ),
            valid: lookup_bool(
                doc,
                &["valid", "is_valid", "yellow_fever_valid", "yellow_fever.valid", "validations.yellow_fever_valid"],
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Invitation letter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvitationData {
    pub inviter_name: Option<String>,
    pub invitee_name: Option<String>,
    pub invitee_passport_number: Option<String>,
    pub purpose: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    pub accommodation_provided: bool,
    pub notarized: Option<bool>,
    pub host_city: Option<String>,
}

impl InvitationData {
    pub fn from_value(doc: &Value) -> Self {
        Self {
            inviter_name: lookup_text(doc, &["inviter_name", "inviter", "host_name", "inviter.name"]),
            invitee_name: lookup_text(doc, &["invitee_name", "invitee", "guest_name", "invitee.name"]),
            invitee_passport_number: lookup_text(
                doc,
                &["invitee_passport_number", "invitee.passport_number"],
            ),
            purpose: lookup_text(doc, &["purpose", "visit_purpose"]),
            date_from: date(
                doc,
                &["arrival_date", "visit_from", "date_from", "dates.from", "from"],
            ),
            date_to: date(
                doc,
                &["departure_date", "visit_to", "date_to", "dates.to", "to"],
            ),
            duration_days: number(doc, &["duration_days", "duration", "dates.duration_days"])
                .map(|n| n as i64),
            accommodation_provided: lookup_bool(
                doc,
                &["accommodation_provided", "accommodation.provided", "hosting_provided"],
            )
            .unwrap_or(false),
            notarized: lookup_bool(doc, &["notarized", "legalized"]),
            host_city: lookup_text(doc, &["inviter_city", "host_city", "inviter.city"]),
        }
    }

    /// Inclusive day count of the invited visit.
    pub fn days(&self) -> Option<i64> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => Some(days_between(from, to) + 1),
            _ => self.duration_days,
        }
    }
}

// ---------------------------------------------------------------------------
// Payment receipt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentData {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub payer: Option<String>,
    pub payee: Option<String>,
    /// Extractor verdict against the expected fee, when it computed one.
    pub amount_matches_expected: Option<bool>,
}

impl PaymentData {
    pub fn from_value(doc: &Value) -> Self {
        Self {
            amount: number(doc, &["amount", "total_amount", "amount_paid"]),
            currency: lookup_text(doc, &["currency"]),
            date: date(doc, &["date", "payment_date"]),
            reference: lookup_text(doc, &["reference", "receipt_number", "transaction_id"]),
            payer: lookup_text(doc, &["payer", "applicant_name", "payer_name"]),
            payee: lookup_text(doc, &["payee", "beneficiary"]),
            amount_matches_expected: lookup_bool(
                doc,
                &["amount_matches_expected", "validations.amount_matches_expected"],
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Verbal note
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerbalNoteData {
    pub sending_entity: Option<String>,
    pub receiving_entity: Option<String>,
    pub reference_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub diplomat_name: Option<String>,
    pub diplomat_title: Option<String>,
    pub diplomat_passport_number: Option<String>,
}

impl VerbalNoteData {
    pub fn from_value(doc: &Value) -> Self {
        Self {
            sending_entity: lookup_text(doc, &["sending_entity", "sender"]),
            receiving_entity: lookup_text(doc, &["receiving_entity", "recipient"]),
            reference_number: lookup_text(doc, &["reference_number", "reference"]),
            date: date(doc, &["date", "note_date"]),
            diplomat_name: lookup_text(doc, &["diplomat_name", "full_name", "name"]),
            diplomat_title: lookup_text(doc, &["diplomat_title", "title"]),
            diplomat_passport_number: lookup_text(doc, &["diplomat_passport_number", "passport_number"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Residence card
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidenceCardData {
    pub holder_name: Option<String>,
    pub card_number: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub residence_type: Option<String>,
}

impl ResidenceCardData {
    pub fn from_value(doc: &Value) -> Self {
        Self {
            holder_name: lookup_text(doc, &["holder_name", "full_name", "name"]),
            card_number: lookup_text(doc, &["card_number", "number"]),
            nationality: lookup_text(doc, &["nationality"]),
            date_of_birth: date(doc, &["date_of_birth", "dob"]),
            issue_date: date(doc, &["issue_date"]),
            expiry_date: date(doc, &["expiry_date", "valid_until"]),
            residence_type: lookup_text(doc, &["residence_type", "card_type"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Tagged canonical document
// ---------------------------------------------------------------------------

/// One document in canonical form, tagged by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "document_type", rename_all = "snake_case")]
pub enum CanonicalDocument {
    Passport(PassportData),
    Ticket(TicketData),
    Hotel(HotelData),
    Vaccination(VaccinationData),
    Invitation(InvitationData),
    Payment(PaymentData),
    VerbalNote(VerbalNoteData),
    ResidenceCard(ResidenceCardData),
}

impl CanonicalDocument {
    /// Canonicalize a raw field object. `Other` documents have no canonical
    /// shape and yield `None`.
    pub fn from_value(document_type: DocumentType, doc: &Value) -> Option<Self> {
        let canonical = match document_type {
            DocumentType::Passport => Self::Passport(PassportData::from_value(doc)),
            DocumentType::Ticket => Self::Ticket(TicketData::from_value(doc)),
            DocumentType::Hotel => Self::Hotel(HotelData::from_value(doc)),
            DocumentType::Vaccination => Self::Vaccination(VaccinationData::from_value(doc)),
            DocumentType::Invitation => Self::Invitation(InvitationData::from_value(doc)),
            DocumentType::Payment => Self::Payment(PaymentData::from_value(doc)),
            DocumentType::VerbalNote => Self::VerbalNote(VerbalNoteData::from_value(doc)),
            DocumentType::ResidenceCard => Self::ResidenceCard(ResidenceCardData::from_value(doc)),
            DocumentType::Other => return None,
        };
        Some(canonical)
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Passport(_) => DocumentType::Passport,
            Self::Ticket(_) => DocumentType::Ticket,
            Self::Hotel(_) => DocumentType::Hotel,
            Self::Vaccination(_) => DocumentType::Vaccination,
            Self::Invitation(_) => DocumentType::Invitation,
            Self::Payment(_) => DocumentType::Payment,
            Self::VerbalNote(_) => DocumentType::VerbalNote,
            Self::ResidenceCard(_) => DocumentType::ResidenceCard,
        }
    }

    /// The person this document names as its holder.
    pub fn holder_name(&self) -> Option<String> {
        match self {
            Self::Passport(p) => p.display_name(),
            Self::Ticket(t) => t.passenger_name.clone(),
            Self::Hotel(h) => h.guest_name.clone(),
            Self::Vaccination(v) => v.holder_name.clone(),
            Self::Invitation(i) => i.invitee_name.clone(),
            Self::Payment(p) => p.payer.clone(),
            Self::VerbalNote(v) => v.diplomat_name.clone(),
            Self::ResidenceCard(r) => r.holder_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn passport_reads_nested_mrz_and_flat_fields() {
        let doc = json!({
            "mrz": {"parsed": {"surname": "TESFAYE", "nationality": "ETH"}},
            "given_names": "ABEBE",
            "expiry_date": "10/01/2025",
            "passport_type": "diplomatique",
        });
        let p = PassportData::from_value(&doc);
        assert_eq!(p.surname.as_deref(), Some("TESFAYE"));
        assert_eq!(p.display_name().as_deref(), Some("ABEBE TESFAYE"));
        assert_eq!(p.expiry_date, Some(d(2025, 1, 10)));
        assert_eq!(p.kind(), PassportType::Diplomatique);
        assert_eq!(p.nationality_code().as_deref(), Some("ETH"));
    }

    #[test]
    fn unparseable_dates_become_none() {
        let p = PassportData::from_value(&json!({"expiry_date": "soon"}));
        assert_eq!(p.expiry_date, None);
    }

    #[test]
    fn ticket_arrival_prefers_outbound_date() {
        let t = TicketData::from_value(&json!({
            "departure_date": "2025-06-01",
            "arrival_date": "2025-06-02",
            "arrival_airport": "ABJ",
        }));
        assert_eq!(t.arrival(), Some(d(2025, 6, 1)));
        assert_eq!(t.arrival_city.as_deref(), Some("Abidjan"));
        assert_eq!(t.lands_in_host_country(), Some(true));
        assert!(!t.has_return());
    }

    #[test]
    fn hotel_nights_from_dates() {
        let h = HotelData::from_value(&json!({
            "check_in_date": "2025-06-01",
            "check_out_date": "2025-06-08",
            "nights": 3,
        }));
        assert_eq!(h.booked_nights(), Some(7));
    }

    #[test]
    fn invitation_days_are_inclusive() {
        let i = InvitationData::from_value(&json!({
            "dates": {"from": "2025-06-01", "to": "2025-06-10"},
            "accommodation_provided": "yes",
        }));
        assert_eq!(i.days(), Some(10));
        assert!(i.accommodation_provided);
    }

    #[test]
    fn other_type_has_no_canonical_form() {
        assert!(CanonicalDocument::from_value(DocumentType::Other, &json!({})).is_none());
        let doc = CanonicalDocument::from_value(DocumentType::Hotel, &json!({"guest_name": "A B"})).unwrap();
        assert_eq!(doc.document_type(), DocumentType::Hotel);
        assert_eq!(doc.holder_name().as_deref(), Some("A B"));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::*;
use super::enums::DocumentType;

/// All documents collected for one visa application, at most one per type.
///
/// A later document of the same type replaces the earlier one (re-upload).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub passport: Option<PassportData>,
    pub ticket: Option<TicketData>,
    pub hotel: Option<HotelData>,
    pub vaccination: Option<VaccinationData>,
    pub invitation: Option<InvitationData>,
    pub payment: Option<PaymentData>,
    pub verbal_note: Option<VerbalNoteData>,
    pub residence_card: Option<ResidenceCardData>,
}

impl Dossier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dossier from a JSON object keyed by document type name
    /// (`{"passport": {...}, "ticket": {...}}`). Unknown keys are ignored.
    pub fn from_json(documents: &Value) -> Self {
        let mut dossier = Self::new();
        if let Some(map) = documents.as_object() {
            for (name, fields) in map {
                let doc_type = DocumentType::from_name(name);
                match CanonicalDocument::from_value(doc_type, fields) {
                    Some(doc) => dossier.insert(doc),
                    None => tracing::debug!(document = %name, "Ignoring non-canonical document"),
                }
            }
        }
        dossier
    }

    pub fn with(mut self, document: CanonicalDocument) -> Self {
        self.insert(document);
        self
    }

    pub fn insert(&mut self, document: CanonicalDocument) {
        match document {
            CanonicalDocument::Passport(d) => self.passport = Some(d),
            CanonicalDocument::Ticket(d) => self.ticket = Some(d),
            CanonicalDocument::Hotel(d) => self.hotel = Some(d),
            CanonicalDocument::Vaccination(d) => self.vaccination = Some(d),
            CanonicalDocument::Invitation(d) => self.invitation = Some(d),
            CanonicalDocument::Payment(d) => self.payment = Some(d),
            CanonicalDocument::VerbalNote(d) => self.verbal_note = Some(d),
            CanonicalDocument::ResidenceCard(d) => self.residence_card = Some(d),
        }
    }

    pub fn get(&self, document_type: DocumentType) -> Option<CanonicalDocument> {
        match document_type {
            DocumentType::Passport => self.passport.clone().map(CanonicalDocument::Passport),
            DocumentType::Ticket => self.ticket.clone().map(CanonicalDocument::Ticket),
            DocumentType::Hotel => self.hotel.clone().map(CanonicalDocument::Hotel),
            DocumentType::Vaccination => self.vaccination.clone().map(CanonicalDocument::Vaccination),
            DocumentType::Invitation => self.invitation.clone().map(CanonicalDocument::Invitation),
            DocumentType::Payment => self.payment.clone().map(CanonicalDocument::Payment),
            DocumentType::VerbalNote => self.verbal_note.clone().map(CanonicalDocument::VerbalNote),
            DocumentType::ResidenceCard => {
                self.residence_card.clone().map(CanonicalDocument::ResidenceCard)
            }
            DocumentType::Other => None,
        }
    }

    pub fn has(&self, document_type: DocumentType) -> bool {
        match document_type {
            DocumentType::Passport => self.passport.is_some(),
            DocumentType::Ticket => self.ticket.is_some(),
            DocumentType::Hotel => self.hotel.is_some(),
            DocumentType::Vaccination => self.vaccination.is_some(),
            DocumentType::Invitation => self.invitation.is_some(),
            DocumentType::Payment => self.payment.is_some(),
            DocumentType::VerbalNote => self.verbal_note.is_some(),
            DocumentType::ResidenceCard => self.residence_card.is_some(),
            DocumentType::Other => false,
        }
    }

    /// Types present, in collection order.
    pub fn present_types(&self) -> Vec<DocumentType> {
        DocumentType::KNOWN
            .into_iter()
            .filter(|t| self.has(*t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.present_types().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical documents present, in collection order.
    pub fn documents(&self) -> Vec<CanonicalDocument> {
        DocumentType::KNOWN
            .into_iter()
            .filter_map(|t| self.get(t))
            .collect()
    }

    /// Read one canonical field by name (`passport`, `surname`), serialized
    /// to JSON. Dates come back as `YYYY-MM-DD` strings.
    pub fn field(&self, document_type: DocumentType, field: &str) -> Option<Value> {
        let doc = self.get(document_type)?;
        let value = serde_json::to_value(doc).ok()?;
        value.get(field).filter(|v| !v.is_null()).cloned()
    }

    /// Applicant nationality as alpha-3: passport first, then residence card.
    pub fn nationality_code(&self) -> Option<String> {
        self.passport
            .as_ref()
            .and_then(PassportData::nationality_code)
            .or_else(|| {
                self.residence_card
                    .as_ref()
                    .and_then(|r| r.nationality.as_deref())
                    .and_then(crate::reference::country_code)
            })
    }

    /// Best-known applicant name: passport, else the first named document.
    pub fn applicant_name(&self) -> Option<String> {
        self.passport
            .as_ref()
            .and_then(PassportData::display_name)
            .or_else(|| self.documents().iter().find_map(CanonicalDocument::holder_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_routes_by_type_name() {
        let dossier = Dossier::from_json(&json!({
            "passport": {"surname": "DOE", "given_names": "JANE", "nationality": "Kenya"},
            "flight_ticket": {"departure_date": "2025-06-01"},
            "birth_certificate": {"name": "x"},
        }));
        assert_eq!(dossier.len(), 2);
        assert!(dossier.has(DocumentType::Ticket));
        assert_eq!(dossier.nationality_code().as_deref(), Some("KEN"));
        assert_eq!(dossier.applicant_name().as_deref(), Some("JANE DOE"));
    }

    #[test]
    fn insert_replaces_same_type() {
        let mut dossier = Dossier::new();
        dossier.insert(CanonicalDocument::Hotel(HotelData {
            hotel_name: Some("A".into()),
            ..Default::default()
        }));
        dossier.insert(CanonicalDocument::Hotel(HotelData {
            hotel_name: Some("B".into()),
            ..Default::default()
        }));
        assert_eq!(dossier.len(), 1);
        assert_eq!(dossier.hotel.unwrap().hotel_name.as_deref(), Some("B"));
    }

    #[test]
    fn field_serializes_dates() {
        let dossier = Dossier::from_json(&json!({"ticket": {"departure_date": "01/06/2025"}}));
        assert_eq!(
            dossier.field(DocumentType::Ticket, "departure_date"),
            Some(json!("2025-06-01"))
        );
        assert_eq!(dossier.field(DocumentType::Ticket, "return_date"), None);
        assert_eq!(dossier.field(DocumentType::Hotel, "check_in"), None);
    }
}

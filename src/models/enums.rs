use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde wire name.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DocumentType {
    Passport => "passport",
    Ticket => "ticket",
    Hotel => "hotel",
    Vaccination => "vaccination",
    Invitation => "invitation",
    Payment => "payment",
    VerbalNote => "verbal_note",
    ResidenceCard => "residence_card",
    Other => "other",
});

str_enum!(FieldSource {
    Extractor => "extractor",
    Ai => "ai",
    RegexFallback => "regex_fallback",
});

// Declaration order is severity order: Info < Warning < Error.
str_enum!(Severity {
    Info => "info",
    Warning => "warning",
    Error => "error",
});

str_enum!(RiskLevel {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

str_enum!(PassportType {
    Ordinaire => "ORDINAIRE",
    Diplomatique => "DIPLOMATIQUE",
    Service => "SERVICE",
    LaissezPasser => "LAISSEZ_PASSER",
});

impl DocumentType {
    /// Every concrete document type, in dossier collection order.
    pub const KNOWN: [DocumentType; 8] = [
        DocumentType::Passport,
        DocumentType::Ticket,
        DocumentType::Hotel,
        DocumentType::Vaccination,
        DocumentType::Invitation,
        DocumentType::Payment,
        DocumentType::VerbalNote,
        DocumentType::ResidenceCard,
    ];

    /// Lenient lookup used at the pipeline boundary: case-insensitive, accepts
    /// common aliases, and resolves anything unknown to `Other`.
    pub fn from_name(name: &str) -> Self {
        let key = name.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "passport" | "passeport" => Self::Passport,
            "ticket" | "flight_ticket" | "air_ticket" | "billet" => Self::Ticket,
            "hotel" | "hotel_reservation" | "hotel_booking" | "accommodation" => Self::Hotel,
            "vaccination" | "vaccination_certificate" | "yellow_fever" => Self::Vaccination,
            "invitation" | "invitation_letter" => Self::Invitation,
            "payment" | "payment_receipt" | "receipt" => Self::Payment,
            "verbal_note" | "note_verbale" => Self::VerbalNote,
            "residence_card" | "residence_permit" | "carte_sejour" => Self::ResidenceCard,
            _ => Self::Other,
        }
    }

    /// Human-readable label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::Ticket => "flight ticket",
            Self::Hotel => "hotel reservation",
            Self::Vaccination => "vaccination certificate",
            Self::Invitation => "invitation letter",
            Self::Payment => "payment receipt",
            Self::VerbalNote => "verbal note",
            Self::ResidenceCard => "residence card",
            Self::Other => "document",
        }
    }
}

impl PassportType {
    /// Map an MRZ document code (`P`, `PD`, `PS`...) to a passport type.
    pub fn from_mrz_code(code: &str) -> Self {
        match code.trim_end_matches('<').to_uppercase().as_str() {
            "PD" | "D" => Self::Diplomatique,
            "PS" | "PV" | "PM" | "S" => Self::Service,
            "LP" | "V" => Self::LaissezPasser,
            _ => Self::Ordinaire,
        }
    }

    /// Diplomatic and service passports must be backed by a verbal note.
    pub fn requires_verbal_note(&self) -> bool {
        matches!(self, Self::Diplomatique | Self::Service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn document_type_round_trips_through_str() {
        for t in DocumentType::KNOWN {
            assert_eq!(DocumentType::from_str(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = DocumentType::from_str("birth_certificate").unwrap_err();
        assert!(err.to_string().contains("birth_certificate"));
    }

    #[test]
    fn from_name_is_lenient() {
        assert_eq!(DocumentType::from_name("Flight Ticket"), DocumentType::Ticket);
        assert_eq!(DocumentType::from_name("note-verbale"), DocumentType::VerbalNote);
        assert_eq!(DocumentType::from_name("birth_certificate"), DocumentType::Other);
    }

    #[test]
    fn severity_orders_info_below_error() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&DocumentType::VerbalNote).unwrap();
        assert_eq!(json, "\"verbal_note\"");
        let level: RiskLevel = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(level, RiskLevel::Critical);
    }

    #[test]
    fn passport_type_from_mrz_code() {
        assert_eq!(PassportType::from_mrz_code("P<"), PassportType::Ordinaire);
        assert_eq!(PassportType::from_mrz_code("PD"), PassportType::Diplomatique);
        assert_eq!(PassportType::from_mrz_code("PS"), PassportType::Service);
        assert_eq!(PassportType::from_mrz_code("LP"), PassportType::LaissezPasser);
        assert!(PassportType::Service.requires_verbal_note());
        assert!(!PassportType::Ordinaire.requires_verbal_note());
    }
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DocumentType, RiskLevel};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Application context a dossier is judged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskContext {
    pub today: NaiveDate,
    pub visa_type: String,
    pub express: bool,
}

impl RiskContext {
    /// Tourist visa, standard processing.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            visa_type: "tourist".to_string(),
            express: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Fraud indicators and anomalies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudType {
    InvalidMrzChecksum,
    ExpiredPassport,
    PassportExpiringSoon,
    InvalidYellowFever,
    IncorrectPaymentAmount,
    WrongDestination,
    MissingVerbalNote,
}

impl FraudType {
    pub fn weight(&self) -> f64 {
        match self {
            Self::InvalidMrzChecksum | Self::ExpiredPassport | Self::MissingVerbalNote => 3.0,
            Self::PassportExpiringSoon | Self::InvalidYellowFever => 2.0,
            Self::IncorrectPaymentAmount => 1.5,
            Self::WrongDestination => 1.0,
        }
    }

    pub fn severity(&self) -> RiskLevel {
        match self {
            Self::InvalidMrzChecksum | Self::ExpiredPassport | Self::MissingVerbalNote => {
                RiskLevel::Critical
            }
            Self::PassportExpiringSoon | Self::InvalidYellowFever => RiskLevel::High,
            Self::IncorrectPaymentAmount | Self::WrongDestination => RiskLevel::Medium,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidMrzChecksum => "MRZ checksum validation failed",
            Self::ExpiredPassport => "Passport is expired",
            Self::PassportExpiringSoon => "Passport expires within 6 months",
            Self::InvalidYellowFever => "Yellow fever vaccination invalid or missing",
            Self::IncorrectPaymentAmount => "Payment amount does not match expected visa fee",
            Self::WrongDestination => "Flight destination is not Côte d'Ivoire",
            Self::MissingVerbalNote => "Verbal note required for diplomatic passport but missing",
        }
    }
}

/// One fraud signal. The weight is derived from the type and never
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudIndicator {
    #[serde(rename = "type")]
    pub indicator_type: FraudType,
    pub severity: RiskLevel,
    pub description: String,
}

impl FraudIndicator {
    pub fn new(indicator_type: FraudType) -> Self {
        Self {
            indicator_type,
            severity: indicator_type.severity(),
            description: indicator_type.description().to_string(),
        }
    }

    pub fn weight(&self) -> f64 {
        self.indicator_type.weight()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    LongStay,
    UrgentTravel,
    UnnotarizedInvitation,
}

/// Unusual but not fraudulent. Every anomaly weighs 0.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub description: String,
}

impl Anomaly {
    pub const WEIGHT: f64 = 0.5;

    pub fn new(anomaly_type: AnomalyType, description: impl Into<String>) -> Self {
        Self {
            anomaly_type,
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-document and cross-document results
// ---------------------------------------------------------------------------

/// Required-field and verdict check of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCheck {
    pub valid: bool,
    /// 1.0 multiplied by 0.9 per failed check.
    pub confidence: f64,
    pub missing_fields: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamePair {
    pub first: DocumentType,
    pub second: DocumentType,
    pub similarity: f64,
    pub matches: bool,
}

/// Pairwise comparison of the holder names found across documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameConsistency {
    pub consistent: bool,
    pub min_similarity: f64,
    pub average_similarity: f64,
    pub threshold: f64,
    /// Distinct normalized spellings, only when inconsistent.
    pub variations: Vec<String>,
    pub pairs: Vec<NamePair>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    /// `None` when fewer than two documents carry a name.
    pub name_consistency: Option<NameConsistency>,
    pub date_issues: Vec<String>,
    pub date_warnings: Vec<String>,
    /// Conflicting nationality codes, when any.
    pub nationality_mismatch: Vec<String>,
    /// Conflicting passport numbers, when any.
    pub passport_number_mismatch: Vec<String>,
}

impl CrossValidation {
    pub fn names_consistent(&self) -> bool {
        self.name_consistency.as_ref().map_or(true, |n| n.consistent)
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Reject,
    ManualReview,
    ProceedWithCaution,
    Approve,
}

impl Recommendation {
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Critical => Self::Reject,
            RiskLevel::High => Self::ManualReview,
            RiskLevel::Medium => Self::ProceedWithCaution,
            RiskLevel::Low => Self::Approve,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Reject => "Critical fraud indicators detected",
            Self::ManualReview => "High risk, requires human verification",
            Self::ProceedWithCaution => "Additional verification recommended",
            Self::Approve => "Low risk application",
        }
    }
}

/// Weighted fraud and anomaly verdict on a dossier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub valid: bool,
    /// `1 - risk_score`
    pub confidence: f64,
    pub fraud_indicators: Vec<FraudIndicator>,
    pub anomalies: Vec<Anomaly>,
    /// 0.0-1.0, rounded to three decimals.
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub requires_manual_review: bool,
    pub review_reasons: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub document_results: BTreeMap<DocumentType, DocumentCheck>,
    pub cross_validation: CrossValidation,
}

impl RiskAssessment {
    pub fn has_indicator(&self, indicator_type: FraudType) -> bool {
        self.fraud_indicators
            .iter()
            .any(|i| i.indicator_type == indicator_type)
    }

    pub fn has_anomaly(&self, anomaly_type: AnomalyType) -> bool {
        self.anomalies.iter().any(|a| a.anomaly_type == anomaly_type)
    }

    /// Officer-facing one-paragraph summary. Weights are not shown.
    pub fn summary(&self) -> String {
        let mut summary = format!("Risk level {}.", self.risk_level);
        if !self.fraud_indicators.is_empty() {
            let items: Vec<&str> = self
                .fraud_indicators
                .iter()
                .map(|i| i.description.as_str())
                .collect();
            summary.push_str(&format!(" Indicators: {}.", items.join("; ")));
        }
        if !self.anomalies.is_empty() {
            let items: Vec<&str> = self.anomalies.iter().map(|a| a.description.as_str()).collect();
            summary.push_str(&format!(" Anomalies: {}.", items.join("; ")));
        }
        if let Some(first) = self.recommendations.first() {
            summary.push_str(&format!(" {}.", first.message()));
        }
        summary
    }
}

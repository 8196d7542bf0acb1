use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matching::MatchKind;
use crate::models::DocumentType;

/// How much a field disagreement matters for the dossier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancySeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub kind: MatchKind,
    pub value: Value,
    pub similarity: u32,
}

/// Expected (prefilled) value that the extracted document disagrees with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: String,
    /// `Missing` or `Mismatch`.
    pub kind: MatchKind,
    pub expected: Value,
    pub extracted: Option<Value>,
    pub similarity: u32,
    pub severity: DiscrepancySeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of comparing one extracted document with its expected values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub document_type: DocumentType,
    pub valid: bool,
    pub has_prefill: bool,
    /// matched / total, in whole percent.
    pub overall_score: u32,
    pub total_fields: usize,
    pub matched_fields: usize,
    pub matches: Vec<FieldMatch>,
    pub discrepancies: Vec<Discrepancy>,
    pub requires_user_confirmation: bool,
}

impl SyncResult {
    pub fn high_severity(&self) -> impl Iterator<Item = &Discrepancy> {
        self.discrepancies
            .iter()
            .filter(|d| d.severity == DiscrepancySeverity::High)
    }
}

// ---------------------------------------------------------------------------
// Document pair checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairIssue {
    ArrivalDateMismatch,
    DurationMismatch,
    ReturnDateMismatch,
    TicketTooShort,
    CheckinMismatch,
    AccommodationGap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDiscrepancy {
    pub issue: PairIssue,
    pub severity: DiscrepancySeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_difference: Option<i64>,
    /// Issue-specific numbers (durations, coverage).
    pub details: Value,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvitationTicketSummary {
    pub invitation_arrival: Option<NaiveDate>,
    pub invitation_departure: Option<NaiveDate>,
    pub invitation_duration: Option<i64>,
    pub ticket_arrival: Option<NaiveDate>,
    pub ticket_return: Option<NaiveDate>,
    pub ticket_duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationTicketCheck {
    pub is_coherent: bool,
    /// `max(0, 100 - 30·discrepancies)`
    pub coherence_score: u32,
    pub discrepancies: Vec<PairDiscrepancy>,
    pub warnings: Vec<PairDiscrepancy>,
    pub summary: InvitationTicketSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelTicketCheck {
    pub is_coherent: bool,
    pub discrepancies: Vec<PairDiscrepancy>,
}

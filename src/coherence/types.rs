use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{DocumentType, Severity};

// ---------------------------------------------------------------------------
// IssueType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    ReturnFlightMissing,
    AccommodationMissing,
    AccommodationGap,
    DateMismatch,
    LocationMismatch,
    NameMismatch,
    PassportExpiry,
    NonJurisdiction,
    LongStay,
    VaccinationMissing,
    VaccinationExpired,
    UrgentTravel,
    MinorTraveling,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReturnFlightMissing => "return_flight_missing",
            Self::AccommodationMissing => "accommodation_missing",
            Self::AccommodationGap => "accommodation_gap",
            Self::DateMismatch => "date_mismatch",
            Self::LocationMismatch => "location_mismatch",
            Self::NameMismatch => "name_mismatch",
            Self::PassportExpiry => "passport_expiry",
            Self::NonJurisdiction => "non_jurisdiction",
            Self::LongStay => "long_stay",
            Self::VaccinationMissing => "vaccination_missing",
            Self::VaccinationExpired => "vaccination_expired",
            Self::UrgentTravel => "urgent_travel",
            Self::MinorTraveling => "minor_traveling",
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Upload,
    Confirm,
    Update,
    Redirect,
}

/// Something the applicant can do to resolve an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub label: String,
    /// Document slot an upload action targets (`hotel`, `ticket_return`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IssueAction {
    pub fn upload(label: &str, doc_type: &str) -> Self {
        Self {
            action_type: ActionType::Upload,
            label: label.to_string(),
            doc_type: Some(doc_type.to_string()),
            detail: None,
        }
    }

    pub fn other(action_type: ActionType, label: &str) -> Self {
        Self {
            action_type,
            label: label.to_string(),
            doc_type: None,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// An issue's action, tagged with the issue that asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    pub issue_type: IssueType,
    #[serde(flatten)]
    pub action: IssueAction,
}

// ---------------------------------------------------------------------------
// CoherenceIssue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub actions: Vec<IssueAction>,
}

impl CoherenceIssue {
    pub fn new(issue_type: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
            data: Value::Null,
            actions: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_action(mut self, action: IssueAction) -> Self {
        self.actions.push(action);
        self
    }
}

// ---------------------------------------------------------------------------
// StayInfo
// ---------------------------------------------------------------------------

/// Where the stay duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaySource {
    Ticket,
    Invitation,
    #[default]
    None,
}

/// Stay window derived from the dossier. Recomputed on every validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StayInfo {
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub stay_days: Option<i64>,
    pub accommodation_nights: i64,
    pub accommodation_from: Option<NaiveDate>,
    pub accommodation_to: Option<NaiveDate>,
    pub invitation_from: Option<NaiveDate>,
    pub invitation_to: Option<NaiveDate>,
    pub invitation_days: Option<i64>,
    pub accommodation_provided: bool,
    pub source: StaySource,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DossierSummary {
    pub documents_count: usize,
    pub documents_present: Vec<DocumentType>,
    pub applicant_name: Option<String>,
    pub destination: String,
    pub purpose: Option<String>,
    pub stay_duration: Option<String>,
    pub issues_count: usize,
    pub errors_count: usize,
    pub warnings_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceReport {
    pub is_coherent: bool,
    pub is_blocked: bool,
    pub has_warnings: bool,
    /// Errors first, then warnings, then infos.
    pub issues: Vec<CoherenceIssue>,
    pub required_actions: Vec<RequiredAction>,
    pub stay_info: StayInfo,
    pub summary: DossierSummary,
    pub validated_on: NaiveDate,
}

impl CoherenceReport {
    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }

    pub fn issues_of(&self, issue_type: IssueType) -> impl Iterator<Item = &CoherenceIssue> {
        self.issues.iter().filter(move |i| i.issue_type == issue_type)
    }

    pub fn errors(&self) -> impl Iterator<Item = &CoherenceIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }
}

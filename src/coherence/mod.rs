//! Dossier-wide coherence checks.
//!
//! Eleven independent rules run over the canonical documents and the derived
//! stay window. Issues are sorted errors first; any error blocks the dossier.
//! Nothing is stored: every call recomputes from the dossier.

mod messages;
mod rules;
mod stay;
mod types;

pub use messages::MessageTemplates;
pub use rules::*;
pub use stay::compute_stay;
pub use types::*;

use std::cmp::Reverse;
use std::time::Instant;

use chrono::{NaiveDate, Utc};

use crate::config::DESTINATION_COUNTRY;
use crate::models::{Dossier, Severity};

/// Runs the coherence rules. Stateless; `validate_dossier_at` pins the
/// evaluation date for reproducible results.
#[derive(Debug, Clone, Default)]
pub struct CoherenceValidator;

impl CoherenceValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_dossier(&self, dossier: &Dossier) -> CoherenceReport {
        self.validate_dossier_at(dossier, Utc::now().date_naive())
    }

    pub fn validate_dossier_at(&self, dossier: &Dossier, today: NaiveDate) -> CoherenceReport {
        let start = Instant::now();
        let stay = compute_stay(dossier);

        let mut issues: Vec<CoherenceIssue> = RULES
            .iter()
            .flat_map(|(name, rule)| {
                let found = rule(dossier, &stay, today);
                if !found.is_empty() {
                    tracing::debug!(rule = name, count = found.len(), "Coherence rule fired");
                }
                found
            })
            .collect();
        // Stable: rule order is kept within a severity.
        issues.sort_by_key(|i| Reverse(i.severity));

        let required_actions = issues
            .iter()
            .flat_map(|issue| {
                issue.actions.iter().map(|action| RequiredAction {
                    issue_type: issue.issue_type,
                    action: action.clone(),
                })
            })
            .collect();

        let errors_count = count_severity(&issues, Severity::Error);
        let warnings_count = count_severity(&issues, Severity::Warning);
        let summary = build_summary(dossier, &stay, issues.len(), errors_count, warnings_count);

        tracing::info!(
            documents = summary.documents_count,
            issues = issues.len(),
            errors = errors_count,
            warnings = warnings_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dossier coherence validated"
        );

        CoherenceReport {
            is_coherent: issues.is_empty(),
            is_blocked: errors_count > 0,
            has_warnings: warnings_count > 0,
            issues,
            required_actions,
            stay_info: stay,
            summary,
            validated_on: today,
        }
    }
}

/// Validate with a fresh validator against today's date.
pub fn validate_dossier(dossier: &Dossier) -> CoherenceReport {
    CoherenceValidator::new().validate_dossier(dossier)
}

fn count_severity(issues: &[CoherenceIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

fn build_summary(
    dossier: &Dossier,
    stay: &StayInfo,
    issues_count: usize,
    errors_count: usize,
    warnings_count: usize,
) -> DossierSummary {
    let stay_duration = stay.stay_days.map(|days| {
        let mut text = format!("{days} day(s)");
        if let Some(arrival) = stay.arrival_date {
            match stay.departure_date {
                Some(departure) => text.push_str(&format!(" (from {arrival} to {departure})")),
                None => text.push_str(&format!(" (from {arrival})")),
            }
        }
        text
    });

    DossierSummary {
        documents_count: dossier.len(),
        documents_present: dossier.present_types(),
        applicant_name: dossier.applicant_name(),
        destination: DESTINATION_COUNTRY.to_string(),
        purpose: dossier.invitation.as_ref().and_then(|i| i.purpose.clone()),
        stay_duration,
        issues_count,
        errors_count,
        warnings_count,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::DocumentType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// A complete, clean dossier for a June 2025 trip.
    fn clean_docs() -> serde_json::Value {
        json!({
            "passport": {
                "surname": "TESFAYE",
                "given_names": "ABEBE KEBEDE",
                "nationality": "ETH",
                "date_of_birth": "1985-03-12",
                "expiry_date": "2030-01-01",
            },
            "ticket": {
                "passenger_name": "TESFAYE ABEBE KEBEDE",
                "departure_date": "2025-06-01",
                "return_date": "2025-06-15",
                "arrival_airport": "ABJ",
            },
            "hotel": {
                "guest_name": "Abebe Kebede Tesfaye",
                "hotel_city": "Abidjan",
                "check_in_date": "2025-06-01",
                "check_out_date": "2025-06-15",
            },
            "vaccination": {"holder_name": "ABEBE KEBEDE TESFAYE", "vaccination_date": "2020-01-10"},
        })
    }

    fn validate(docs: &serde_json::Value) -> CoherenceReport {
        CoherenceValidator::new().validate_dossier_at(&Dossier::from_json(docs), d(2025, 5, 1))
    }

    #[test]
    fn clean_dossier_is_coherent() {
        let report = validate(&clean_docs());
        assert!(report.is_coherent, "{:?}", report.issues);
        assert!(!report.is_blocked);
        assert_eq!(report.stay_info.stay_days, Some(14));
        assert_eq!(report.summary.documents_count, 4);
        assert_eq!(report.summary.applicant_name.as_deref(), Some("ABEBE KEBEDE TESFAYE"));
        assert_eq!(
            report.summary.stay_duration.as_deref(),
            Some("14 day(s) (from 2025-06-01 to 2025-06-15)")
        );
    }

    #[test]
    fn ninety_one_day_stay_is_blocked() {
        let mut docs = clean_docs();
        docs["ticket"]["return_date"] = json!("2025-08-31");
        docs["hotel"]["check_out_date"] = json!("2025-08-31");
        let report = validate(&docs);
        assert_eq!(report.stay_info.stay_days, Some(91));
        assert!(report.is_blocked);
        let long: Vec<_> = report.issues_of(IssueType::LongStay).collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].severity, Severity::Error);
        assert_eq!(long[0].data["stay_days"], 91);
        assert_eq!(long[0].data["max_allowed"], 90);
    }

    #[test]
    fn missing_vaccination_is_a_single_error_with_upload() {
        let mut docs = clean_docs();
        docs.as_object_mut().unwrap().remove("vaccination");
        let report = validate(&docs);
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].issue_type, IssueType::VaccinationMissing);
        assert_eq!(errors[0].actions[0].action_type, ActionType::Upload);
        assert_eq!(errors[0].actions[0].doc_type.as_deref(), Some("vaccination"));
        assert!(report.is_blocked);
        assert_eq!(report.required_actions[0].issue_type, IssueType::VaccinationMissing);
    }

    #[test]
    fn expired_passport_blocks_the_trip() {
        let mut docs = clean_docs();
        docs["passport"]["expiry_date"] = json!("2025-01-10");
        let report = CoherenceValidator::new()
            .validate_dossier_at(&Dossier::from_json(&docs), d(2025, 1, 2));
        let expiry: Vec<_> = report.issues_of(IssueType::PassportExpiry).collect();
        assert_eq!(expiry.len(), 1);
        assert_eq!(expiry[0].severity, Severity::Error);
        assert!(report.is_blocked);
    }

    #[test]
    fn one_way_ticket_on_expiring_passport() {
        let docs = json!({
            "passport": {
                "surname": "TESFAYE",
                "given_names": "ABEBE KEBEDE",
                "nationality": "ETH",
                "expiry_date": "2025-01-10",
            },
            "ticket": {"passenger_name": "TESFAYE ABEBE KEBEDE", "departure_date": "2025-06-01"},
        });
        let report = validate(&docs);

        let return_missing: Vec<_> = report.issues_of(IssueType::ReturnFlightMissing).collect();
        assert_eq!(return_missing.len(), 1);
        assert_eq!(return_missing[0].severity, Severity::Warning);

        let expiry: Vec<_> = report.issues_of(IssueType::PassportExpiry).collect();
        assert_eq!(expiry.len(), 1);
        assert_eq!(expiry[0].severity, Severity::Error);
        assert!(report.is_blocked);
        assert!(report.has_warnings);
    }

    #[test]
    fn foreign_nationality_is_redirected() {
        let mut docs = clean_docs();
        docs["passport"]["nationality"] = json!("USA");
        let report = validate(&docs);
        let issue = report.issues_of(IssueType::NonJurisdiction).next().unwrap();
        assert_eq!(issue.severity, Severity::Error);
        let post = issue.data["suggested_embassy"].as_str().unwrap();
        assert!(post.contains("embassy of Côte d'Ivoire"));
        assert!(issue.message.contains(post));
        assert!(report
            .required_actions
            .iter()
            .any(|a| a.issue_type == IssueType::NonJurisdiction && a.action.action_type == ActionType::Redirect));
    }

    #[test]
    fn issues_are_sorted_errors_first() {
        let mut docs = clean_docs();
        docs.as_object_mut().unwrap().remove("vaccination");
        docs["hotel"]["check_in_date"] = json!("2025-06-05");
        docs["ticket"].as_object_mut().unwrap().remove("return_date");
        let report = validate(&docs);
        let severities: Vec<Severity> = report.issues.iter().map(|i| i.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by_key(|s| Reverse(*s));
        assert_eq!(severities, sorted);
        assert_eq!(severities.first(), Some(&Severity::Error));
        assert!(report.has_warnings);
        assert_eq!(report.summary.errors_count, 1);
        assert_eq!(report.summary.issues_count, report.issues.len());
        assert_eq!(report.summary.documents_present[0], DocumentType::Passport);
    }

    #[test]
    fn report_serializes_snake_case() {
        let mut docs = clean_docs();
        docs.as_object_mut().unwrap().remove("vaccination");
        let value = serde_json::to_value(validate(&docs)).unwrap();
        assert_eq!(value["issues"][0]["type"], "vaccination_missing");
        assert_eq!(value["issues"][0]["severity"], "error");
        assert_eq!(value["required_actions"][0]["issue_type"], "vaccination_missing");
        assert_eq!(value["required_actions"][0]["type"], "upload");
        assert_eq!(value["stay_info"]["source"], "ticket");
    }
}

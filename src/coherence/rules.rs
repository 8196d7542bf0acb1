//! The eleven dossier rules. Each is a pure function of the dossier, the
//! derived stay window and the evaluation date.

use std::collections::BTreeSet;

use chrono::{Months, NaiveDate};
use serde_json::json;

use crate::config::thresholds;
use crate::matching::{name_tokens, FuzzyMatcher, MatchKind};
use crate::models::{DocumentType, Dossier, Severity};
use crate::parsing::{add_months, age_at, days_between, normalize_city};
use crate::reference::{alternate_post, is_in_jurisdiction, HOST_CITY, JURISDICTION_COUNTRIES};
use crate::risk::collect_names;

use super::messages::MessageTemplates;
use super::types::*;

pub type Rule = fn(&Dossier, &StayInfo, NaiveDate) -> Vec<CoherenceIssue>;

/// Rules in evaluation order.
pub const RULES: [(&str, Rule); 11] = [
    ("return_flight", check_return_flight),
    ("accommodation", check_accommodation),
    ("dates", check_dates),
    ("location", check_location),
    ("names", check_names),
    ("passport_validity", check_passport_validity),
    ("jurisdiction", check_jurisdiction),
    ("long_stay", check_long_stay),
    ("vaccination", check_vaccination),
    ("urgent_travel", check_urgent_travel),
    ("minor", check_minor),
];

/// Documents a minor must add to the dossier.
pub const GUARDIANSHIP_DOCUMENTS: [&str; 3] = [
    "Signed and legalized parental authorization",
    "Copy of both parents' identity documents",
    "Child's birth certificate",
];

// ---------------------------------------------------------------------------
// [1] Return flight
// ---------------------------------------------------------------------------

pub fn check_return_flight(dossier: &Dossier, stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    let Some(ticket) = &dossier.ticket else {
        return Vec::new();
    };
    if ticket.has_return() {
        return Vec::new();
    }
    vec![CoherenceIssue::new(
        IssueType::ReturnFlightMissing,
        Severity::Warning,
        MessageTemplates::return_flight_missing(stay.invitation_days),
    )
    .with_data(json!({"invitation_days": stay.invitation_days}))
    .with_action(IssueAction::upload("Upload return ticket", "ticket_return"))
    .with_action(IssueAction::other(
        ActionType::Confirm,
        "Return flight is on a separate ticket",
    ))]
}

// ---------------------------------------------------------------------------
// [2] Accommodation
// ---------------------------------------------------------------------------

pub fn check_accommodation(dossier: &Dossier, stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    if dossier.hotel.is_none() && !stay.accommodation_provided {
        return vec![CoherenceIssue::new(
            IssueType::AccommodationMissing,
            Severity::Warning,
            MessageTemplates::accommodation_missing(),
        )
        .with_action(IssueAction::upload("Upload hotel reservation", "hotel"))];
    }

    let stay_days = stay.stay_days.unwrap_or(0);
    let nights = stay.accommodation_nights;
    if stay_days <= 0 || nights <= 0 || stay_days <= nights {
        return Vec::new();
    }

    let gap = stay_days - nights;
    let coverage = (nights as f64 / stay_days as f64 * 100.0).round() as i64;
    let mut issue = CoherenceIssue::new(
        IssueType::AccommodationGap,
        if stay.accommodation_provided {
            Severity::Info
        } else {
            Severity::Warning
        },
        MessageTemplates::accommodation_gap(nights, stay_days, coverage, stay.accommodation_provided),
    )
    .with_data(json!({
        "stay_days": stay_days,
        "accommodation_nights": nights,
        "gap_days": gap,
        "coverage_percent": coverage,
        "accommodation_provided": stay.accommodation_provided,
    }));

    if !stay.accommodation_provided {
        let uncovered_from = stay.accommodation_to;
        let uncovered_to = stay.departure_date.or(stay.invitation_to);
        let mut upload = IssueAction::upload("Upload additional accommodation proof", "hotel_additional");
        if let (Some(from), Some(to)) = (uncovered_from, uncovered_to) {
            upload = upload.with_detail(format!("For the period from {from} to {to}"));
        }
        issue = issue
            .with_action(upload)
            .with_action(IssueAction::other(ActionType::Confirm, "Hosted by inviter"));
    }
    vec![issue]
}

// ---------------------------------------------------------------------------
// [3] Dates
// ---------------------------------------------------------------------------

fn beyond_delta(a: NaiveDate, b: NaiveDate) -> Option<i64> {
    let days = days_between(a, b).abs();
    (days > thresholds::DATE_DELTA_DAYS).then_some(days)
}

pub fn check_dates(_dossier: &Dossier, stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    let mut issues = Vec::new();

    if let (Some(arrival), Some(start)) = (stay.arrival_date, stay.invitation_from) {
        if let Some(days) = beyond_delta(arrival, start) {
            issues.push(
                CoherenceIssue::new(
                    IssueType::DateMismatch,
                    Severity::Info,
                    MessageTemplates::arrival_after_invitation(&arrival.to_string(), &start.to_string()),
                )
                .with_data(json!({
                    "flight_arrival": arrival,
                    "invitation_start": start,
                    "days_difference": days,
                })),
            );
        }
    }

    if let (Some(departure), Some(end)) = (stay.departure_date, stay.invitation_to) {
        if let Some(days) = beyond_delta(departure, end) {
            issues.push(
                CoherenceIssue::new(
                    IssueType::DateMismatch,
                    Severity::Info,
                    MessageTemplates::departure_before_invitation_end(
                        &departure.to_string(),
                        &end.to_string(),
                    ),
                )
                .with_data(json!({
                    "flight_departure": departure,
                    "invitation_end": end,
                    "days_difference": days,
                })),
            );
        }
    }

    if let (Some(arrival), Some(check_in)) = (stay.arrival_date, stay.accommodation_from) {
        if let Some(days) = beyond_delta(arrival, check_in) {
            issues.push(
                CoherenceIssue::new(
                    IssueType::DateMismatch,
                    Severity::Info,
                    MessageTemplates::checkin_vs_arrival(&check_in.to_string(), &arrival.to_string()),
                )
                .with_data(json!({
                    "hotel_check_in": check_in,
                    "flight_arrival": arrival,
                    "days_difference": days,
                })),
            );
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// [4] Location
// ---------------------------------------------------------------------------

pub fn check_location(dossier: &Dossier, _stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    let hotel_city = dossier.hotel.as_ref().and_then(|h| h.city.as_deref());
    let arrival_city = dossier.ticket.as_ref().and_then(|t| t.arrival_city.as_deref());
    let (Some(hotel_city), Some(arrival_city)) = (hotel_city, arrival_city) else {
        return Vec::new();
    };

    let host = normalize_city(HOST_CITY);
    if normalize_city(arrival_city) != host || normalize_city(hotel_city) == host {
        return Vec::new();
    }
    vec![CoherenceIssue::new(
        IssueType::LocationMismatch,
        Severity::Info,
        MessageTemplates::location_mismatch(hotel_city, HOST_CITY),
    )
    .with_data(json!({"hotel_city": hotel_city, "arrival_city": arrival_city}))]
}

// ---------------------------------------------------------------------------
// [5] Names
// ---------------------------------------------------------------------------

/// Whether every token of one name appears in the other, in any order.
fn tokens_contained(a: &str, b: &str) -> bool {
    let ta: BTreeSet<String> = name_tokens(a).into_iter().collect();
    let tb: BTreeSet<String> = name_tokens(b).into_iter().collect();
    !ta.is_empty() && !tb.is_empty() && (ta.is_subset(&tb) || tb.is_subset(&ta))
}

pub fn check_names(dossier: &Dossier, _stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    let names = collect_names(dossier);
    let Some((DocumentType::Passport, passport_name)) = names.first() else {
        return Vec::new();
    };

    let matcher = FuzzyMatcher::default();
    let mut issues = Vec::new();
    for (doc_type, name) in names.iter().skip(1) {
        let comparison = matcher.compare_names(passport_name, name);
        let similarity = f64::from(comparison.similarity) / 100.0;
        let partial = matches!(comparison.kind, MatchKind::Exact | MatchKind::Partial)
            || tokens_contained(passport_name, name);
        if similarity >= thresholds::NAME_COHERENCE || partial {
            continue;
        }
        tracing::debug!(document = %doc_type, similarity, "Name differs from passport");
        issues.push(
            CoherenceIssue::new(
                IssueType::NameMismatch,
                Severity::Warning,
                MessageTemplates::name_mismatch(doc_type.label(), name, passport_name),
            )
            .with_data(json!({
                "document": doc_type,
                "passport_name": passport_name,
                "document_name": name,
                "similarity": similarity,
            })),
        );
    }
    issues
}

// ---------------------------------------------------------------------------
// [6] Passport validity
// ---------------------------------------------------------------------------

pub fn check_passport_validity(dossier: &Dossier, stay: &StayInfo, today: NaiveDate) -> Vec<CoherenceIssue> {
    let Some(expiry) = dossier.passport.as_ref().and_then(|p| p.expiry_date) else {
        return Vec::new();
    };
    let months = thresholds::PASSPORT_VALIDITY_MONTHS;
    let stay_end = stay
        .departure_date
        .or(stay.invitation_to)
        .unwrap_or_else(|| add_months(today, months));
    let data = json!({"expiry_date": expiry, "stay_end": stay_end});

    if expiry < stay_end {
        return vec![CoherenceIssue::new(
            IssueType::PassportExpiry,
            Severity::Error,
            MessageTemplates::passport_expires_before_stay_end(&expiry.to_string()),
        )
        .with_data(data)
        .with_action(IssueAction::other(ActionType::Update, "Renew passport"))];
    }
    if expiry < add_months(stay_end, months) {
        return vec![CoherenceIssue::new(
            IssueType::PassportExpiry,
            Severity::Warning,
            MessageTemplates::passport_validity_short(&expiry.to_string(), months),
        )
        .with_data(data)];
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// [7] Jurisdiction
// ---------------------------------------------------------------------------

pub fn check_jurisdiction(dossier: &Dossier, _stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    let Some(nationality) = dossier.nationality_code() else {
        return Vec::new();
    };
    if is_in_jurisdiction(&nationality) {
        return Vec::new();
    }
    let post = alternate_post(&nationality);
    vec![CoherenceIssue::new(
        IssueType::NonJurisdiction,
        Severity::Error,
        MessageTemplates::non_jurisdiction(&nationality, post),
    )
    .with_data(json!({
        "nationality": nationality,
        "jurisdiction_countries": JURISDICTION_COUNTRIES,
        "suggested_embassy": post,
    }))
    .with_action(IssueAction::other(ActionType::Redirect, "Contact another embassy").with_detail(post))]
}

// ---------------------------------------------------------------------------
// [8] Long stay
// ---------------------------------------------------------------------------

pub fn check_long_stay(_dossier: &Dossier, stay: &StayInfo, _today: NaiveDate) -> Vec<CoherenceIssue> {
    let max = thresholds::MAX_STAY_DAYS;
    match stay.stay_days {
        Some(days) if days > max => vec![CoherenceIssue::new(
            IssueType::LongStay,
            Severity::Error,
            MessageTemplates::long_stay(days, max),
        )
        .with_data(json!({"stay_days": days, "max_allowed": max}))
        .with_action(
            IssueAction::other(ActionType::Redirect, "Apply for a long-stay visa")
                .with_detail("Contact the embassy directly"),
        )],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// [9] Vaccination
// ---------------------------------------------------------------------------

pub fn check_vaccination(dossier: &Dossier, _stay: &StayInfo, today: NaiveDate) -> Vec<CoherenceIssue> {
    let Some(vaccination) = &dossier.vaccination else {
        return vec![CoherenceIssue::new(
            IssueType::VaccinationMissing,
            Severity::Error,
            MessageTemplates::vaccination_missing(),
        )
        .with_action(IssueAction::upload("Upload vaccination certificate", "vaccination"))];
    };

    if vaccination.valid == Some(false) {
        return vec![CoherenceIssue::new(
            IssueType::VaccinationExpired,
            Severity::Error,
            MessageTemplates::vaccination_invalid(),
        )
        .with_action(IssueAction::upload("Upload new certificate", "vaccination"))];
    }

    let years = thresholds::VACCINATION_MAX_AGE_YEARS;
    let cutoff = today.checked_sub_months(Months::new(years.unsigned_abs() * 12));
    match (vaccination.yellow_fever_date, cutoff) {
        (Some(date), Some(cutoff)) if date < cutoff => vec![CoherenceIssue::new(
            IssueType::VaccinationExpired,
            Severity::Warning,
            MessageTemplates::vaccination_old(&date.to_string(), years),
        )
        .with_data(json!({"vaccination_date": date}))],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// [10] Urgent travel
// ---------------------------------------------------------------------------

pub fn check_urgent_travel(_dossier: &Dossier, stay: &StayInfo, today: NaiveDate) -> Vec<CoherenceIssue> {
    let Some(arrival) = stay.arrival_date else {
        return Vec::new();
    };
    let days = days_between(today, arrival);
    if days <= 0 || days >= thresholds::MIN_NOTICE_DAYS {
        return Vec::new();
    }
    vec![CoherenceIssue::new(
        IssueType::UrgentTravel,
        Severity::Warning,
        MessageTemplates::urgent_travel(days),
    )
    .with_data(json!({
        "days_until_travel": days,
        "min_recommended": thresholds::MIN_NOTICE_DAYS,
    }))]
}

// ---------------------------------------------------------------------------
// [11] Minor traveling
// ---------------------------------------------------------------------------

pub fn check_minor(dossier: &Dossier, _stay: &StayInfo, today: NaiveDate) -> Vec<CoherenceIssue> {
    let Some(dob) = dossier.passport.as_ref().and_then(|p| p.date_of_birth) else {
        return Vec::new();
    };
    let age = age_at(dob, today);
    if age < 0 || age >= thresholds::ADULT_AGE as i32 {
        return Vec::new();
    }
    vec![CoherenceIssue::new(
        IssueType::MinorTraveling,
        Severity::Warning,
        MessageTemplates::minor_traveling(age),
    )
    .with_data(json!({
        "age": age,
        "date_of_birth": dob,
        "required_documents": GUARDIANSHIP_DOCUMENTS,
    }))
    .with_action(IssueAction::upload("Upload parental authorization", "parental_consent"))]
}

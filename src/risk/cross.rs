use crate::config::thresholds;
use crate::models::{CanonicalDocument, DocumentType, Dossier};
use crate::parsing::{add_months, days_between};
use crate::reference;

use super::names::check_name_consistency;
use super::types::CrossValidation;

/// Holder names per document. The passport reads "SURNAME GIVEN".
pub fn collect_names(dossier: &Dossier) -> Vec<(DocumentType, String)> {
    let mut names = Vec::new();
    if let Some(passport) = &dossier.passport {
        let parts: Vec<&str> = [passport.surname.as_deref(), passport.given_names.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        let name = if parts.is_empty() {
            passport.full_name.clone()
        } else {
            Some(parts.join(" "))
        };
        if let Some(name) = name {
            names.push((DocumentType::Passport, name));
        }
    }
    for doc_type in [
        DocumentType::Ticket,
        DocumentType::Hotel,
        DocumentType::Vaccination,
        DocumentType::Invitation,
    ] {
        if let Some(name) = dossier.get(doc_type).as_ref().and_then(CanonicalDocument::holder_name) {
            names.push((doc_type, name));
        }
    }
    names
}

fn date_checks(dossier: &Dossier, cross: &mut CrossValidation) {
    let travel = dossier.ticket.as_ref().and_then(|t| t.arrival());
    let expiry = dossier.passport.as_ref().and_then(|p| p.expiry_date);

    if let (Some(travel), Some(expiry)) = (travel, expiry) {
        if travel > expiry {
            cross.date_issues.push("Passport expires before travel date".to_string());
        }
        if add_months(travel, thresholds::PASSPORT_VALIDITY_MONTHS) > expiry {
            cross
                .date_issues
                .push("Passport validity less than 6 months from travel".to_string());
        }
    }

    let Some(hotel) = &dossier.hotel else {
        return;
    };
    let arrival = dossier.ticket.as_ref().and_then(|t| t.arrival_date.or(t.departure_date));
    if let (Some(check_in), Some(arrival)) = (hotel.check_in, arrival) {
        let delta = days_between(arrival, check_in).abs();
        let tolerance = thresholds::CHECKIN_TOLERANCE_DAYS;
        if delta > tolerance {
            cross.date_issues.push(format!(
                "Hotel check-in ({check_in}) is {delta} days from flight arrival ({arrival}) - tolerance is {tolerance} days"
            ));
        } else if delta > 0 {
            cross.date_warnings.push(format!(
                "Hotel check-in ({check_in}) is {delta} day(s) from flight arrival ({arrival}) - within tolerance"
            ));
        }
    }
    if let (Some(check_in), Some(check_out)) = (hotel.check_in, hotel.check_out) {
        if check_out < check_in {
            cross
                .date_issues
                .push("Hotel check-out date is before check-in date".to_string());
        }
    }
}

fn normalize_number(number: &str) -> String {
    number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Distinct values when more than one exists, else empty.
fn conflicts(values: Vec<String>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    if distinct.len() > 1 {
        distinct
    } else {
        Vec::new()
    }
}

/// Cross-document checks: names, dates, nationality and passport number.
pub fn cross_validate(dossier: &Dossier) -> CrossValidation {
    let mut cross = CrossValidation {
        name_consistency: check_name_consistency(
            &collect_names(dossier),
            thresholds::RISK_NAME_CONSISTENCY,
        ),
        ..Default::default()
    };

    date_checks(dossier, &mut cross);

    let nationalities = [
        dossier.passport.as_ref().and_then(|p| p.nationality.as_deref()),
        dossier.residence_card.as_ref().and_then(|r| r.nationality.as_deref()),
    ]
    .into_iter()
    .flatten()
    .map(|n| reference::country_code(n).unwrap_or_else(|| n.trim().to_uppercase()))
    .collect();
    cross.nationality_mismatch = conflicts(nationalities);

    let numbers = [
        dossier.passport.as_ref().and_then(|p| p.passport_number.as_deref()),
        dossier
            .invitation
            .as_ref()
            .and_then(|i| i.invitee_passport_number.as_deref()),
        dossier
            .verbal_note
            .as_ref()
            .and_then(|v| v.diplomat_passport_number.as_deref()),
    ]
    .into_iter()
    .flatten()
    .map(normalize_number)
    .collect();
    cross.passport_number_mismatch = conflicts(numbers);

    if !cross.names_consistent() {
        tracing::info!("Name inconsistency across documents");
    }
    cross
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn hotel_checkin_tolerance() {
        let dossier = |check_in| {
            Dossier::new()
                .with(CanonicalDocument::Ticket(TicketData {
                    departure_date: Some(d(2025, 6, 1)),
                    ..Default::default()
                }))
                .with(CanonicalDocument::Hotel(HotelData {
                    check_in: Some(check_in),
                    check_out: Some(d(2025, 6, 10)),
                    ..Default::default()
                }))
        };
        let near = cross_validate(&dossier(d(2025, 6, 2)));
        assert!(near.date_issues.is_empty());
        assert_eq!(near.date_warnings.len(), 1);

        let far = cross_validate(&dossier(d(2025, 6, 5)));
        assert_eq!(far.date_issues.len(), 1);
        assert!(far.date_issues[0].contains("4 days"));
    }

    #[test]
    fn passport_number_and_nationality_conflicts() {
        let dossier = Dossier::new()
            .with(CanonicalDocument::Passport(PassportData {
                passport_number: Some("EP1234567".into()),
                nationality: Some("Ethiopia".into()),
                ..Default::default()
            }))
            .with(CanonicalDocument::Invitation(InvitationData {
                invitee_passport_number: Some("ep 123 4567".into()),
                ..Default::default()
            }))
            .with(CanonicalDocument::ResidenceCard(ResidenceCardData {
                nationality: Some("KEN".into()),
                ..Default::default()
            }));
        let cross = cross_validate(&dossier);
        assert!(cross.passport_number_mismatch.is_empty());
        assert_eq!(cross.nationality_mismatch, vec!["ETH", "KEN"]);
    }

    #[test]
    fn passport_names_read_surname_first() {
        let dossier = Dossier::new().with(CanonicalDocument::Passport(PassportData {
            surname: Some("TESFAYE".into()),
            given_names: Some("ABEBE".into()),
            ..Default::default()
        }));
        assert_eq!(
            collect_names(&dossier),
            vec![(DocumentType::Passport, "TESFAYE ABEBE".to_string())]
        );
        assert!(cross_validate(&dossier).name_consistency.is_none());
    }
}

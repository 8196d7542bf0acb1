//! Date coherence between two specific documents of the dossier.

use serde_json::json;

use crate::models::{HotelData, InvitationData, TicketData};
use crate::parsing::days_between;

use super::types::*;

/// Arrival dates further apart than this are a discrepancy.
const ARRIVAL_TOLERANCE_DAYS: i64 = 1;
const ARRIVAL_HIGH_DAYS: i64 = 7;
/// Stay durations further apart than this are a discrepancy.
const DURATION_TOLERANCE_DAYS: i64 = 3;
const DURATION_HIGH_DAYS: i64 = 14;
const RETURN_TOLERANCE_DAYS: i64 = 3;
const CHECKIN_TOLERANCE_DAYS: i64 = 1;
const SCORE_PENALTY: u32 = 30;

/// Compare the invited visit with the booked flights.
pub fn validate_invitation_vs_ticket(
    invitation: &InvitationData,
    ticket: &TicketData,
) -> InvitationTicketCheck {
    let mut discrepancies = Vec::new();
    let mut warnings = Vec::new();

    let invitation_arrival = invitation.date_from;
    let invitation_departure = invitation.date_to;
    let invitation_duration = invitation.duration_days.or_else(|| invitation.days());
    let ticket_arrival = ticket.arrival();
    let ticket_return = ticket.return_date;
    let ticket_duration = ticket.covered_days().map(i64::abs);

    if let (Some(expected), Some(actual)) = (invitation_arrival, ticket_arrival) {
        let days = days_between(expected, actual).abs();
        if days > ARRIVAL_TOLERANCE_DAYS {
            let severity = if days > ARRIVAL_HIGH_DAYS {
                DiscrepancySeverity::High
            } else {
                DiscrepancySeverity::Medium
            };
            discrepancies.push(PairDiscrepancy {
                issue: PairIssue::ArrivalDateMismatch,
                severity,
                days_difference: Some(days),
                details: json!({"invitation_date": expected, "ticket_date": actual}),
                message: format!(
                    "Arrival date: invitation shows {expected}, ticket shows {actual} ({days} days difference)"
                ),
            });
        }
    }

    if let (Some(ticket_days), Some(invited_days)) = (ticket_duration, invitation_duration) {
        let diff = (ticket_days - invited_days).abs();
        if diff > DURATION_TOLERANCE_DAYS {
            let severity = if diff > DURATION_HIGH_DAYS {
                DiscrepancySeverity::High
            } else {
                DiscrepancySeverity::Medium
            };
            discrepancies.push(PairDiscrepancy {
                issue: PairIssue::DurationMismatch,
                severity,
                days_difference: Some(diff),
                details: json!({"invitation_duration": invited_days, "ticket_duration": ticket_days}),
                message: format!(
                    "Stay duration: invitation mentions {invited_days} days, ticket covers {ticket_days} days ({diff} days difference)"
                ),
            });
        }
    }

    if let (Some(expected), Some(actual)) = (invitation_departure, ticket_return) {
        let days = days_between(expected, actual).abs();
        if days > RETURN_TOLERANCE_DAYS {
            warnings.push(PairDiscrepancy {
                issue: PairIssue::ReturnDateMismatch,
                severity: DiscrepancySeverity::Medium,
                days_difference: Some(days),
                details: json!({"invitation_date": expected, "ticket_date": actual}),
                message: format!(
                    "Return date: invitation expects departure on {expected}, return flight is on {actual}"
                ),
            });
        }
    }

    if let (Some(ticket_days), Some(invited_days)) = (ticket_duration, invitation_duration) {
        if (ticket_days as f64) < invited_days as f64 * 0.5 {
            discrepancies.push(PairDiscrepancy {
                issue: PairIssue::TicketTooShort,
                severity: DiscrepancySeverity::High,
                days_difference: None,
                details: json!({"invitation_duration": invited_days, "ticket_duration": ticket_days}),
                message: format!(
                    "Ticket only covers {ticket_days} days while invitation mentions {invited_days} days"
                ),
            });
        }
    }

    let penalty = SCORE_PENALTY.saturating_mul(discrepancies.len() as u32);
    InvitationTicketCheck {
        is_coherent: discrepancies.is_empty(),
        coherence_score: 100u32.saturating_sub(penalty),
        discrepancies,
        warnings,
        summary: InvitationTicketSummary {
            invitation_arrival,
            invitation_departure,
            invitation_duration,
            ticket_arrival,
            ticket_return,
            ticket_duration,
        },
    }
}

/// Compare the hotel booking with the flights: check-in near arrival and
/// nights covering the stay.
pub fn validate_hotel_vs_ticket(hotel: &HotelData, ticket: &TicketData) -> HotelTicketCheck {
    let mut discrepancies = Vec::new();
    let arrival = ticket.arrival();

    if let (Some(check_in), Some(arrival)) = (hotel.check_in, arrival) {
        let days = days_between(arrival, check_in).abs();
        if days > CHECKIN_TOLERANCE_DAYS {
            discrepancies.push(PairDiscrepancy {
                issue: PairIssue::CheckinMismatch,
                severity: DiscrepancySeverity::Medium,
                days_difference: Some(days),
                details: json!({"hotel_date": check_in, "ticket_date": arrival}),
                message: format!("Hotel check-in ({check_in}) doesn't match flight arrival ({arrival})"),
            });
        }
    }

    if let (Some(check_in), Some(check_out), Some(arrival), Some(ret)) =
        (hotel.check_in, hotel.check_out, arrival, ticket.return_date)
    {
        let nights = days_between(check_in, check_out).abs();
        let stay_days = days_between(arrival, ret).abs();
        if nights < stay_days {
            let gap = stay_days - nights;
            let coverage = (nights as f64 / stay_days as f64 * 100.0).round() as i64;
            let severity = if coverage < 50 {
                DiscrepancySeverity::High
            } else {
                DiscrepancySeverity::Medium
            };
            discrepancies.push(PairDiscrepancy {
                issue: PairIssue::AccommodationGap,
                severity,
                days_difference: Some(gap),
                details: json!({
                    "hotel_nights": nights,
                    "stay_days": stay_days,
                    "gap_days": gap,
                    "coverage_percent": coverage,
                }),
                message: format!(
                    "Accommodation: {nights} night(s) booked for {stay_days} days stay ({coverage}% covered)"
                ),
            });
        }
    }

    HotelTicketCheck {
        is_coherent: discrepancies.is_empty(),
        discrepancies,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ticket(from: NaiveDate, to: NaiveDate) -> TicketData {
        TicketData {
            departure_date: Some(from),
            return_date: Some(to),
            ..Default::default()
        }
    }

    #[test]
    fn ten_day_ticket_for_twenty_day_invitation() {
        let invitation = InvitationData {
            date_from: Some(d(2025, 6, 1)),
            duration_days: Some(20),
            ..Default::default()
        };
        let check = validate_invitation_vs_ticket(&invitation, &ticket(d(2025, 6, 1), d(2025, 6, 11)));
        assert!(!check.is_coherent);
        assert_eq!(check.discrepancies.len(), 1);
        let mismatch = &check.discrepancies[0];
        assert_eq!(mismatch.issue, PairIssue::DurationMismatch);
        assert_eq!(mismatch.severity, DiscrepancySeverity::Medium);
        assert_eq!(mismatch.days_difference, Some(10));
        assert_eq!(check.coherence_score, 70);
    }

    #[test]
    fn short_ticket_and_late_arrival() {
        let invitation = InvitationData {
            date_from: Some(d(2025, 6, 1)),
            date_to: Some(d(2025, 6, 30)),
            ..Default::default()
        };
        // invitation covers 30 days inclusive; ticket 10 days starting 9 days late
        let check = validate_invitation_vs_ticket(&invitation, &ticket(d(2025, 6, 10), d(2025, 6, 20)));
        let issues: Vec<PairIssue> = check.discrepancies.iter().map(|d| d.issue).collect();
        assert_eq!(
            issues,
            vec![PairIssue::ArrivalDateMismatch, PairIssue::DurationMismatch, PairIssue::TicketTooShort]
        );
        assert_eq!(check.discrepancies[0].severity, DiscrepancySeverity::High);
        assert_eq!(check.discrepancies[1].severity, DiscrepancySeverity::High);
        assert_eq!(check.warnings[0].issue, PairIssue::ReturnDateMismatch);
        assert_eq!(check.coherence_score, 10);
    }

    #[test]
    fn matching_invitation_is_coherent() {
        let invitation = InvitationData {
            date_from: Some(d(2025, 6, 1)),
            date_to: Some(d(2025, 6, 10)),
            ..Default::default()
        };
        let check = validate_invitation_vs_ticket(&invitation, &ticket(d(2025, 6, 1), d(2025, 6, 10)));
        assert!(check.is_coherent);
        assert_eq!(check.coherence_score, 100);
        assert_eq!(check.summary.ticket_duration, Some(9));
    }

    #[test]
    fn hotel_gap_and_checkin_offset() {
        let hotel = HotelData {
            check_in: Some(d(2025, 6, 3)),
            check_out: Some(d(2025, 6, 7)),
            ..Default::default()
        };
        let check = validate_hotel_vs_ticket(&hotel, &ticket(d(2025, 6, 1), d(2025, 6, 15)));
        assert_eq!(check.discrepancies.len(), 2);
        assert_eq!(check.discrepancies[0].issue, PairIssue::CheckinMismatch);
        let gap = &check.discrepancies[1];
        assert_eq!(gap.issue, PairIssue::AccommodationGap);
        assert_eq!(gap.severity, DiscrepancySeverity::High);
        assert_eq!(gap.details["coverage_percent"], 29);
        assert_eq!(gap.days_difference, Some(10));
    }
}

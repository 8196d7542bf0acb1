use crate::models::Dossier;
use crate::parsing::days_between;

use super::types::{StayInfo, StaySource};

/// Derive the stay window.
///
/// The invitation gives the invited period and whether the host lodges the
/// applicant. The ticket gives arrival and departure, and defines the stay
/// when both are known. The hotel only ever defines accommodation coverage.
pub fn compute_stay(dossier: &Dossier) -> StayInfo {
    let mut info = StayInfo::default();

    // Step 1: invitation
    if let Some(invitation) = &dossier.invitation {
        info.invitation_from = invitation.date_from;
        info.invitation_to = invitation.date_to;
        info.invitation_days = invitation.days().filter(|d| *d > 0);
        info.accommodation_provided = invitation.accommodation_provided;
    }

    // Step 2: ticket
    if let Some(ticket) = &dossier.ticket {
        if let Some(arrival) = ticket.arrival() {
            info.arrival_date = Some(arrival);
            info.source = StaySource::Ticket;
        }
        info.departure_date = ticket.return_date;
    }

    // Step 3: hotel
    if let Some(hotel) = &dossier.hotel {
        info.accommodation_from = hotel.check_in;
        info.accommodation_to = hotel.check_out;
        info.accommodation_nights = hotel.booked_nights().unwrap_or(0).max(0);
    }

    // Step 4: stay duration
    match (info.arrival_date, info.departure_date, info.invitation_days) {
        (Some(arrival), Some(departure), _) => {
            info.stay_days = Some(days_between(arrival, departure).abs());
        }
        (_, _, Some(days)) => {
            info.stay_days = Some(days);
            info.source = StaySource::Invitation;
        }
        _ => {}
    }

    info
}

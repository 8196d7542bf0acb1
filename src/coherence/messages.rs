/// Applicant-facing wording for coherence issues.
/// Plain, practical language: say what was seen and what to do next.
pub struct MessageTemplates;

impl MessageTemplates {
    pub fn return_flight_missing(invitation_days: Option<i64>) -> String {
        match invitation_days {
            Some(days) => format!(
                "Return flight not detected in the ticket. \
                 Your invitation covers a {days}-day stay."
            ),
            None => "Return flight not detected in the ticket.".to_string(),
        }
    }

    pub fn accommodation_missing() -> String {
        "No accommodation proof provided. \
         Please add a hotel reservation or an invitation that includes lodging."
            .to_string()
    }

    pub fn accommodation_gap(nights: i64, stay_days: i64, coverage: i64, provided: bool) -> String {
        let base = format!(
            "Accommodation: {nights} night(s) covered for a {stay_days}-day stay ({coverage}%)."
        );
        if provided {
            format!("{base} Your host provides lodging according to the invitation letter.")
        } else {
            format!("{base} {} day(s) are not covered.", stay_days - nights)
        }
    }

    pub fn arrival_after_invitation(arrival: &str, invitation_start: &str) -> String {
        format!(
            "Your flight arrives on {arrival}, but the invitation starts on {invitation_start}."
        )
    }

    pub fn departure_before_invitation_end(departure: &str, invitation_end: &str) -> String {
        format!(
            "Your return flight is on {departure}, but the invitation ends on {invitation_end}."
        )
    }

    pub fn checkin_vs_arrival(check_in: &str, arrival: &str) -> String {
        format!("Hotel check-in: {check_in}, flight arrival: {arrival}.")
    }

    pub fn location_mismatch(hotel_city: &str, arrival_city: &str) -> String {
        format!(
            "Your hotel is in {hotel_city}, but your flight arrives in {arrival_city}. \
             Make sure to plan transport between the two cities."
        )
    }

    pub fn name_mismatch(document: &str, document_name: &str, passport_name: &str) -> String {
        format!(
            "The name on your {document} ({document_name}) differs from your passport ({passport_name})."
        )
    }

    pub fn passport_expires_before_stay_end(expiry: &str) -> String {
        format!("Your passport expires on {expiry}, before your stay ends. Please renew it.")
    }

    pub fn passport_validity_short(expiry: &str, months: u32) -> String {
        format!(
            "Your passport expires on {expiry}, less than {months} months after your stay. \
             Some authorities require {months} months of remaining validity."
        )
    }

    pub fn non_jurisdiction(nationality: &str, post: &str) -> String {
        format!(
            "Your nationality ({nationality}) is not within the jurisdiction of this embassy. \
             Please apply through: {post}."
        )
    }

    pub fn long_stay(stay_days: i64, max_days: i64) -> String {
        format!(
            "Your planned stay is {stay_days} days. The e-Visa is limited to {max_days} days. \
             For a longer stay, apply for a long-stay visa at the embassy."
        )
    }

    pub fn vaccination_missing() -> String {
        "A yellow fever vaccination certificate is mandatory to enter Côte d'Ivoire. \
         Please provide your certificate."
            .to_string()
    }

    pub fn vaccination_invalid() -> String {
        "Your yellow fever vaccination certificate is not valid. A new vaccination is required."
            .to_string()
    }

    pub fn vaccination_old(date: &str, years: i32) -> String {
        format!(
            "Your vaccination is from {date} (over {years} years ago). Some authorities may \
             require a booster. Contact the embassy to confirm your certificate is accepted."
        )
    }

    pub fn urgent_travel(days: i64) -> String {
        format!(
            "Your flight is in {days} day(s). Standard processing takes 5 to 10 business days. \
             Expedited processing may be required."
        )
    }

    pub fn minor_traveling(age: i32) -> String {
        format!(
            "The applicant is {age} years old. Minors traveling alone must provide parental \
             authorization and the parents' identity documents."
        )
    }
}

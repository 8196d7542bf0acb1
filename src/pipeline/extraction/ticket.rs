use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::json;

use super::types::*;
use crate::models::{DocumentType, FieldMap, ValidationCheck};
use crate::reference::{airline_name, ci_airport_city, is_jurisdiction_airport, CI_AIRPORTS, JURISDICTION_AIRPORTS};

static RE_PASSENGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:PASSENGER\s*NAME\s*(?:/\s*NOM\s*DU\s*PASSAGER)?|NOM\s*DU\s*PASSAGER|PASSENGER|PASSAGER)\s*:?[ \t]*([A-Z][A-Z\-'/ ]+?)(?:\s+(?:MR|MRS|MS|MLLE|MME|MISS))?[ \t]*$").unwrap()
});
static RE_BARE_PASSENGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Z]{2,}/[A-Z][A-Z ]+?)(?:\s+(?:MR|MRS|MS|MLLE|MME|MISS))?[ \t]*$").unwrap()
});
static RE_FLIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2}|[A-Z]\d|\d[A-Z])\s?(\d{3,4})\b").unwrap());
static RE_PAREN_AIRPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([A-Z]{3})\)").unwrap());
static RE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Z]{3})\b").unwrap());
static RE_FROM_AIRPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:FROM|DEPARTURE|DEPART|ORIGIN)\s*:?[^\n(]*\(([A-Z]{3})\)").unwrap()
});
static RE_TO_AIRPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bTO\b|ARRIVAL|ARRIV[EÉ]E|DESTINATION)\s*:?[^\n(]*\(([A-Z]{3})\)").unwrap()
});
static RE_BOOKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BOOKING\s+(?:REF(?:ERENCE)?|NO)[:\s#]+([A-Z0-9]{5,8})\b").unwrap());
static RE_BOOKING_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bREF|REFERENCE|PNR|CONFIRMATION|DOSSIER|BOOKING)\s*[:\s#]+([A-Z0-9]{5,8})\b").unwrap()
});
static RE_TICKET_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:TICKET|BILLET|ETKT|E-TICKET)\s*(?:NUMBER|NO\.?|N°)?[:\s#]*(\d{13,14})").unwrap());
static RE_TICKET_NUMBER_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{3}[-\s]?\d{10})\b").unwrap());
static RE_FLIGHT_NUMBER_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}\d{3,4}$").unwrap());

/// Hubs that show up on connecting itineraries.
const HUB_AIRPORTS: &[&str] = &["CDG", "ORY", "LHR", "AMS", "FRA", "IST", "DXB", "DOH", "JFK", "CAI", "LOS", "ACC", "KGL"];

const SEGMENT_CONFIDENCE: f32 = 0.85;
const LABEL_CONFIDENCE: f32 = 0.8;
const FALLBACK_CONFIDENCE: f32 = 0.6;

/// One flight leg read from a single itinerary line.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSegment {
    pub airline_code: String,
    pub flight_number: String,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub date: Option<NaiveDate>,
}

fn is_known_airport(code: &str) -> bool {
    CI_AIRPORTS.iter().any(|(c, _)| *c == code)
        || JURISDICTION_AIRPORTS.iter().any(|(c, _)| *c == code)
        || HUB_AIRPORTS.contains(&code)
}

/// Airports on a line: parenthesized codes first, then known bare codes.
fn airports_in(line: &str) -> Vec<String> {
    let parenthesized: Vec<String> = RE_PAREN_AIRPORT
        .captures_iter(line)
        .map(|c| c[1].to_string())
        .collect();
    if parenthesized.len() >= 2 {
        return parenthesized;
    }
    RE_CODE
        .captures_iter(line)
        .map(|c| c[1].to_string())
        .filter(|c| is_known_airport(c))
        .collect()
}

/// Flight legs in itinerary order. Issue-date lines are skipped so their
/// dates are not mistaken for travel dates.
pub fn parse_segments(text: &str) -> Vec<FlightSegment> {
    text.lines()
        .filter(|line| !line.contains("ISSUE") && !line.contains("EMIS"))
        .filter_map(|line| {
            let flight = RE_FLIGHT
                .captures_iter(line)
                .find(|c| airline_name(&c[1]).is_some() || RE_FLIGHT_NUMBER_FORMAT.is_match(&format!("{}{}", &c[1], &c[2])))?;
            let airports = airports_in(line);
            if airports.is_empty() {
                return None;
            }
            Some(FlightSegment {
                airline_code: flight[1].to_string(),
                flight_number: format!("{}{}", &flight[1], &flight[2]),
                departure_airport: airports.first().cloned(),
                arrival_airport: airports.get(1).cloned(),
                date: find_dates(line).into_iter().next(),
            })
        })
        .collect()
}

/// "SURNAME/GIVEN NAMES" airline notation to "GIVEN NAMES SURNAME".
fn passenger_display_name(raw: &str) -> String {
    match raw.split_once('/') {
        Some((surname, given)) if !given.trim().is_empty() => {
            clean_name(&format!("{} {}", given, surname))
        }
        _ => clean_name(&raw.replace('/', " ")),
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Flight ticket extractor.
///
/// The outbound leg is the first segment landing in the host country; the
/// return leg is the first later segment leaving it.
pub struct TicketExtractor;

impl TicketExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TicketExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TicketExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Ticket
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = raw_text.to_uppercase();
        let mut b = FieldBuilder::new();

        let passenger = capture_first(&[&RE_PASSENGER, &RE_BARE_PASSENGER], &text)
            .map(|n| passenger_display_name(&n))
            .filter(|n| n.len() > 3);
        b.set_opt("passenger_name", passenger, LABEL_CONFIDENCE);

        let segments = parse_segments(&text);
        let lands_in_ci = |s: &FlightSegment| s.arrival_airport.as_deref().and_then(ci_airport_city).is_some();
        let outbound_index = segments
            .iter()
            .position(|s| lands_in_ci(s))
            .or_else(|| (!segments.is_empty()).then_some(0));

        if let Some(i) = outbound_index {
            let outbound = &segments[i];
            b.set("flight_number", outbound.flight_number.clone(), SEGMENT_CONFIDENCE);
            b.set("airline_code", outbound.airline_code.clone(), SEGMENT_CONFIDENCE);
            b.set_opt("airline", airline_name(&outbound.airline_code), SEGMENT_CONFIDENCE);
            // A connecting itinerary departs from the first leg's origin.
            let origin = segments.first().and_then(|s| s.departure_airport.clone());
            b.set_opt("departure_airport", origin, SEGMENT_CONFIDENCE);
            b.set_opt("arrival_airport", outbound.arrival_airport.clone(), SEGMENT_CONFIDENCE);
            let departure = segments.first().and_then(|s| s.date).or(outbound.date);
            b.set_opt("departure_date", departure.map(iso), SEGMENT_CONFIDENCE);
            b.set_opt("arrival_date", outbound.date.map(iso), SEGMENT_CONFIDENCE);

            let return_leg = segments[i + 1..].iter().find(|s| {
                s.departure_airport.as_deref().and_then(ci_airport_city).is_some()
            });
            if let Some(ret) = return_leg {
                b.set("return_flight_number", ret.flight_number.clone(), SEGMENT_CONFIDENCE);
                b.set_opt("return_date", ret.date.map(iso), SEGMENT_CONFIDENCE);
            }
        }

        // Labeled FROM/TO layouts without one-line segments.
        b.set_opt("departure_airport", capture_first(&[&RE_FROM_AIRPORT], &text), LABEL_CONFIDENCE);
        b.set_opt("arrival_airport", capture_first(&[&RE_TO_AIRPORT], &text), LABEL_CONFIDENCE);
        if !b.has("flight_number") {
            if let Some(c) = RE_FLIGHT.captures_iter(&text).find(|c| airline_name(&c[1]).is_some()) {
                b.set("flight_number", format!("{}{}", &c[1], &c[2]), FALLBACK_CONFIDENCE);
                b.set("airline_code", c[1].to_string(), FALLBACK_CONFIDENCE);
                b.set_opt("airline", airline_name(&c[1]), FALLBACK_CONFIDENCE);
            }
        }
        if !b.has("departure_date") {
            let travel_lines: String = text
                .lines()
                .filter(|l| !l.contains("ISSUE") && !l.contains("EMIS"))
                .collect::<Vec<_>>()
                .join("\n");
            let dates = find_dates(&travel_lines);
            b.set_opt("departure_date", dates.first().copied().map(iso), FALLBACK_CONFIDENCE);
            if dates.len() > 1 && !b.has("return_date") {
                b.set_opt("return_date", dates.last().copied().map(iso), FALLBACK_CONFIDENCE);
            }
        }

        let arrival_city = field_text_in(&b, "arrival_airport").and_then(|c| ci_airport_city(&c));
        b.set_opt("arrival_city", arrival_city, SEGMENT_CONFIDENCE);

        let booking = [&*RE_BOOKING, &*RE_BOOKING_LABELED].iter().find_map(|re| {
            re.captures_iter(&text)
                .map(|c| c[1].to_string())
                .find(|r| !RE_FLIGHT_NUMBER_FORMAT.is_match(r) && r.chars().any(|c| c.is_ascii_alphabetic()))
        });
        b.set_opt("booking_reference", booking, LABEL_CONFIDENCE);

        let ticket_number = capture_first(&[&RE_TICKET_NUMBER, &RE_TICKET_NUMBER_BARE], &text)
            .map(|n| n.replace([' ', '-'], ""));
        b.set_opt("ticket_number", ticket_number, LABEL_CONFIDENCE);

        let round_trip = segments.len() >= 2
            && segments.first().and_then(|s| s.departure_airport.as_ref())
                == segments.last().and_then(|s| s.arrival_airport.as_ref());
        if !segments.is_empty() {
            b.set("is_round_trip", round_trip || b.has("return_flight_number"), SEGMENT_CONFIDENCE);
            let legs: Vec<_> = segments
                .iter()
                .map(|s| {
                    json!({
                        "flight_number": s.flight_number,
                        "departure_airport": s.departure_airport,
                        "arrival_airport": s.arrival_airport,
                        "date": s.date.map(iso),
                    })
                })
                .collect();
            b.set("segments", legs, SEGMENT_CONFIDENCE);
        }

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        if let Some(arrival) = field_text(fields, "arrival_airport") {
            checks.push(check("destination_is_abidjan", ci_airport_city(&arrival).is_some()));
        }
        if let Some(departure) = field_date(fields, "departure_date") {
            checks.push(check("date_is_future", departure > today));
        }
        if let Some(origin) = field_text(fields, "departure_airport") {
            checks.push(check("departure_in_jurisdiction", is_jurisdiction_airport(&origin)));
        }
        if let Some(name) = field_text(fields, "passenger_name") {
            checks.push(check("passenger_name_format_valid", name.chars().count() >= 3));
        }
        if let Some(flight) = field_text(fields, "flight_number") {
            checks.push(check("flight_number_valid", RE_FLIGHT_NUMBER_FORMAT.is_match(&flight)));
        }

        checks
    }
}

/// Text view of a field already recorded in a builder.
fn field_text_in(b: &FieldBuilder, name: &str) -> Option<String> {
    b.get(name).and_then(|f| f.value.as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHIOPIAN: &str = "\
ETHIOPIAN AIRLINES E-TICKET RECEIPT
PASSENGER NAME: TESFAYE/ABEBE KEBEDE MR
ISSUE DATE: 10 MAY 2025
BOOKING REFERENCE: XK7Q2M
TICKET NUMBER: 0712345678901
ET 935 ADDIS ABABA (ADD) - ABIDJAN (ABJ) 01JUN25 OK
ET 934 ABIDJAN (ABJ) - ADDIS ABABA (ADD) 15JUN25 OK
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    #[test]
    fn extracts_round_trip_itinerary() {
        let fields = TicketExtractor::new().extract(ETHIOPIAN);
        assert_eq!(field_text(&fields, "passenger_name").as_deref(), Some("ABEBE KEBEDE TESFAYE"));
        assert_eq!(field_text(&fields, "flight_number").as_deref(), Some("ET935"));
        assert_eq!(field_text(&fields, "airline").as_deref(), Some("Ethiopian Airlines"));
        assert_eq!(field_text(&fields, "departure_airport").as_deref(), Some("ADD"));
        assert_eq!(field_text(&fields, "arrival_airport").as_deref(), Some("ABJ"));
        assert_eq!(field_text(&fields, "arrival_city").as_deref(), Some("Abidjan"));
        assert_eq!(field_text(&fields, "departure_date").as_deref(), Some("2025-06-01"));
        assert_eq!(field_text(&fields, "return_flight_number").as_deref(), Some("ET934"));
        assert_eq!(field_text(&fields, "return_date").as_deref(), Some("2025-06-15"));
        assert_eq!(field_text(&fields, "booking_reference").as_deref(), Some("XK7Q2M"));
        assert_eq!(field_text(&fields, "ticket_number").as_deref(), Some("0712345678901"));
        assert_eq!(field_bool(&fields, "is_round_trip"), Some(true));
    }

    #[test]
    fn connecting_itinerary_keeps_origin() {
        let text = "PASSENGER: OMONDI/GRACE MS\n\
                    KQ 510 NBO ACC 02/07/2025\n\
                    HF 301 ACC ABJ 02/07/2025\n";
        let fields = TicketExtractor::new().extract(text);
        assert_eq!(field_text(&fields, "flight_number").as_deref(), Some("HF301"));
        assert_eq!(field_text(&fields, "departure_airport").as_deref(), Some("NBO"));
        assert_eq!(field_text(&fields, "arrival_airport").as_deref(), Some("ABJ"));
        assert_eq!(field_bool(&fields, "is_round_trip"), Some(false));
        assert!(!fields.contains_key("return_flight_number"));
    }

    #[test]
    fn validations_cover_destination_and_origin() {
        let out = TicketExtractor::new().run(ETHIOPIAN, today());
        let get = |name: &str| out.validations.iter().find(|c| c.name == name).map(|c| c.passed);
        assert_eq!(get("destination_is_abidjan"), Some(true));
        assert_eq!(get("date_is_future"), Some(true));
        assert_eq!(get("departure_in_jurisdiction"), Some(true));
        assert_eq!(get("passenger_name_format_valid"), Some(true));
        assert_eq!(get("flight_number_valid"), Some(true));
    }

    #[test]
    fn wrong_destination_fails_check() {
        let text = "PASSENGER: DOE/JOHN MR\nAF 123 (ADD) TO (CDG) 01/06/2025";
        let out = TicketExtractor::new().run(text, today());
        let dest = out.validations.iter().find(|c| c.name == "destination_is_abidjan").unwrap();
        assert!(!dest.passed);
    }

    #[test]
    fn issue_date_is_not_a_travel_date() {
        let fields = TicketExtractor::new().extract(ETHIOPIAN);
        assert_ne!(field_text(&fields, "departure_date").as_deref(), Some("2025-05-10"));
    }
}

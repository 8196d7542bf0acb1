use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::types::*;
use crate::config::{thresholds, DESTINATION_COUNTRY};
use crate::models::{DocumentType, FieldMap, ValidationCheck};
use crate::parsing::{days_between, parse_amount, parse_date};
use crate::reference::find_ci_city;

static RE_GUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:GUEST\s*NAME|GUEST|CLIENT|CUSTOMER|RESERVATION\s*FOR|BOOKING\s*FOR|BOOKED\s*BY|NOM\s*DU\s*CLIENT)\s*:?[ \t]*(?:(?:MR|MRS|MS|MLLE|MME)[./ ]+)?([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_HOTEL_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:HOTEL\s*NAME|PROPERTY|ACCOMMODATION|LODGING|ETABLISSEMENT)\s*:[ \t]*([A-Z][A-Z0-9 \-'.&]+?)[ \t]*$").unwrap()
});
static RE_HOTEL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Z][A-Z \-'&]*\b(?:HOTEL|RESORT|PALACE|INN|SUITES|LODGE|RESIDENCE))\b").unwrap()
});
static RE_HOTEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*((?:HOTEL|RESORT|APARTHOTEL|MOTEL)\s+[A-Z][A-Z \-'&]+?)[ \t]*$").unwrap()
});
static RE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:ADDRESS|ADRESSE|LOCATION|LOCALISATION)\s*:?[ \t]*([^\n]+)$").unwrap()
});
static RE_CITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\b(?:CITY|VILLE)\s*:?[ \t]*([A-Z][A-Z\- ]+?)[ \t]*$").unwrap());
static RE_COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"IVORY\s*COAST|C[OÔ]TE\s*D['’`]?\s*IVOIRE|\bCIV\b").unwrap()
});
static RE_CHECK_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:CHECK[\-\s]?IN|ARRIVAL|ARRIV[EÉ]E|\bFROM)(?:\s*DATE)?[:\s]*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}\s+[A-ZÉÛ]+\s+\d{4})").unwrap()
});
static RE_CHECK_OUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:CHECK[\-\s]?OUT|DEPARTURE|D[EÉ]PART|\bTO|UNTIL)(?:\s*DATE)?[:\s]*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}\s+[A-ZÉÛ]+\s+\d{4})").unwrap()
});
static RE_NIGHTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*(?:NIGHTS?|NUITS?)\b").unwrap());
static RE_CONFIRMATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:CONFIRMATION|BOOKING|RESERVATION)\s*(?:NO\.?|NUMBER|N°|#)?[:\s]*([A-Z0-9][A-Z0-9\-]{5,19})\b").unwrap()
});
static RE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\bREF|REFERENCE)\.?[:\s]*([A-Z0-9][A-Z0-9\-]{5,19})\b").unwrap());
static RE_ROOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:ROOM|CHAMBRE)\s*(?:TYPE)?\s*:[ \t]*([A-Z][A-Z ]+?)[ \t]*$").unwrap()
});
static RE_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:TOTAL|AMOUNT|MONTANT|PRICE|PRIX)[:\s]*([0-9][0-9,.\s]*\s*(?:XOF|FCFA|CFA|EUR|USD)?)").unwrap()
});

/// Booking platforms recognized by name: (needle, display name).
const PLATFORMS: &[(&str, &str)] = &[
    ("BOOKING.COM", "Booking.com"),
    ("EXPEDIA", "Expedia"),
    ("AIRBNB", "Airbnb"),
    ("HOTELS.COM", "Hotels.com"),
    ("AGODA", "Agoda"),
    ("TRIVAGO", "Trivago"),
    ("JUMIA TRAVEL", "Jumia Travel"),
];

const LABEL_CONFIDENCE: f32 = 0.8;
const DERIVED_CONFIDENCE: f32 = 0.7;

/// Hotel reservation extractor.
pub struct HotelExtractor;

impl HotelExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HotelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for HotelExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Hotel
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = raw_text.to_uppercase();
        let mut b = FieldBuilder::new();

        b.set_opt("guest_name", capture_first(&[&RE_GUEST], &text).map(|n| clean_name(&n)), LABEL_CONFIDENCE);
        b.set_opt(
            "hotel_name",
            capture_first(&[&RE_HOTEL_LABELED, &RE_HOTEL_SUFFIX, &RE_HOTEL_PREFIX], &text).map(|n| clean_name(&n)),
            LABEL_CONFIDENCE,
        );

        let address = capture_first(&[&RE_ADDRESS], &text).map(|a| a.trim().to_string());
        let city = capture_first(&[&RE_CITY], &text)
            .and_then(|c| find_ci_city(&c).map(str::to_string).or(Some(clean_name(&c))))
            .or_else(|| address.as_deref().and_then(find_ci_city).map(str::to_string))
            .or_else(|| find_ci_city(&text).map(str::to_string));
        b.set_opt("hotel_address", address, LABEL_CONFIDENCE);
        b.set_opt("hotel_city", city.clone(), DERIVED_CONFIDENCE);
        let in_country = RE_COUNTRY.is_match(&text) || city.as_deref().and_then(find_ci_city).is_some();
        if in_country {
            b.set("hotel_country", DESTINATION_COUNTRY, DERIVED_CONFIDENCE);
        }

        let mut check_in = capture_first(&[&RE_CHECK_IN], &text).map(|d| iso_or_raw(&d));
        let mut check_out = capture_first(&[&RE_CHECK_OUT], &text).map(|d| iso_or_raw(&d));
        if check_in.is_none() || check_out.is_none() {
            // Unlabeled layouts: first two dates are the stay.
            let dates = find_dates(&text);
            if dates.len() >= 2 {
                check_in = check_in.or_else(|| Some(dates[0].format("%Y-%m-%d").to_string()));
                check_out = check_out.or_else(|| Some(dates[1].format("%Y-%m-%d").to_string()));
            }
        }
        b.set_opt("check_in_date", check_in.clone(), LABEL_CONFIDENCE);
        b.set_opt("check_out_date", check_out.clone(), LABEL_CONFIDENCE);

        let from_dates = match (
            check_in.as_deref().and_then(parse_date),
            check_out.as_deref().and_then(parse_date),
        ) {
            (Some(a), Some(b)) => Some(days_between(a, b)),
            _ => None,
        };
        let stated = capture_first(&[&RE_NIGHTS], &text).and_then(|n| n.parse::<i64>().ok());
        b.set_opt("nights", from_dates.or(stated), DERIVED_CONFIDENCE);

        let confirmation = capture_first(&[&RE_CONFIRMATION, &RE_REFERENCE], &text)
            .filter(|c| c.chars().any(|ch| ch.is_ascii_digit()));
        b.set_opt("confirmation_number", confirmation, LABEL_CONFIDENCE);
        b.set_opt("room_type", capture_first(&[&RE_ROOM], &text).map(|r| clean_name(&r)), DERIVED_CONFIDENCE);

        let platform = PLATFORMS.iter().find(|(needle, _)| text.contains(needle)).map(|(_, name)| *name);
        b.set_opt("booking_platform", platform, DERIVED_CONFIDENCE);

        if let Some(amount) = capture_first(&[&RE_TOTAL], &text).and_then(|t| parse_amount(&t)) {
            b.set("total_amount", amount.value, DERIVED_CONFIDENCE);
            b.set_opt("currency", amount.currency, DERIVED_CONFIDENCE);
        }

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        let city_in_country = field_text(fields, "hotel_city")
            .as_deref()
            .and_then(find_ci_city)
            .is_some();
        checks.push(check(
            "location_is_cote_divoire",
            city_in_country || fields.contains_key("hotel_country"),
        ));

        let check_in = field_date(fields, "check_in_date");
        let check_out = field_date(fields, "check_out_date");
        if let Some(start) = check_in {
            checks.push(check("dates_are_future", start >= today));
        }
        if let (Some(start), Some(end)) = (check_in, check_out) {
            checks.push(check("dates_coherent", end > start));
        }
        checks.push(check("confirmation_number_present", fields.contains_key("confirmation_number")));
        if let Some(nights) = field_number(fields, "nights") {
            checks.push(check(
                "stay_duration_valid",
                nights > 0.0 && nights <= thresholds::MAX_STAY_DAYS as f64,
            ));
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKING: &str = "\
Sofitel Abidjan Hotel Ivoire
Guest name: Abebe Kebede Tesfaye
Address: Boulevard Hassan II, Cocody, Abidjan, Côte d'Ivoire
Check-in: 01/06/2025
Check-out: 15/06/2025
Confirmation number: 4827-1193
Room type: Deluxe King
Total: 1 250 000 FCFA
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    #[test]
    fn extracts_booking_confirmation() {
        let fields = HotelExtractor::new().extract(BOOKING);
        assert_eq!(field_text(&fields, "guest_name").as_deref(), Some("ABEBE KEBEDE TESFAYE"));
        assert_eq!(field_text(&fields, "hotel_name").as_deref(), Some("SOFITEL ABIDJAN HOTEL"));
        assert_eq!(field_text(&fields, "hotel_city").as_deref(), Some("ABIDJAN"));
        assert_eq!(field_text(&fields, "check_in_date").as_deref(), Some("2025-06-01"));
        assert_eq!(field_text(&fields, "check_out_date").as_deref(), Some("2025-06-15"));
        assert_eq!(field_number(&fields, "nights"), Some(14.0));
        assert_eq!(field_text(&fields, "confirmation_number").as_deref(), Some("4827-1193"));
        assert_eq!(field_text(&fields, "currency").as_deref(), Some("XOF"));
        assert_eq!(field_number(&fields, "total_amount"), Some(1_250_000.0));
    }

    #[test]
    fn validations_pass_for_future_stay() {
        let out = HotelExtractor::new().run(BOOKING, today());
        assert!(out.validations.iter().all(|c| c.passed), "{:?}", out.validations);
        assert!(out.validations.iter().any(|c| c.name == "stay_duration_valid"));
    }

    #[test]
    fn foreign_hotel_and_reversed_dates_fail() {
        let text = "Hilton Nairobi\nGuest: John Doe\nCity: Nairobi\nCheck-in: 10/06/2025\nCheck-out: 05/06/2025";
        let out = HotelExtractor::new().run(text, today());
        let get = |name: &str| out.validations.iter().find(|c| c.name == name).map(|c| c.passed);
        assert_eq!(get("location_is_cote_divoire"), Some(false));
        assert_eq!(get("dates_coherent"), Some(false));
        assert_eq!(get("confirmation_number_present"), Some(false));
    }

    #[test]
    fn detects_booking_platform() {
        let fields = HotelExtractor::new().extract("Your Booking.com confirmation\nGuest: Jane Doe");
        assert_eq!(field_text(&fields, "booking_platform").as_deref(), Some("Booking.com"));
    }

    #[test]
    fn stated_nights_used_without_dates() {
        let fields = HotelExtractor::new().extract("Residence Les Palmiers, Grand-Bassam\n120 nights");
        assert_eq!(field_number(&fields, "nights"), Some(120.0));
        let checks = HotelExtractor::new().validate(&fields, today());
        let stay = checks.iter().find(|c| c.name == "stay_duration_valid").unwrap();
        assert!(!stay.passed);
    }
}

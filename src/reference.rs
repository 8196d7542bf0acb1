//! Static reference tables: the consular jurisdiction, alternate posts,
//! airports, airlines and host-country cities.

use crate::parsing::fold_diacritics;

/// Nationalities the consular post is authorized to serve (ISO alpha-3).
pub const JURISDICTION_COUNTRIES: [&str; 7] = ["ETH", "DJI", "ERI", "KEN", "SSD", "SOM", "UGA"];

/// Main arrival city in the host country.
pub const HOST_CITY: &str = "Abidjan";

/// Alternate posts for common out-of-jurisdiction nationalities.
const ALTERNATE_POSTS: &[(&str, &str)] = &[
    ("COD", "Embassy of Côte d'Ivoire in Kinshasa (DRC)"),
    ("COG", "Embassy of Côte d'Ivoire in Brazzaville"),
    ("NGA", "Embassy of Côte d'Ivoire in Abuja"),
    ("GHA", "Embassy of Côte d'Ivoire in Accra"),
    ("SEN", "Embassy of Côte d'Ivoire in Dakar"),
    ("CMR", "Embassy of Côte d'Ivoire in Yaoundé"),
    ("ZAF", "Embassy of Côte d'Ivoire in Pretoria"),
    ("EGY", "Embassy of Côte d'Ivoire in Cairo"),
    ("MAR", "Embassy of Côte d'Ivoire in Rabat"),
];

/// Fallback post when no dedicated alternate is known.
pub const DEFAULT_ALTERNATE_POST: &str = "the embassy of Côte d'Ivoire in your country of residence";

/// Airports in Côte d'Ivoire: (IATA code, city).
pub const CI_AIRPORTS: &[(&str, &str)] = &[
    ("ABJ", "Abidjan"),
    ("BYK", "Bouaké"),
    ("MJC", "Man"),
    ("SPY", "San Pedro"),
    ("OGO", "Odienné"),
    ("HGO", "Korhogo"),
];

/// Airports inside the consular jurisdiction: (IATA code, city).
pub const JURISDICTION_AIRPORTS: &[(&str, &str)] = &[
    ("ADD", "Addis Ababa"),
    ("JIB", "Djibouti"),
    ("ASM", "Asmara"),
    ("NBO", "Nairobi"),
    ("MBA", "Mombasa"),
    ("EBB", "Entebbe"),
    ("MGQ", "Mogadishu"),
    ("JUB", "Juba"),
];

/// Airline IATA designators seen on tickets to the host country.
pub const AIRLINES: &[(&str, &str)] = &[
    ("ET", "Ethiopian Airlines"),
    ("KQ", "Kenya Airways"),
    ("AF", "Air France"),
    ("TK", "Turkish Airlines"),
    ("EK", "Emirates"),
    ("QR", "Qatar Airways"),
    ("LH", "Lufthansa"),
    ("BA", "British Airways"),
    ("KL", "KLM"),
    ("MS", "EgyptAir"),
    ("WB", "RwandAir"),
    ("HF", "Air Côte d'Ivoire"),
    ("W3", "ASKY Airlines"),
];

/// Cities of the host country recognized in addresses.
pub const CI_CITIES: &[&str] = &[
    "ABIDJAN",
    "YAMOUSSOUKRO",
    "BOUAKE",
    "DALOA",
    "SAN PEDRO",
    "KORHOGO",
    "MAN",
    "DIVO",
    "GAGNOA",
    "ABENGOUROU",
    "GRAND BASSAM",
    "ASSINIE",
    "SASSANDRA",
    "ODIENNE",
];

/// Country names and alpha-2 codes mapped to alpha-3.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("ETHIOPIA", "ETH"),
    ("ETHIOPIE", "ETH"),
    ("ET", "ETH"),
    ("DJIBOUTI", "DJI"),
    ("DJ", "DJI"),
    ("ERITREA", "ERI"),
    ("ERYTHREE", "ERI"),
    ("ER", "ERI"),
    ("KENYA", "KEN"),
    ("KE", "KEN"),
    ("SOUTH SUDAN", "SSD"),
    ("SOUDAN DU SUD", "SSD"),
    ("SS", "SSD"),
    ("SOMALIA", "SOM"),
    ("SOMALIE", "SOM"),
    ("SO", "SOM"),
    ("UGANDA", "UGA"),
    ("OUGANDA", "UGA"),
    ("UG", "UGA"),
    ("ETHIOPIAN", "ETH"),
    ("ETHIOPIEN", "ETH"),
    ("ETHIOPIENNE", "ETH"),
    ("DJIBOUTIAN", "DJI"),
    ("ERITREAN", "ERI"),
    ("KENYAN", "KEN"),
    ("KENYANE", "KEN"),
    ("SOUTH SUDANESE", "SSD"),
    ("SOMALI", "SOM"),
    ("UGANDAN", "UGA"),
    ("OUGANDAIS", "UGA"),
    ("AMERICAN", "USA"),
    ("UNITED STATES", "USA"),
    ("UNITED STATES OF AMERICA", "USA"),
    ("ETATS UNIS", "USA"),
    ("US", "USA"),
    ("FRANCE", "FRA"),
    ("FR", "FRA"),
    ("NIGERIA", "NGA"),
    ("NG", "NGA"),
    ("GHANA", "GHA"),
    ("GH", "GHA"),
    ("SENEGAL", "SEN"),
    ("SN", "SEN"),
    ("CAMEROON", "CMR"),
    ("CAMEROUN", "CMR"),
    ("CM", "CMR"),
    ("SOUTH AFRICA", "ZAF"),
    ("AFRIQUE DU SUD", "ZAF"),
    ("ZA", "ZAF"),
    ("EGYPT", "EGY"),
    ("EGYPTE", "EGY"),
    ("EG", "EGY"),
    ("MOROCCO", "MAR"),
    ("MAROC", "MAR"),
    ("MA", "MAR"),
    ("DEMOCRATIC REPUBLIC OF THE CONGO", "COD"),
    ("RDC", "COD"),
    ("CD", "COD"),
    ("CONGO", "COG"),
    ("CG", "COG"),
    ("COTE D IVOIRE", "CIV"),
    ("IVORY COAST", "CIV"),
    ("CI", "CIV"),
];

/// Normalize a nationality (alpha-3, alpha-2 or country name) to alpha-3.
/// Unknown three-letter codes pass through uppercased.
pub fn country_code(nationality: &str) -> Option<String> {
    let folded = fold_diacritics(nationality.trim()).to_uppercase();
    let key: String = folded
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if key.is_empty() {
        return None;
    }
    if let Some((_, code)) = COUNTRY_ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some((*code).to_string());
    }
    if key.len() == 3 {
        return Some(key);
    }
    None
}

pub fn is_in_jurisdiction(alpha3: &str) -> bool {
    JURISDICTION_COUNTRIES.contains(&alpha3)
}

/// Post a non-jurisdiction applicant should be redirected to.
pub fn alternate_post(alpha3: &str) -> &'static str {
    ALTERNATE_POSTS
        .iter()
        .find(|(code, _)| *code == alpha3)
        .map(|(_, post)| *post)
        .unwrap_or(DEFAULT_ALTERNATE_POST)
}

pub fn ci_airport_city(code: &str) -> Option<&'static str> {
    let code = code.trim().to_uppercase();
    CI_AIRPORTS.iter().find(|(c, _)| *c == code).map(|(_, city)| *city)
}

pub fn is_jurisdiction_airport(code: &str) -> bool {
    let code = code.trim().to_uppercase();
    JURISDICTION_AIRPORTS.iter().any(|(c, _)| *c == code)
}

pub fn airline_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_uppercase();
    AIRLINES.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// First host-country city mentioned in `text`, if any.
pub fn find_ci_city(text: &str) -> Option<&'static str> {
    let folded = fold_diacritics(text).to_uppercase().replace('-', " ");
    CI_CITIES.iter().copied().find(|city| {
        folded
            .match_indices(city)
            .any(|(i, _)| is_word_boundary(&folded, i, city.len()))
    })
}

fn is_word_boundary(haystack: &str, start: usize, len: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[start + len..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_code_accepts_names_and_alpha2() {
        assert_eq!(country_code("Kenya").as_deref(), Some("KEN"));
        assert_eq!(country_code("ke").as_deref(), Some("KEN"));
        assert_eq!(country_code("USA").as_deref(), Some("USA"));
        assert_eq!(country_code("Éthiopie").as_deref(), Some("ETH"));
        assert_eq!(country_code("ETHIOPIAN").as_deref(), Some("ETH"));
        assert_eq!(country_code("Kenyan").as_deref(), Some("KEN"));
        assert_eq!(country_code(""), None);
    }

    #[test]
    fn jurisdiction_has_seven_countries() {
        assert_eq!(JURISDICTION_COUNTRIES.len(), 7);
        assert!(is_in_jurisdiction("ETH"));
        assert!(!is_in_jurisdiction("USA"));
    }

    #[test]
    fn alternate_post_falls_back_to_residence() {
        assert!(alternate_post("NGA").contains("Abuja"));
        assert_eq!(alternate_post("USA"), DEFAULT_ALTERNATE_POST);
    }

    #[test]
    fn finds_city_on_word_boundary() {
        assert_eq!(find_ci_city("Hotel Ivoire, Cocody, Abidjan"), Some("ABIDJAN"));
        assert_eq!(find_ci_city("Rue de Grand-Bassam"), Some("GRAND BASSAM"));
        assert_eq!(find_ci_city("Germany"), None);
    }

    #[test]
    fn airport_lookups() {
        assert_eq!(ci_airport_city("abj"), Some("Abidjan"));
        assert!(is_jurisdiction_airport("ADD"));
        assert_eq!(airline_name("ET"), Some("Ethiopian Airlines"));
    }
}

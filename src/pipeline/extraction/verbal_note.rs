use std::sync::LazyLock;

use chrono::{Months, NaiveDate};
use regex::Regex;

use super::types::*;
use crate::models::{DocumentType, FieldMap, ValidationCheck};
use crate::parsing::fold_diacritics;

const DATE: &str = r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}\s+[A-Z]+\s+\d{4}";

static RE_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)((?:\bPERMANENT\s+MISSION|\bEMBASSY|\bAMBASSADE|\bMINISTRY|\bMINISTERE|\bMISSION|\bCONSULATE|\bCONSULAT)\s+(?:OF|DE|DU|DES)\s+(?:THE\s+|LA\s+|L')?[A-Z][A-Z \-']{2,80}?)(?:\s+(?:PRESENTS|PRESENTE|IN|AT|TO|AND|ET|HAS|AUPRES|A)\b|[,.]|$)").unwrap()
});
static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:NOTE\s*(?:VERBALE\s*)?|VERBAL\s*NOTE\s*|\bREF(?:ERENCE)?\.?\s*)(?:NO\.?|N°)?[.:\s]*([A-Z0-9]+(?:[/\-][A-Z0-9]+)+|\d{2,})").unwrap()
});
static RE_DATE_LABELED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?:\bDATED?|\bDATE\s*:)[:\s]*({DATE})")).unwrap());
static RE_PLACE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?m)^[ \t]*[A-Z][A-Z \-']+,\s*(?:LE\s+|THE\s+)?({DATE})")).unwrap());
static RE_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:OBJET|SUBJECT|CONCERNING)\s*:[ \t]*([^\n]+)$").unwrap());
static RE_DIPLOMAT_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:DIPLOMAT|OFFICIAL|NAME|NOM)\s*:[ \t]*([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_DIPLOMAT_PROSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:MR|MRS|MS|MME|MONSIEUR|MADAME)\.?\s+([A-Z][A-Z\-']+(?:\s+[A-Z][A-Z\-']+){0,3})").unwrap()
});
static RE_TITLE_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:TITLE|TITRE|FUNCTION|FONCTION)\s*:[ \t]*([A-Z][A-Z \-']+?)[ \t]*$").unwrap()
});
static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(AMBASSADOR|AMBASSADEUR|MINISTER\s+COUNSELLOR|COUNSELLOR|CONSEILLER|(?:FIRST|SECOND|THIRD)\s+SECRETARY|(?:PREMIER|DEUXIEME|TROISIEME)\s+SECRETAIRE|ATTACHE|CONSUL\s+GENERAL|CONSUL)\b").unwrap()
});
static RE_PASSPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:PASSPORT|PASSEPORT)\s*(?:NO\.?|N°|NUMBER)?[.:\s]*([A-Z]{1,2}\d{6,9})\b").unwrap()
});
static RE_MISSION_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:\bFROM|\bDU)\s*({DATE})\s*(?:\bTO|\bAU|UNTIL)\s*({DATE})")).unwrap()
});
static RE_PURPOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:PURPOSE|OBJET\s*DE\s*LA\s*MISSION|IN\s+ORDER\s+TO|AFIN\s+DE)[:\s]*([^\n.]+)").unwrap()
});
static RE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:STAMP|CACHET|SEAL|SCEAU)\b").unwrap());

/// Note kinds and their headings.
const NOTE_TYPES: &[(&str, &[&str])] = &[
    ("VERBAL_NOTE", &["NOTE VERBALE", "VERBAL NOTE"]),
    ("DIPLOMATIC_NOTE", &["NOTE DIPLOMATIQUE", "DIPLOMATIC NOTE"]),
    ("THIRD_PERSON_NOTE", &["NOTE EN TROISIEME PERSONNE", "THIRD PERSON NOTE"]),
];

static RE_VISA_CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bVISA\s+(?:DE\s+)?(DIPLOMATIQUE|SERVICE|COURTOISIE|TRANSIT)\b|\b(DIPLOMATIC|SERVICE|OFFICIAL|COURTESY|TRANSIT)\s+(?:ENTRY\s+)?VISA\b").unwrap()
});

/// Notes older than this are stale.
const RECENT_NOTE_MONTHS: u32 = 6;

const LABEL_CONFIDENCE: f32 = 0.8;
const PROSE_CONFIDENCE: f32 = 0.65;

fn mentions_host_country(s: &str) -> bool {
    s.contains("IVOIRE") || s.contains("IVORY")
}

fn visa_category(text: &str) -> Option<&'static str> {
    let c = RE_VISA_CATEGORY.captures(text)?;
    let keyword = c.get(1).or_else(|| c.get(2))?.as_str();
    Some(match keyword {
        "DIPLOMATIQUE" | "DIPLOMATIC" => "DIPLOMATIC",
        "SERVICE" | "OFFICIAL" => "SERVICE",
        "COURTOISIE" | "COURTESY" => "COURTESY",
        _ => "TRANSIT",
    })
}

/// Diplomatic verbal note extractor.
pub struct VerbalNoteExtractor;

impl VerbalNoteExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VerbalNoteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VerbalNoteExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::VerbalNote
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = fold_diacritics(&raw_text.to_uppercase());
        let mut b = FieldBuilder::new();

        let note_type = NOTE_TYPES
            .iter()
            .find(|(_, headings)| headings.iter().any(|h| text.contains(h)))
            .map(|(kind, _)| *kind);
        b.set_opt("note_type", note_type, LABEL_CONFIDENCE);

        // Step 1: sending and receiving entities
        let entities: Vec<String> = RE_ENTITY
            .captures_iter(&text)
            .map(|c| clean_name(&c[1]))
            .collect();
        let sending = entities.iter().find(|e| !mentions_host_country(e)).cloned();
        let receiving = entities.iter().find(|e| mentions_host_country(e)).cloned();
        b.set_opt("sending_entity", sending, LABEL_CONFIDENCE);
        b.set_opt("receiving_entity", receiving, LABEL_CONFIDENCE);

        // Step 2: note metadata
        let reference = capture_first(&[&RE_REFERENCE], &text).filter(|r| r.chars().any(|c| c.is_ascii_digit()));
        b.set_opt("reference_number", reference, LABEL_CONFIDENCE);
        let date = capture_first(&[&RE_DATE_LABELED, &RE_PLACE_DATE], &text)
            .and_then(|d| find_dates(&d).into_iter().next())
            .or_else(|| find_dates(&text).into_iter().next());
        b.set_opt("date", date.map(|d| d.format("%Y-%m-%d").to_string()), LABEL_CONFIDENCE);
        b.set_opt("subject", capture_first(&[&RE_SUBJECT], &text).map(|s| s.trim().to_string()), LABEL_CONFIDENCE);

        // Step 3: the diplomat
        b.set_opt(
            "diplomat_name",
            capture_first(&[&RE_DIPLOMAT_LABELED], &text).map(|n| clean_name(&n)),
            LABEL_CONFIDENCE,
        );
        b.set_opt(
            "diplomat_name",
            capture_first(&[&RE_DIPLOMAT_PROSE], &text).map(|n| clean_name(&n)),
            PROSE_CONFIDENCE,
        );
        b.set_opt(
            "diplomat_title",
            capture_first(&[&RE_TITLE_LABELED, &RE_TITLE], &text).map(|t| clean_name(&t)),
            PROSE_CONFIDENCE,
        );
        b.set_opt("diplomat_passport_number", capture_first(&[&RE_PASSPORT], &text), LABEL_CONFIDENCE);

        // Step 4: mission
        if let Some(c) = RE_MISSION_PERIOD.captures(&text) {
            let iso = |raw: &str| find_dates(raw).into_iter().next().map(|d| d.format("%Y-%m-%d").to_string());
            b.set_opt("mission_from", iso(&c[1]), PROSE_CONFIDENCE);
            b.set_opt("mission_to", iso(&c[2]), PROSE_CONFIDENCE);
        }
        b.set_opt("mission_purpose", capture_first(&[&RE_PURPOSE], &text).map(|p| p.trim().to_string()), PROSE_CONFIDENCE);
        b.set_opt("visa_category", visa_category(&text), PROSE_CONFIDENCE);
        b.set("official_stamp", RE_STAMP.is_match(&text), PROSE_CONFIDENCE);

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = vec![
            check("official_letterhead", fields.contains_key("sending_entity")),
            check(
                "addressed_to_ci_embassy",
                field_text(fields, "receiving_entity").is_some_and(|r| mentions_host_country(&r.to_uppercase())),
            ),
            check("diplomat_identified", fields.contains_key("diplomat_name")),
        ];
        if let Some(date) = field_date(fields, "date") {
            let oldest = today.checked_sub_months(Months::new(RECENT_NOTE_MONTHS)).unwrap_or(today);
            checks.push(check("date_recent", date > oldest && date <= today));
        }
        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "\
EMBASSY OF THE FEDERAL DEMOCRATIC REPUBLIC OF ETHIOPIA
Note Verbale No: EMB/123/2025
The Embassy of the Federal Democratic Republic of Ethiopia presents its compliments to the Embassy of the Republic of Côte d'Ivoire in Addis Ababa and has the honour to request a diplomatic visa for Mr Dawit Alemu, First Secretary, holder of diplomatic passport No. EP0012345, for an official mission from 01/06/2025 to 10/06/2025.
Addis Ababa, 05/05/2025
[SEAL]
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    #[test]
    fn extracts_diplomatic_note() {
        let fields = VerbalNoteExtractor::new().extract(NOTE);
        assert_eq!(field_text(&fields, "note_type").as_deref(), Some("VERBAL_NOTE"));
        assert_eq!(
            field_text(&fields, "sending_entity").as_deref(),
            Some("EMBASSY OF THE FEDERAL DEMOCRATIC REPUBLIC OF ETHIOPIA")
        );
        assert_eq!(
            field_text(&fields, "receiving_entity").as_deref(),
            Some("EMBASSY OF THE REPUBLIC OF COTE D'IVOIRE")
        );
        assert_eq!(field_text(&fields, "reference_number").as_deref(), Some("EMB/123/2025"));
        assert_eq!(field_text(&fields, "date").as_deref(), Some("2025-05-05"));
        assert_eq!(field_text(&fields, "diplomat_name").as_deref(), Some("DAWIT ALEMU"));
        assert_eq!(field_text(&fields, "diplomat_title").as_deref(), Some("FIRST SECRETARY"));
        assert_eq!(field_text(&fields, "diplomat_passport_number").as_deref(), Some("EP0012345"));
        assert_eq!(field_text(&fields, "mission_from").as_deref(), Some("2025-06-01"));
        assert_eq!(field_text(&fields, "visa_category").as_deref(), Some("DIPLOMATIC"));
        assert_eq!(field_bool(&fields, "official_stamp"), Some(true));
    }

    #[test]
    fn note_passes_validation() {
        let out = VerbalNoteExtractor::new().run(NOTE, today());
        assert!(out.validations.iter().all(|c| c.passed), "{:?}", out.validations);
        assert_eq!(out.validations.len(), 4);
    }

    #[test]
    fn note_to_other_embassy_fails_addressee() {
        let text = "MINISTRY OF FOREIGN AFFAIRS OF KENYA\nTo the Embassy of France, Nairobi, 01/01/2024";
        let out = VerbalNoteExtractor::new().run(text, today());
        let get = |name: &str| out.validations.iter().find(|c| c.name == name).map(|c| c.passed);
        assert_eq!(get("official_letterhead"), Some(true));
        assert_eq!(get("addressed_to_ci_embassy"), Some(false));
        assert_eq!(get("diplomat_identified"), Some(false));
        assert_eq!(get("date_recent"), Some(false));
    }
}

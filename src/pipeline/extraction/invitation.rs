use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::types::*;
use crate::config::thresholds;
use crate::models::{DocumentType, FieldMap, ValidationCheck};
use crate::parsing::{days_between, fold_diacritics};
use crate::reference::find_ci_city;

const DATE: &str = r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}(?:ST|ND|RD|TH|ER)?\s+[A-Z]+\.?\s+\d{4}";

static RE_INVITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\b(?:INVITER|INVITANT|HOST|HOTE)\s*(?:NAME|NOM)?\s*:[ \t]*(?:(?:MR|MRS|MS|MME|MLLE)\.?\s+)?([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_UNDERSIGNED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:UNDERSIGNED|SOUSSIGNEE?|SOUSSIGNE\(E\))[,:\s]+(?:(?:MR|MRS|MS|MME|MLLE|M)\.?\s+)?([A-Z][A-Z\-']+(?:\s+[A-Z][A-Z\-']+){0,3}?)\s*,?\s*(?:RESIDING|RESIDANT|DEMEURANT|HEREBY|HOLDER|TITULAIRE|BORN|NEE?\b)").unwrap()
});
static RE_FIRST_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:I|JE),?\s+(?:(?:MR|MRS|MS|MME|MLLE|M)\.?\s+)?([A-Z][A-Z\-']+(?:\s+[A-Z][A-Z\-']+){0,3}?)\s*,\s*(?:RESIDING|RESIDANT|DEMEURANT|HEREBY|PAR\s+LA\s+PRESENTE)").unwrap()
});
static RE_INVITEE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\b(?:INVITEE|INVITE\(E\)|INVITEE?|GUEST|VISITOR|VISITEUR)\s*(?:NAME|NOM)?\s*:[ \t]*(?:(?:MR|MRS|MS|MME|MLLE)\.?\s+)?([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_INVITE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bINVITE\s+(?:MY\s+[A-Z]+\s*,?\s*)?(?:MR|MRS|MS|MME|MLLE|M)\.?\s+([A-Z][A-Z\-']+(?:\s+[A-Z][A-Z\-']+){0,3})").unwrap()
});
static RE_INVITEE_PASSPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:PASSPORT|PASSEPORT)\s*(?:(?:NO\.?|N°|NUMBER|NUMERO)[:\s]*)?([A-Z]{1,2}\d{6,9})\b").unwrap()
});
static RE_NATIONALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:NATIONALITY|NATIONALITE)\s*:?\s*([A-Z]+)|(?:CITIZEN\s*OF|RESSORTISSANT\s*(?:DE|DU))\s+([A-Z]+)").unwrap()
});
static RE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:RESIDING\s*AT|RESIDANT\s*A|DEMEURANT\s*A|ADDRESS|ADRESSE)[:\s]*([^\n]+)$").unwrap()
});
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:TEL|PHONE|TELEPHONE)[.:\s]*(\+?\d[\d \-]{8,}\d)").unwrap()
});
static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,})\b").unwrap());
static RE_ID_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bCNI|CARTE\s*D'?\s*IDENTITE|IDENTITY\s*CARD|\bID)\s*(?:NO\.?|N°)?[:\s#]*([A-Z0-9][A-Z0-9\-]{5,})").unwrap()
});
static RE_DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:\bFROM|\bDU|A\s*PARTIR\s*DU)\s*({DATE})\s*(?:\bTO|\bAU|\bA|UNTIL|JUSQU'?AU?)\s*({DATE})"
    ))
    .unwrap()
});
static RE_ARRIVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?:ARRIVAL|ARRIVEE)(?:\s*DATE)?[:\s]*({DATE})")).unwrap());
static RE_DEPARTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?:DEPARTURE|DEPART|RETURN)(?:\s*DATE)?[:\s]*({DATE})")).unwrap());
static RE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bFOR|POUR|PENDANT|DURING)\s+(?:A\s+PERIOD\s+OF\s+|UNE\s+DUREE\s+DE\s+)?(\d{1,3})\s*(?:DAYS?|JOURS?)\b").unwrap()
});
static RE_DURATION_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:STAY|SEJOUR|DURATION|DUREE)\s*(?:OF|DE)?[:\s]*(\d{1,3})\s*(?:DAYS?|JOURS?)\b").unwrap()
});
static RE_DURATION_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})\s*(?:DAYS?|JOURS?)\b").unwrap());
static RE_ACCOMMODATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?:HEBERGEMENT|ACCOMMODATION|LODGING)\s*(?:WILL\s*BE\s*|SERA\s*)?(?:FOURNI|PROVIDED|ASSURE|GARANTI)",
        r"|(?:LOGERA?|SERA\s*HEBERGEE?)\s*(?:CHEZ\s*(?:MOI|NOUS)|A\s*MON\s*DOMICILE)",
        r"|(?:I|WE)\s*WILL\s*(?:PROVIDE|COVER)\s*(?:[A-Z]+\s+){0,2}(?:ACCOMMODATION|LODGING)",
        r"|JE\s*FOURNIRAI?\s*(?:L'?)?HEBERGEMENT",
        r"|STAY(?:ING)?\s*WITH\s*(?:ME|US)",
        r"|CHEZ\s*(?:MOI|L'?INVITANT|L'?HOTE)",
        r"|(?:HOSTED|ACCOMMODATED)\s*(?:AT\s*MY|BY\s*ME|IN\s*MY)",
    ))
    .unwrap()
});
static RE_ACCOMMODATION_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:STAYING\s*AT|WILL\s*STAY\s*AT|HEBERGEE?\s*A|SEJOURNERA\s*(?:A|CHEZ))[:\s]*([^\n]+)$").unwrap()
});
static RE_NOTARIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:NOTARY|NOTAIRE|NOTARIZED|NOTARISED|LEGALIZED|LEGALISEE?|CERTIFIED|CERTIFIEE?)\b").unwrap()
});
static RE_NOTARY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:NOTARY|NOTAIRE)\s*:[ \t]*(?:(?:MR|ME|MAITRE)\.?\s+)?([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:STAMP|CACHET|SEAL|SCEAU)\b").unwrap());

/// Visit purposes and the keywords that reveal them.
const PURPOSES: &[(&str, &[&str])] = &[
    ("TOURISM", &["TOURISME", "TOURISM", "VACATION", "VACANCES", "HOLIDAY"]),
    ("FAMILY", &["VISITE FAMILIALE", "FAMILY VISIT", "REUNIFICATION", "VISIT MY FAMILY"]),
    ("BUSINESS", &["AFFAIRES", "BUSINESS", "MEETING", "REUNION", "CONFERENCE"]),
    ("MEDICAL", &["MEDICAL", "SANTE", "HEALTH", "TREATMENT", "TRAITEMENT"]),
    ("STUDIES", &["ETUDES", "STUDIES", "FORMATION", "TRAINING"]),
    ("CULTURAL", &["CULTUREL", "CULTURAL", "ARTISTIQUE", "ARTISTIC"]),
];

/// Inviter-invitee relationships and their keywords.
const RELATIONSHIPS: &[(&str, &[&str])] = &[
    ("SPOUSE", &["EPOUX", "EPOUSE", "SPOUSE", "WIFE", "HUSBAND"]),
    ("FAMILY", &["FAMILLE", "FAMILY", "FRERE", "SOEUR", "ONCLE", "TANTE", "COUSIN", "BROTHER", "SISTER", "UNCLE", "AUNT"]),
    ("FRIEND", &["AMI", "AMIE", "FRIEND"]),
    ("BUSINESS", &["PARTNER", "PARTENAIRE", "PROFESSIONAL", "PROFESSIONNEL"]),
    ("EMPLOYER", &["EMPLOYEUR", "EMPLOYER", "COMPANY", "SOCIETE", "ENTREPRISE"]),
];

const LABEL_CONFIDENCE: f32 = 0.8;
const PROSE_CONFIDENCE: f32 = 0.65;

fn first_date(raw: &str) -> Option<NaiveDate> {
    find_dates(raw).into_iter().next()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Invitation letter extractor. Letters are prose, so most fields come
/// from phrasing rather than labels.
pub struct InvitationExtractor;

impl InvitationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvitationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvitationExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Invitation
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = fold_diacritics(&raw_text.to_uppercase());
        let mut b = FieldBuilder::new();

        // Step 1: parties
        b.set_opt("inviter_name", capture_first(&[&RE_INVITER], &text).map(|n| clean_name(&n)), LABEL_CONFIDENCE);
        b.set_opt(
            "inviter_name",
            capture_first(&[&RE_UNDERSIGNED, &RE_FIRST_PERSON], &text).map(|n| clean_name(&n)),
            PROSE_CONFIDENCE,
        );
        b.set_opt("invitee_name", capture_first(&[&RE_INVITEE], &text).map(|n| clean_name(&n)), LABEL_CONFIDENCE);
        b.set_opt("invitee_name", capture_first(&[&RE_INVITE_VERB], &text).map(|n| clean_name(&n)), PROSE_CONFIDENCE);
        b.set_opt("invitee_passport_number", capture_first(&[&RE_INVITEE_PASSPORT], &text), LABEL_CONFIDENCE);
        let nationality = RE_NATIONALITY
            .captures(&text)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string());
        b.set_opt("invitee_nationality", nationality, LABEL_CONFIDENCE);

        // Step 2: inviter contact
        let address = capture_first(&[&RE_ADDRESS], &text).map(|a| a.trim().to_string());
        let city = address
            .as_deref()
            .and_then(find_ci_city)
            .or_else(|| find_ci_city(&text));
        b.set_opt("inviter_address", address, LABEL_CONFIDENCE);
        b.set_opt("inviter_city", city, PROSE_CONFIDENCE);
        b.set_opt(
            "inviter_phone",
            capture_first(&[&RE_PHONE], &text).map(|p| p.replace([' ', '-'], "")),
            LABEL_CONFIDENCE,
        );
        b.set_opt("inviter_email", capture_first(&[&RE_EMAIL], raw_text).map(|e| e.to_lowercase()), LABEL_CONFIDENCE);
        b.set_opt("inviter_id_number", capture_first(&[&RE_ID_NUMBER], &text), PROSE_CONFIDENCE);

        // Step 3: visit
        b.set_opt("purpose", keyword_class(&text, PURPOSES), PROSE_CONFIDENCE);
        b.set_opt("relationship", keyword_class(&text, RELATIONSHIPS), PROSE_CONFIDENCE);

        let (from, to) = match RE_DATE_RANGE.captures(&text) {
            Some(c) => (first_date(&c[1]), first_date(&c[2])),
            None => (
                capture_first(&[&RE_ARRIVAL], &text).and_then(|d| first_date(&d)),
                capture_first(&[&RE_DEPARTURE], &text).and_then(|d| first_date(&d)),
            ),
        };
        b.set_opt("arrival_date", from.map(iso), LABEL_CONFIDENCE);
        b.set_opt("departure_date", to.map(iso), LABEL_CONFIDENCE);

        let stated = capture_first(&[&RE_DURATION, &RE_DURATION_LABELED, &RE_DURATION_BARE], &text)
            .and_then(|d| d.parse::<i64>().ok());
        b.set_opt("duration_days", stated, PROSE_CONFIDENCE);

        // Step 4: accommodation and legalization
        let provided = RE_ACCOMMODATION.is_match(&text);
        b.set("accommodation_provided", provided, PROSE_CONFIDENCE);
        b.set_opt(
            "accommodation_address",
            capture_first(&[&RE_ACCOMMODATION_ADDRESS], &text).map(|a| a.trim().to_string()),
            PROSE_CONFIDENCE,
        );
        b.set("notarized", RE_NOTARIZED.is_match(&text), PROSE_CONFIDENCE);
        b.set_opt("notary_name", capture_first(&[&RE_NOTARY_NAME], &text).map(|n| clean_name(&n)), PROSE_CONFIDENCE);
        b.set("stamp_present", RE_STAMP.is_match(&text), PROSE_CONFIDENCE);

        b.build()
    }

    fn validate(&self, fields: &FieldMap, _today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        let from = field_date(fields, "arrival_date");
        let to = field_date(fields, "departure_date");
        checks.push(check("dates_present", from.is_some() || to.is_some()));
        checks.push(check("invitee_identified", fields.contains_key("invitee_name")));

        let duration = field_number(fields, "duration_days").map(|d| d as i64).or(match (from, to) {
            (Some(a), Some(b)) => Some(days_between(a, b) + 1),
            _ => None,
        });
        if let Some(days) = duration {
            checks.push(check(
                "duration_reasonable",
                days > 0 && days <= thresholds::MAX_STAY_DAYS,
            ));
        }

        let in_country = field_text(fields, "inviter_city").is_some()
            || field_text(fields, "inviter_address").is_some_and(|a| a.contains("IVOIRE") || a.contains("IVORY"));
        checks.push(check("inviter_in_cote_divoire", in_country));
        checks.push(check("legalization_valid", field_bool(fields, "notarized").unwrap_or(false)));
        checks.push(check("purpose_clear", fields.contains_key("purpose")));

        checks
    }
}

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use super::types::*;
use crate::config::fees;
use crate::models::{DocumentType, FieldMap, ValidationCheck};
use crate::parsing::{fold_diacritics, parse_amount};

const CURRENCIES: &str = "XOF|FCFA|CFA|ETB|EUR|USD";

static RE_AMOUNT_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:MONTANT|AMOUNT|TOTAL|SUM|SOMME|PAID|PAYE|RECU)\s*(?:/\s*(?:AMOUNT|MONTANT)\s*)?[:\s]+((?:{CURRENCIES})?\s*[0-9][0-9,.\s]*(?:\s*(?:{CURRENCIES}))?)"
    ))
    .unwrap()
});
static RE_AMOUNT_CURRENCY_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b({CURRENCIES})\s*([0-9][0-9,.\s]*[0-9])")).unwrap());
static RE_AMOUNT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(\d{{2,3}}[,.\s]?\d{{3}}\s*(?:{CURRENCIES}))\b")).unwrap()
});
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:PAYMENT\s*DATE|DATE\s*(?:DE\s*)?PAIEMENT|\bDATED?|\bLE|\bDU)[:\s]*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{4}-\d{2}-\d{2})").unwrap()
});
static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:REFERENCE|\bREF|RECEIPT|RECU|QUITTANCE)\s*(?:NO\.?|N°)?[.:\s#]*([A-Z0-9][A-Z0-9\-/]{3,})").unwrap()
});
static RE_TRANSACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:TRANSACTION|TXN|TRX)\s*(?:ID|N°|NO\.?)?[:\s#]*([A-Z0-9][A-Z0-9\-]{5,})").unwrap()
});
static RE_PAYER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:PAYEUR|PAYER|PAID\s*BY|VERSE\s*PAR|CLIENT|CUSTOMER)\s*(?:/\s*(?:PAYER|PAYEUR)\s*)?:[ \t]*(?:(?:MR|MRS|MS|MME)\.?\s+)?([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_PAYEE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:BENEFICIAIRE|PAYEE|BENEFICIARY|\bTO)\s*(?:/\s*(?:PAYEE|BENEFICIAIRE)\s*)?:[ \t]*([A-Z][A-Z\-' ]+?)[ \t]*$").unwrap()
});
static RE_BANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\b(?:BANK|BANQUE)\s*:[ \t]*([A-Z][A-Z \-']+?)[ \t]*$").unwrap());

/// Payment methods and their keywords.
const METHODS: &[(&str, &[&str])] = &[
    ("MOBILE_MONEY", &["MOBILE MONEY", "MTN MONEY", "ORANGE MONEY", "MOOV MONEY", "WAVE", "TELEBIRR", "M-PESA"]),
    ("VIREMENT", &["VIREMENT", "WIRE TRANSFER", "BANK TRANSFER", "TRANSFER"]),
    ("ESPECES", &["ESPECES", "CASH", "NUMERAIRE", "CAISSE"]),
    ("CHEQUE", &["CHEQUE", "CHECK"]),
    ("CARTE", &["MASTERCARD", "CARD", "CARTE", "DEBIT", "CREDIT"]),
];

/// Payees accepted for visa fees.
const TREASURY_MARKERS: &[&str] = &["TRESOR", "AMBASSADE", "EMBASSY"];

/// Tolerance when matching a paid amount to a fee.
const FEE_TOLERANCE: f64 = 0.05;
/// Payment receipts older than this are stale.
pub const RECENT_PAYMENT_DAYS: i64 = 30;

const LABEL_CONFIDENCE: f32 = 0.8;
const FALLBACK_CONFIDENCE: f32 = 0.6;

/// Fee schedule in XOF, each fee also with the express supplement.
fn fee_schedule() -> Vec<(&'static str, i64)> {
    let base = [
        ("tourist", fees::TOURIST),
        ("business", fees::BUSINESS),
        ("transit", fees::TRANSIT),
    ];
    base.iter()
        .copied()
        .chain(base.iter().map(|(kind, fee)| (*kind, fee + fees::EXPRESS_SUPPLEMENT)))
        .collect()
}

/// Visa type whose fee `amount` pays, within 5%.
pub fn matching_fee(amount: f64) -> Option<(&'static str, i64)> {
    fee_schedule()
        .into_iter()
        .find(|(_, fee)| ((amount - *fee as f64).abs() / *fee as f64) <= FEE_TOLERANCE)
}

/// Proof of visa fee payment extractor.
pub struct PaymentExtractor;

impl PaymentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PaymentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PaymentExtractor {
    fn document_type(&self) -> DocumentType {
        DocumentType::Payment
    }

    fn extract(&self, raw_text: &str) -> FieldMap {
        let text = fold_diacritics(&raw_text.to_uppercase());
        let mut b = FieldBuilder::new();

        let amount = capture_first(&[&RE_AMOUNT_LABELED], &text)
            .and_then(|a| parse_amount(&a))
            .map(|a| (a, LABEL_CONFIDENCE))
            .or_else(|| {
                RE_AMOUNT_CURRENCY_FIRST.captures(&text).and_then(|c| {
                    parse_amount(&format!("{} {}", &c[2], &c[1])).map(|a| (a, FALLBACK_CONFIDENCE))
                })
            })
            .or_else(|| {
                capture_first(&[&RE_AMOUNT_BARE], &text)
                    .and_then(|a| parse_amount(&a))
                    .map(|a| (a, FALLBACK_CONFIDENCE))
            });
        if let Some((amount, confidence)) = amount {
            b.set("amount", amount.value, confidence);
            let currency = amount.currency.unwrap_or_else(|| fees::CURRENCY.to_string());
            if currency == fees::CURRENCY {
                if let Some((visa_type, fee)) = matching_fee(amount.value) {
                    b.set("matched_visa_type", visa_type, confidence);
                    b.set("expected_amount", fee, confidence);
                }
            }
            b.set("currency", currency, confidence);
        }

        let date = capture_first(&[&RE_DATE], &text)
            .map(|d| iso_or_raw(&d))
            .or_else(|| find_dates(&text).first().map(|d| d.format("%Y-%m-%d").to_string()));
        b.set_opt("date", date, LABEL_CONFIDENCE);

        let reference = capture_first(&[&RE_REFERENCE], &text)
            .filter(|r| r.chars().any(|c| c.is_ascii_digit()));
        b.set_opt("reference", reference, LABEL_CONFIDENCE);
        b.set_opt("transaction_id", capture_first(&[&RE_TRANSACTION], &text), LABEL_CONFIDENCE);
        b.set_opt("payer", capture_first(&[&RE_PAYER], &text).map(|n| clean_name(&n)), LABEL_CONFIDENCE);
        b.set_opt("payee", capture_first(&[&RE_PAYEE], &text).map(|n| clean_name(&n)), LABEL_CONFIDENCE);
        b.set_opt("bank", capture_first(&[&RE_BANK], &text).map(|n| clean_name(&n)), FALLBACK_CONFIDENCE);

        let method = METHODS
            .iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w)))
            .map(|(method, _)| *method);
        b.set_opt("payment_method", method, FALLBACK_CONFIDENCE);

        b.build()
    }

    fn validate(&self, fields: &FieldMap, today: NaiveDate) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        let amount = field_number(fields, "amount");
        checks.push(check("amount_present", amount.is_some_and(|a| a > 0.0)));
        if let Some(a) = amount {
            let in_xof = field_text(fields, "currency").map_or(true, |c| c == fees::CURRENCY);
            checks.push(check("amount_matches_expected", in_xof && matching_fee(a).is_some()));
        }
        if let Some(date) = field_date(fields, "date") {
            let oldest = today - Duration::days(RECENT_PAYMENT_DAYS);
            checks.push(check("date_is_recent", date > oldest && date <= today));
        }
        if let Some(payee) = field_text(fields, "payee") {
            let folded = fold_diacritics(&payee.to_uppercase());
            checks.push(check(
                "payee_is_tresor_ci",
                TREASURY_MARKERS.iter().any(|m| folded.contains(m)),
            ));
        }
        if let Some(reference) = field_text(fields, "reference") {
            checks.push(check("reference_format_valid", reference.chars().count() >= 6));
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = "\
QUITTANCE DE PAIEMENT
Reçu N°: TP-2025-0045871
Date: 10/05/2025
Payeur: Abebe Kebede Tesfaye
Bénéficiaire: Trésor Public Côte d'Ivoire
Montant: 50 000 FCFA
Mode: Mobile Money
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    #[test]
    fn extracts_treasury_receipt() {
        let fields = PaymentExtractor::new().extract(RECEIPT);
        assert_eq!(field_number(&fields, "amount"), Some(50_000.0));
        assert_eq!(field_text(&fields, "currency").as_deref(), Some("XOF"));
        assert_eq!(field_text(&fields, "matched_visa_type").as_deref(), Some("tourist"));
        assert_eq!(field_text(&fields, "date").as_deref(), Some("2025-05-10"));
        assert_eq!(field_text(&fields, "reference").as_deref(), Some("TP-2025-0045871"));
        assert_eq!(field_text(&fields, "payer").as_deref(), Some("ABEBE KEBEDE TESFAYE"));
        assert_eq!(field_text(&fields, "payee").as_deref(), Some("TRESOR PUBLIC COTE D'IVOIRE"));
        assert_eq!(field_text(&fields, "payment_method").as_deref(), Some("MOBILE_MONEY"));
    }

    #[test]
    fn receipt_passes_validation() {
        let out = PaymentExtractor::new().run(RECEIPT, today());
        assert!(out.validations.iter().all(|c| c.passed), "{:?}", out.validations);
        assert_eq!(out.validations.len(), 5);
    }

    #[test]
    fn matching_fee_tolerates_five_percent() {
        assert_eq!(matching_fee(49_000.0), Some(("tourist", 50_000)));
        assert_eq!(matching_fee(125_000.0), Some(("tourist", 125_000)));
        assert_eq!(matching_fee(60_000.0), None);
    }

    #[test]
    fn stale_wrong_payment_fails() {
        let text = "AMOUNT: 60000 XOF\nDATE: 01/01/2025\nPAYEE: HOTEL IVOIRE\nREF: AB12";
        let out = PaymentExtractor::new().run(text, today());
        let get = |name: &str| out.validations.iter().find(|c| c.name == name).map(|c| c.passed);
        assert_eq!(get("amount_present"), Some(true));
        assert_eq!(get("amount_matches_expected"), Some(false));
        assert_eq!(get("date_is_recent"), Some(false));
        assert_eq!(get("payee_is_tresor_ci"), Some(false));
        assert_eq!(get("reference_format_valid"), Some(false));
    }
}

//! Smart prefill: predict the fields of the next document from the ones
//! already collected.
//!
//! The passport feeds names and identity, the ticket feeds dates. Once the
//! next document is extracted, the prediction doubles as the expected side of
//! a `CrossDocumentSync` comparison.

mod mapping;

pub use mapping::{is_verified_field, prefillable_types, rules_for, FieldSourceRule};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::fees;
use crate::models::{DocumentType, Dossier};
use crate::parsing::{days_between, parse_date};
use crate::sync::{CrossDocumentSync, SyncResult};

/// Application choices that drive the payment prefill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefillOptions {
    pub visa_type: String,
    pub express: bool,
}

impl Default for PrefillOptions {
    fn default() -> Self {
        Self {
            visa_type: "tourist".to_string(),
            express: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefillResult {
    pub document_type: DocumentType,
    pub prefill_data: Map<String, Value>,
    /// Mapped fields filled, in whole percent of the mapped fields.
    pub confidence: u32,
    pub source_documents: Vec<DocumentType>,
    pub has_prefill: bool,
    pub fields_count: usize,
    pub total_fields: usize,
}

impl PrefillResult {
    fn empty(document_type: DocumentType) -> Self {
        Self {
            document_type,
            prefill_data: Map::new(),
            confidence: 0,
            source_documents: Vec::new(),
            has_prefill: false,
            fields_count: 0,
            total_fields: 0,
        }
    }

    pub fn data(&self) -> Value {
        Value::Object(self.prefill_data.clone())
    }
}

/// Readiness of a document that has not been collected yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefillStatus {
    pub has_prefill: bool,
    pub fields_ready: usize,
    pub total_fields: usize,
    pub confidence: u32,
    pub sources: Vec<DocumentType>,
}

/// Read one source field from the dossier. The passport's `full_name` is the
/// display name ("GIVEN SURNAME").
fn source_value(dossier: &Dossier, document_type: DocumentType, field: &str) -> Option<Value> {
    if document_type == DocumentType::Passport && field == "full_name" {
        return dossier
            .passport
            .as_ref()
            .and_then(|p| p.display_name())
            .map(Value::String);
    }
    dossier.field(document_type, field)
}

#[derive(Debug, Clone, Default)]
pub struct SmartPrefillService {
    sync: CrossDocumentSync,
}

impl SmartPrefillService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicted fields for `document_type`, resolved opportunistically from
    /// whatever the dossier already holds.
    pub fn get_prefill_for_document(
        &self,
        document_type: DocumentType,
        dossier: &Dossier,
        options: &PrefillOptions,
    ) -> PrefillResult {
        let rules = rules_for(document_type);
        if rules.is_empty() {
            return PrefillResult::empty(document_type);
        }

        let mut prefill = Map::new();
        let mut sources = Vec::new();
        for rule in rules {
            if let Some(value) = source_value(dossier, rule.source, rule.source_field) {
                prefill.insert(rule.target.to_string(), value);
                if !sources.contains(&rule.source) {
                    sources.push(rule.source);
                }
            }
        }
        let mapped_filled = prefill.len();

        match document_type {
            DocumentType::Hotel => {
                let date = |key: &str| prefill.get(key).and_then(Value::as_str).and_then(parse_date);
                if let (Some(check_in), Some(check_out)) = (date("check_in"), date("check_out")) {
                    prefill.insert("num_nights".into(), json!(days_between(check_in, check_out).abs()));
                }
            }
            DocumentType::Payment => {
                let expected = fees::visa_fee(&options.visa_type);
                prefill.insert("expected_amount".into(), json!(expected));
                prefill.insert("visa_type".into(), json!(options.visa_type));
                let total = if options.express {
                    prefill.insert("express_supplement".into(), json!(fees::EXPRESS_SUPPLEMENT));
                    expected + fees::EXPRESS_SUPPLEMENT
                } else {
                    expected
                };
                prefill.insert("total_amount".into(), json!(total));
                prefill.insert("currency".into(), json!(fees::CURRENCY));
            }
            DocumentType::Invitation => {
                if let (Some(from), Some(to)) = (prefill.get("visit_from"), prefill.get("visit_to")) {
                    let dates = json!({"from": from, "to": to});
                    prefill.insert("visit_dates".into(), dates);
                }
            }
            _ => {}
        }

        let confidence = (mapped_filled * 100 / rules.len()) as u32;
        tracing::debug!(
            document_type = %document_type,
            fields = prefill.len(),
            confidence,
            "Prefill computed"
        );

        PrefillResult {
            document_type,
            fields_count: prefill.len(),
            total_fields: rules.len(),
            has_prefill: !prefill.is_empty(),
            prefill_data: prefill,
            confidence,
            source_documents: sources,
        }
    }

    /// Prefill readiness of every prefillable document not yet in the dossier.
    pub fn upcoming_prefill_status(
        &self,
        dossier: &Dossier,
        options: &PrefillOptions,
    ) -> BTreeMap<DocumentType, PrefillStatus> {
        prefillable_types()
            .filter(|t| !dossier.has(*t))
            .map(|t| {
                let result = self.get_prefill_for_document(t, dossier, options);
                let status = PrefillStatus {
                    has_prefill: result.has_prefill,
                    fields_ready: result.fields_count,
                    total_fields: result.total_fields,
                    confidence: result.confidence,
                    sources: result.source_documents,
                };
                (t, status)
            })
            .collect()
    }

    /// Compare an extracted document with its prefill. Only fields the
    /// document itself states are compared; form-only and derived fields
    /// are skipped. Without prefill there is nothing to contradict and the
    /// document is accepted.
    pub fn validate_extracted_vs_prefill(
        &self,
        document_type: DocumentType,
        extracted: &Value,
        prefill: &PrefillResult,
    ) -> SyncResult {
        let expected: Map<String, Value> = prefill
            .prefill_data
            .iter()
            .filter(|(field, _)| is_verified_field(document_type, field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        if expected.is_empty() {
            return SyncResult {
                document_type,
                valid: true,
                has_prefill: prefill.has_prefill,
                overall_score: 0,
                total_fields: 0,
                matched_fields: 0,
                matches: Vec::new(),
                discrepancies: Vec::new(),
                requires_user_confirmation: false,
            };
        }
        self.sync
            .compare_and_validate(extracted, &Value::Object(expected), document_type)
    }
}

/// Notification shown when a document comes with prefilled fields.
pub fn prefill_message(result: &PrefillResult) -> String {
    format!(
        "I've already prepared {} fields for your {} from your previous documents. \
         Just verify that the information is correct!",
        result.fields_count,
        result.document_type.label()
    )
}

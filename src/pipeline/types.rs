use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{
    fields_to_object, CanonicalDocument, DocumentType, FieldMap, ValidationCheck,
};
use crate::risk::RiskAssessment;

/// Per-call options for `ExtractionPipeline::process_document`.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Run the risk validator on a single-document dossier right away.
    pub validate_inline: bool,
    /// Ask the generative model for a second opinion.
    pub use_structuring: bool,
    /// Evaluation date for date-relative checks. `None` means today.
    pub today: Option<NaiveDate>,
    /// Requested visa type, used by inline risk validation.
    pub visa_type: String,
    pub express: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            validate_inline: false,
            use_structuring: true,
            today: None,
            visa_type: "tourist".to_string(),
            express: false,
        }
    }
}

impl ProcessOptions {
    pub fn evaluation_date(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Wall-clock cost of each pipeline layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerTimings {
    pub ocr_ms: u64,
    pub extractor_ms: u64,
    pub structuring_ms: u64,
    pub total_ms: u64,
    pub ocr_confidence: f32,
    pub structuring_provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub at: DateTime<Utc>,
    pub action: String,
    pub message: String,
}

/// Ordered record of what one `process_document` call did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineTrace {
    pub events: Vec<TraceEvent>,
}

impl PipelineTrace {
    pub fn record(&mut self, action: &str, message: impl Into<String>) {
        self.events.push(TraceEvent {
            at: Utc::now(),
            action: action.to_string(),
            message: message.into(),
        });
    }

    pub fn contains(&self, action: &str) -> bool {
        self.events.iter().any(|e| e.action == action)
    }

    pub fn actions(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.action.as_str()).collect()
    }
}

/// Risk verdict attached to an extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "assessment", rename_all = "snake_case")]
pub enum RiskStatus {
    /// Deferred to dossier-wide validation.
    Pending,
    Assessed(Box<RiskAssessment>),
}

/// Outcome of processing one uploaded document. This is the unit that is
/// cached by content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_type: DocumentType,
    pub success: bool,
    pub error: Option<String>,
    /// 0.0-1.0
    pub confidence: f32,
    pub fields: FieldMap,
    pub validations: Vec<ValidationCheck>,
    pub layer_timings: LayerTimings,
    pub risk_status: RiskStatus,
    pub trace: PipelineTrace,
    pub cache_key: String,
    pub processed_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// Failed result carrying a user-facing message only.
    pub fn failure(
        document_type: DocumentType,
        cache_key: String,
        message: &str,
        trace: PipelineTrace,
        layer_timings: LayerTimings,
    ) -> Self {
        Self {
            document_type,
            success: false,
            error: Some(message.to_string()),
            confidence: 0.0,
            fields: FieldMap::new(),
            validations: Vec::new(),
            layer_timings,
            risk_status: RiskStatus::Pending,
            trace,
            cache_key,
            processed_at: Utc::now(),
        }
    }

    /// Typed view of the extracted fields and verdicts. `None` for `Other`
    /// documents.
    pub fn canonical(&self) -> Option<CanonicalDocument> {
        CanonicalDocument::from_value(self.document_type, &self.canonical_value())
    }

    /// Field object with the validation verdicts nested under `validations`.
    /// A check that failed under any source stays failed.
    pub fn canonical_value(&self) -> Value {
        let mut doc = fields_to_object(&self.fields);
        let mut verdicts = Map::new();
        for check in &self.validations {
            let earlier = verdicts.get(&check.name).and_then(Value::as_bool).unwrap_or(true);
            verdicts.insert(check.name.clone(), Value::Bool(earlier && check.passed));
        }
        if !verdicts.is_empty() {
            if let Value::Object(map) = &mut doc {
                map.insert("validations".to_string(), Value::Object(verdicts));
            }
        }
        doc
    }

    pub fn passed_validations(&self) -> usize {
        self.validations.iter().filter(|v| v.passed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedField, FieldSource};

    fn result_with(checks: &[(&str, bool, FieldSource)]) -> ExtractionResult {
        let mut fields = FieldMap::new();
        fields.insert(
            "holder_name".into(),
            ExtractedField::new("holder_name", "ABEBE KEBEDE TESFAYE", 0.8, FieldSource::Extractor),
        );
        let validations = checks
            .iter()
            .map(|(name, passed, source)| ValidationCheck::new(name, *passed, *source))
            .collect();
        ExtractionResult {
            document_type: DocumentType::Vaccination,
            success: true,
            error: None,
            confidence: 0.8,
            fields,
            validations,
            layer_timings: LayerTimings::default(),
            risk_status: RiskStatus::Pending,
            trace: PipelineTrace::default(),
            cache_key: "key".into(),
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn canonical_value_nests_verdicts() {
        let result = result_with(&[
            ("yellow_fever_valid", false, FieldSource::Extractor),
            ("yellow_fever_valid", true, FieldSource::Ai),
            ("yellow_fever_present", true, FieldSource::Extractor),
        ]);
        let value = result.canonical_value();
        assert_eq!(value["holder_name"], "ABEBE KEBEDE TESFAYE");
        assert_eq!(value["validations"]["yellow_fever_valid"], false);
        assert_eq!(value["validations"]["yellow_fever_present"], true);

        let Some(CanonicalDocument::Vaccination(card)) = result.canonical() else {
            panic!("expected a vaccination document");
        };
        assert_eq!(card.valid, Some(false));
    }

    #[test]
    fn no_checks_means_no_validations_key() {
        let value = result_with(&[]).canonical_value();
        assert!(value.get("validations").is_none());
    }
}

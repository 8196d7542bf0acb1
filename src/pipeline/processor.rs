//! Document extraction orchestrator.
//!
//! Single entry point that drives one uploaded document through the layers:
//! cache → (PDF → image) → vision OCR → pattern extractor → model
//! structuring → merge → confidence → optional inline risk → cache.
//!
//! Uses trait-based DI for every provider (VisionOcr, PdfConverter,
//! ChatClient) so the orchestrator stays testable with mock implementations.

use std::time::Instant;

use super::cache::ExtractionCache;
use super::extraction::ExtractorRegistry;
use super::merge::{merge_outputs, overall_confidence};
use super::ocr::{PdfConverter, VisionOcr};
use super::structuring::{OllamaChatClient, StructuredOutput, StructuringAdapter};
use super::types::{ExtractionResult, LayerTimings, PipelineTrace, ProcessOptions, RiskStatus};
use super::PipelineError;
use crate::config::EngineConfig;
use crate::models::{DocumentType, Dossier};
use crate::risk::{RiskContext, RiskValidator};

/// Shown to the applicant when the document cannot be read at all. Provider
/// details go to the log only.
pub const RETRY_MESSAGE: &str =
    "We could not read this document right now. Please try again in a few moments.";

/// Text read from the upload, with the OCR confidence (0.0-1.0).
struct ReadText {
    text: String,
    confidence: f32,
    ocr_ms: u64,
}

pub struct ExtractionPipeline {
    ocr: Box<dyn VisionOcr>,
    pdf: Box<dyn PdfConverter>,
    structuring: Option<StructuringAdapter>,
    registry: ExtractorRegistry,
    cache: ExtractionCache,
    risk: RiskValidator,
}

impl ExtractionPipeline {
    /// Pipeline with the built-in extractors and no structuring provider.
    pub fn new(ocr: Box<dyn VisionOcr>, pdf: Box<dyn PdfConverter>, cache: ExtractionCache) -> Self {
        Self {
            ocr,
            pdf,
            structuring: None,
            registry: ExtractorRegistry::with_defaults(),
            cache,
            risk: RiskValidator::new(),
        }
    }

    /// Pipeline wired from configuration: cache directory and the Ollama
    /// structuring client. An unusable HTTP client disables structuring.
    pub fn from_config(
        config: &EngineConfig,
        ocr: Box<dyn VisionOcr>,
        pdf: Box<dyn PdfConverter>,
    ) -> Self {
        let pipeline = Self::new(ocr, pdf, ExtractionCache::new(&config.cache_dir));
        match OllamaChatClient::from_config(config) {
            Ok(client) => {
                tracing::info!(model = %client.model(), "Structuring through Ollama");
                pipeline.with_structuring(StructuringAdapter::new(Box::new(client)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Structuring disabled");
                pipeline
            }
        }
    }

    pub fn with_structuring(mut self, adapter: StructuringAdapter) -> Self {
        self.structuring = Some(adapter);
        self
    }

    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    /// Process one uploaded document. Never fails: an unreadable document
    /// yields `success: false` with a user-facing retry message.
    pub fn process_document(
        &self,
        content: &[u8],
        document_type: DocumentType,
        mime_type: &str,
        options: &ProcessOptions,
    ) -> ExtractionResult {
        let _span = tracing::info_span!(
            "process_document",
            document_type = %document_type,
            mime_type,
            bytes = content.len()
        )
        .entered();
        let started = Instant::now();

        // Step 1: cache lookup
        let cache_key = ExtractionCache::cache_key(content, document_type);
        match self.cache.get(&cache_key) {
            Ok(Some(hit)) => {
                tracing::info!(key = %cache_key, "Extraction cache hit");
                return hit;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Extraction cache read failed"),
        }

        let mut trace = PipelineTrace::default();
        let mut timings = LayerTimings::default();
        trace.record("cache_miss", format!("No cached result for {document_type}"));

        // Step 2-3: normalize and OCR
        let read = match self.read_text(content, mime_type, &mut trace) {
            Ok(read) => read,
            Err(e) => {
                tracing::error!(error = %e, "Document could not be read");
                trace.record("ocr_failed", "Document could not be read");
                timings.total_ms = elapsed_ms(started);
                return ExtractionResult::failure(document_type, cache_key, RETRY_MESSAGE, trace, timings);
            }
        };
        timings.ocr_ms = read.ocr_ms;
        timings.ocr_confidence = read.confidence;

        // Step 4: pattern extractor (always)
        let today = options.evaluation_date();
        let extractor_started = Instant::now();
        let extractor = self.registry.resolve(document_type);
        let extracted = extractor.run(&read.text, today);
        timings.extractor_ms = elapsed_ms(extractor_started);
        trace.record(
            "extractor",
            format!(
                "{} fields, {} checks from the {} extractor",
                extracted.fields.len(),
                extracted.validations.len(),
                extractor.document_type()
            ),
        );

        // Step 5: model structuring (best effort)
        let structured = if options.use_structuring {
            self.structure(document_type, &read, &mut trace, &mut timings)
        } else {
            trace.record("structuring_skipped", "Structuring disabled for this call");
            None
        };

        // Step 6-7: merge and confidence
        let (fields, validations) =
            merge_outputs(extracted.fields, extracted.validations, structured.as_ref());
        let confidence = overall_confidence(read.confidence, fields.len(), &validations);

        let mut result = ExtractionResult {
            document_type,
            success: true,
            error: None,
            confidence,
            fields,
            validations,
            layer_timings: timings,
            risk_status: RiskStatus::Pending,
            trace,
            cache_key,
            processed_at: chrono::Utc::now(),
        };

        // Step 8: inline risk on a single-document dossier
        if options.validate_inline {
            let mut dossier = Dossier::new();
            if let Some(canonical) = result.canonical() {
                dossier.insert(canonical);
            }
            let context = RiskContext {
                today,
                visa_type: options.visa_type.clone(),
                express: options.express,
            };
            let assessment = self.risk.validate(&dossier, &context);
            result
                .trace
                .record("risk_inline", format!("Risk level {}", assessment.risk_level));
            result.risk_status = RiskStatus::Assessed(Box::new(assessment));
        }

        result.layer_timings.total_ms = elapsed_ms(started);
        tracing::info!(
            confidence = result.confidence,
            fields = result.fields.len(),
            total_ms = result.layer_timings.total_ms,
            "Document processed"
        );

        // Step 9: cache (non-fatal)
        if let Err(e) = self.cache.put(&result) {
            tracing::warn!(error = %e, "Extraction cache write failed");
        }

        result
    }

    /// Remove every cached extraction result. Returns the count removed.
    pub fn clear_cache(&self) -> Result<usize, PipelineError> {
        Ok(self.cache.clear()?)
    }

    fn read_text(
        &self,
        content: &[u8],
        mime_type: &str,
        trace: &mut PipelineTrace,
    ) -> Result<ReadText, PipelineError> {
        if content.is_empty() {
            return Err(PipelineError::UnsupportedFormat("empty upload".into()));
        }

        let mime = mime_type.trim().to_ascii_lowercase();
        if mime == "text/plain" {
            trace.record("text_input", "Plain text upload, OCR skipped");
            return Ok(ReadText {
                text: String::from_utf8_lossy(content).into_owned(),
                confidence: 1.0,
                ocr_ms: 0,
            });
        }

        let ocr_started = Instant::now();
        let output = if mime.starts_with("image/") {
            self.ocr.extract_text(content, &mime)?
        } else {
            let image = self.pdf.convert_to_image(content, 0)?;
            trace.record("pdf_converted", format!("Page 1 rendered as {}", image.mime_type));
            self.ocr.extract_text(&image.image, &image.mime_type)?
        };
        let ocr_ms = elapsed_ms(ocr_started);

        tracing::debug!(
            provider = self.ocr.provider(),
            chars = output.full_text.len(),
            confidence = output.confidence,
            "OCR complete"
        );
        trace.record(
            "ocr",
            format!(
                "{} characters at confidence {:.2} in {ocr_ms} ms",
                output.full_text.chars().count(),
                output.confidence
            ),
        );

        Ok(ReadText {
            text: output.full_text,
            confidence: output.confidence.clamp(0.0, 1.0),
            ocr_ms,
        })
    }

    fn structure(
        &self,
        document_type: DocumentType,
        read: &ReadText,
        trace: &mut PipelineTrace,
        timings: &mut LayerTimings,
    ) -> Option<StructuredOutput> {
        let Some(adapter) = &self.structuring else {
            trace.record("structuring_fallback", "No structuring provider configured");
            return None;
        };

        let started = Instant::now();
        let outcome = adapter.structure(document_type, &read.text, read.confidence);
        timings.structuring_ms = elapsed_ms(started);

        match outcome {
            Ok(structured) => {
                trace.record(
                    "structuring",
                    format!("{} fields proposed by {}", structured.fields.len(), structured.provider),
                );
                timings.structuring_provider = Some(structured.provider.clone());
                Some(structured)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Structuring failed, using extractor output only");
                trace.record("structuring_fallback", "Extractor output only");
                None
            }
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::coherence::{CoherenceValidator, IssueType};
    use crate::models::{FieldSource, Severity};
    use crate::pipeline::ocr::{MockPdfConverter, MockVisionOcr};
    use crate::pipeline::structuring::MockChatClient;
    use crate::risk::FraudType;

    const BOOKING: &str = "\
Sofitel Abidjan Hotel Ivoire
Guest name: Abebe Kebede Tesfaye
Address: Boulevard Hassan II, Cocody, Abidjan, Côte d'Ivoire
Check-in: 01/06/2025
Check-out: 15/06/2025
Confirmation number: 4827-1193
";

    fn options() -> ProcessOptions {
        ProcessOptions {
            today: NaiveDate::from_ymd_opt(2025, 5, 15),
            ..Default::default()
        }
    }

    fn pipeline(dir: &tempfile::TempDir, ocr: Arc<MockVisionOcr>) -> ExtractionPipeline {
        ExtractionPipeline::new(
            Box::new(ocr),
            Box::new(MockPdfConverter::new(1)),
            ExtractionCache::new(dir.path()),
        )
    }

    #[test]
    fn plain_text_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = Arc::new(MockVisionOcr::new("unused", 0.5));
        let result = pipeline(&dir, ocr.clone()).process_document(
            BOOKING.as_bytes(),
            DocumentType::Hotel,
            "text/plain",
            &options(),
        );
        assert!(result.success);
        assert_eq!(ocr.calls(), 0);
        assert_eq!(result.layer_timings.ocr_confidence, 1.0);
        assert!(result.trace.contains("text_input"));
        assert!(result.trace.contains("structuring_fallback"));
        assert_eq!(result.risk_status, RiskStatus::Pending);
        assert!(result.fields.contains_key("check_in_date"));
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = Arc::new(MockVisionOcr::new(BOOKING, 0.9));
        let pipeline = pipeline(&dir, ocr.clone());

        let first = pipeline.process_document(b"jpeg bytes", DocumentType::Hotel, "image/jpeg", &options());
        let second = pipeline.process_document(b"jpeg bytes", DocumentType::Hotel, "image/jpeg", &options());

        assert!(first.success);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(pipeline.clear_cache().unwrap(), 1);
    }

    #[test]
    fn ocr_outage_is_a_generic_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir, Arc::new(MockVisionOcr::unavailable()));
        let result = pipeline.process_document(b"jpeg", DocumentType::Passport, "image/jpeg", &options());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(RETRY_MESSAGE));
        assert!(pipeline.cache().is_empty());
    }

    #[test]
    fn pdf_goes_through_converter() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = Arc::new(MockVisionOcr::new(BOOKING, 0.8));
        let result = pipeline(&dir, ocr.clone()).process_document(
            b"%PDF-1.7",
            DocumentType::Hotel,
            "application/pdf",
            &options(),
        );
        assert!(result.success);
        assert_eq!(ocr.calls(), 1);
        assert!(result.trace.contains("pdf_converted"));
    }

    #[test]
    fn pdf_conversion_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ExtractionPipeline::new(
            Box::new(MockVisionOcr::new(BOOKING, 0.8)),
            Box::new(MockPdfConverter::failing()),
            ExtractionCache::new(dir.path()),
        );
        let result = pipeline.process_document(b"%PDF", DocumentType::Hotel, "application/pdf", &options());
        assert!(!result.success);
    }

    #[test]
    fn ai_never_overwrites_extractor_value() {
        let dir = tempfile::tempdir().unwrap();
        let ai = r#"{"extracted": {"guest_name": "SOMEONE ELSE", "booking_platform": "Expedia"},
                     "validations": {"dates_coherent": true}}"#;
        let pipeline = pipeline(&dir, Arc::new(MockVisionOcr::new(BOOKING, 0.9)))
            .with_structuring(StructuringAdapter::new(Box::new(MockChatClient::new(ai))));

        let result = pipeline.process_document(b"img", DocumentType::Hotel, "image/png", &options());
        let guest = &result.fields["guest_name"];
        assert_eq!(guest.value, "ABEBE KEBEDE TESFAYE");
        assert_eq!(guest.source, FieldSource::Extractor);
        assert_eq!(result.fields["booking_platform"].source, FieldSource::Ai);
        assert!(result.validations.iter().any(|v| v.source == FieldSource::Ai));
        assert_eq!(result.layer_timings.structuring_provider.as_deref(), Some("mock_chat"));
    }

    #[test]
    fn structuring_outage_degrades_to_extractor_only() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir, Arc::new(MockVisionOcr::new(BOOKING, 0.9)))
            .with_structuring(StructuringAdapter::new(Box::new(MockChatClient::unavailable())));

        let result = pipeline.process_document(b"img", DocumentType::Hotel, "image/png", &options());
        assert!(result.success);
        assert!(result.trace.contains("structuring_fallback"));
        assert!(result.fields.values().all(|f| f.source == FieldSource::Extractor));
    }

    #[test]
    fn inline_validation_attaches_assessment() {
        let dir = tempfile::tempdir().unwrap();
        let opts = ProcessOptions {
            validate_inline: true,
            ..options()
        };
        let result = pipeline(&dir, Arc::new(MockVisionOcr::new(BOOKING, 0.9))).process_document(
            b"img",
            DocumentType::Hotel,
            "image/png",
            &opts,
        );
        assert!(matches!(result.risk_status, RiskStatus::Assessed(_)));
        assert!(result.trace.contains("risk_inline"));
    }

    #[test]
    fn extractor_verdicts_reach_the_validators() {
        let card = "\
INTERNATIONAL CERTIFICATE OF VACCINATION
Name: Abebe Kebede Tesfaye
Yellow Fever / Fièvre jaune   12/05/2025   Stamaril
";
        let dir = tempfile::tempdir().unwrap();
        let opts = ProcessOptions {
            validate_inline: true,
            ..options()
        };
        let result = pipeline(&dir, Arc::new(MockVisionOcr::new(card, 0.9))).process_document(
            b"img",
            DocumentType::Vaccination,
            "image/png",
            &opts,
        );
        assert!(result
            .validations
            .iter()
            .any(|v| v.name == "yellow_fever_valid" && !v.passed));

        let dossier = Dossier::new().with(result.canonical().unwrap());
        assert_eq!(dossier.vaccination.as_ref().and_then(|v| v.valid), Some(false));

        let RiskStatus::Assessed(assessment) = &result.risk_status else {
            panic!("no inline assessment: {:?}", result.risk_status);
        };
        assert!(assessment.has_indicator(FraudType::InvalidYellowFever));

        let report = CoherenceValidator::new().validate_dossier_at(&dossier, opts.evaluation_date());
        assert!(report
            .issues_of(IssueType::VaccinationExpired)
            .any(|i| i.severity == Severity::Error));
    }

    #[test]
    fn confidence_combines_layers() {
        let dir = tempfile::tempdir().unwrap();
        let result = pipeline(&dir, Arc::new(MockVisionOcr::new(BOOKING, 0.9))).process_document(
            b"img",
            DocumentType::Hotel,
            "image/png",
            &options(),
        );
        let expected = overall_confidence(0.9, result.fields.len(), &result.validations);
        assert_eq!(result.confidence, expected);
        assert!(result.confidence > 0.5);
    }
}

use super::parser::parse_structuring_response;
use super::prompt::{build_structuring_prompt, STRUCTURING_SYSTEM_PROMPT};
use super::types::{ChatClient, StructuredOutput};
use super::StructuringError;
use crate::models::DocumentType;

/// Minimum raw text length worth sending to the model.
const MIN_INPUT_LENGTH: usize = 10;

/// Maximum model+parse retry attempts for failed or malformed responses.
const MAX_LLM_RETRIES: usize = 2;

/// Best-effort model structuring of OCR text. The caller treats any error
/// as "no AI contribution".
pub struct StructuringAdapter {
    client: Box<dyn ChatClient>,
}

impl StructuringAdapter {
    pub fn new(client: Box<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    /// Prompt → model → parse, retrying transport and parse failures.
    pub fn structure(
        &self,
        document_type: DocumentType,
        raw_text: &str,
        ocr_confidence: f32,
    ) -> Result<StructuredOutput, StructuringError> {
        if raw_text.trim().chars().count() < MIN_INPUT_LENGTH {
            return Err(StructuringError::InputTooShort);
        }

        let prompt = build_structuring_prompt(document_type, raw_text, ocr_confidence);
        let mut last_error: Option<StructuringError> = None;

        for attempt in 0..=MAX_LLM_RETRIES {
            let response = match self.client.chat(&prompt, STRUCTURING_SYSTEM_PROMPT) {
                Ok(resp) => resp,
                Err(e) if e.is_retryable() && attempt < MAX_LLM_RETRIES => {
                    tracing::warn!(
                        document_type = %document_type,
                        attempt = attempt + 1,
                        error = %e,
                        "Model call failed, retrying"
                    );
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match parse_structuring_response(&response) {
                Ok((fields, validations)) => {
                    tracing::debug!(
                        document_type = %document_type,
                        fields = fields.len(),
                        validations = validations.len(),
                        "Model structuring succeeded"
                    );
                    return Ok(StructuredOutput {
                        fields,
                        validations,
                        provider: self.client.provider().to_string(),
                    });
                }
                Err(e) if e.is_parse_error() && attempt < MAX_LLM_RETRIES => {
                    tracing::warn!(
                        document_type = %document_type,
                        attempt = attempt + 1,
                        error = %e,
                        "Model response parse failed, retrying"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            StructuringError::MalformedResponse("All retry attempts exhausted".into())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSource;
    use crate::pipeline::structuring::MockChatClient;
    use std::sync::Arc;

    const GOOD: &str = r#"```json
{"extracted": {"guest_name": "ABEBE KEBEDE"}, "validations": {"dates_coherent": true}}
```"#;

    #[test]
    fn structures_on_first_try() {
        let adapter = StructuringAdapter::new(Box::new(MockChatClient::new(GOOD)));
        let out = adapter
            .structure(DocumentType::Hotel, "HOTEL RESERVATION FOR ABEBE", 0.9)
            .unwrap();
        assert_eq!(out.fields["guest_name"].source, FieldSource::Ai);
        assert_eq!(out.validations.len(), 1);
        assert_eq!(out.provider, "mock_chat");
    }

    #[test]
    fn retries_malformed_then_succeeds() {
        let mock = Arc::new(MockChatClient::sequence(vec![Some("garbage"), Some(GOOD)]));
        let adapter = StructuringAdapter::new(Box::new(mock.clone()));
        let out = adapter
            .structure(DocumentType::Hotel, "HOTEL RESERVATION FOR ABEBE", 0.9)
            .unwrap();
        assert!(out.fields.contains_key("guest_name"));
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let mock = Arc::new(MockChatClient::unavailable());
        let adapter = StructuringAdapter::new(Box::new(mock.clone()));
        let err = adapter
            .structure(DocumentType::Passport, "PASSPORT OF SOMEONE", 0.9)
            .unwrap_err();
        assert!(matches!(err, StructuringError::OllamaConnection(_)));
        assert_eq!(mock.calls(), MAX_LLM_RETRIES + 1);
    }

    #[test]
    fn short_input_is_rejected_without_calling_model() {
        let mock = Arc::new(MockChatClient::new(GOOD));
        let adapter = StructuringAdapter::new(Box::new(mock.clone()));
        assert!(matches!(
            adapter.structure(DocumentType::Hotel, "  abc ", 0.9),
            Err(StructuringError::InputTooShort)
        ));
        assert_eq!(mock.calls(), 0);
    }
}

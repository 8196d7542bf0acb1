use serde::{Deserialize, Serialize};

use super::StructuringError;
use crate::models::{FieldMap, ValidationCheck};

/// Fields and verdicts proposed by the generative model for one document.
/// Every field and check carries the `ai` source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutput {
    pub fields: FieldMap,
    pub validations: Vec<ValidationCheck>,
    pub provider: String,
}

/// Generative-model client abstraction (allows mocking).
pub trait ChatClient: Send + Sync {
    /// Send one prompt, return the raw completion text.
    fn chat(&self, prompt: &str, system: &str) -> Result<String, StructuringError>;

    /// Provider label recorded in layer timings.
    fn provider(&self) -> &str;
}

impl<T: ChatClient + ?Sized> ChatClient for std::sync::Arc<T> {
    fn chat(&self, prompt: &str, system: &str) -> Result<String, StructuringError> {
        (**self).chat(prompt, system)
    }

    fn provider(&self) -> &str {
        (**self).provider()
    }
}

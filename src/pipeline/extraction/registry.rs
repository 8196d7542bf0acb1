use std::collections::HashMap;

use super::generic::GenericExtractor;
use super::hotel::HotelExtractor;
use super::invitation::InvitationExtractor;
use super::passport::PassportExtractor;
use super::payment::PaymentExtractor;
use super::residence_card::ResidenceCardExtractor;
use super::ticket::TicketExtractor;
use super::types::FieldExtractor;
use super::vaccination::VaccinationExtractor;
use super::verbal_note::VerbalNoteExtractor;
use crate::models::DocumentType;

/// Maps each document type to its extractor. Types without a dedicated
/// extractor resolve to the generic one.
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentType, Box<dyn FieldExtractor>>,
    fallback: Box<dyn FieldExtractor>,
}

impl ExtractorRegistry {
    /// Empty registry: every lookup resolves to the generic extractor.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
            fallback: Box::new(GenericExtractor::new()),
        }
    }

    /// Registry with every built-in extractor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(PassportExtractor::new()));
        registry.register(Box::new(TicketExtractor::new()));
        registry.register(Box::new(HotelExtractor::new()));
        registry.register(Box::new(VaccinationExtractor::new()));
        registry.register(Box::new(InvitationExtractor::new()));
        registry.register(Box::new(PaymentExtractor::new()));
        registry.register(Box::new(VerbalNoteExtractor::new()));
        registry.register(Box::new(ResidenceCardExtractor::new()));
        registry
    }

    /// Register an extractor under its own document type, replacing any
    /// previous one.
    pub fn register(&mut self, extractor: Box<dyn FieldExtractor>) {
        self.extractors.insert(extractor.document_type(), extractor);
    }

    pub fn resolve(&self, document_type: DocumentType) -> &dyn FieldExtractor {
        self.extractors
            .get(&document_type)
            .map(|e| e.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn has_dedicated(&self, document_type: DocumentType) -> bool {
        self.extractors.contains_key(&document_type)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_type_has_an_extractor() {
        let registry = ExtractorRegistry::with_defaults();
        for doc_type in DocumentType::KNOWN {
            assert!(registry.has_dedicated(doc_type), "{doc_type}");
            assert_eq!(registry.resolve(doc_type).document_type(), doc_type);
        }
    }

    #[test]
    fn other_falls_back_to_generic() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(!registry.has_dedicated(DocumentType::Other));
        assert_eq!(registry.resolve(DocumentType::Other).document_type(), DocumentType::Other);
    }

    #[test]
    fn empty_registry_resolves_everything_to_generic() {
        let registry = ExtractorRegistry::empty();
        assert_eq!(registry.resolve(DocumentType::Passport).document_type(), DocumentType::Other);
    }
}

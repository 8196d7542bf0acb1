//! Narrow interfaces to the vision-OCR provider and the PDF rasterizer.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use super::PipelineError;

/// A positioned text block reported by the OCR provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub confidence: f32,
}

/// Raw OCR result for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub full_text: String,
    pub blocks: Vec<TextBlock>,
    /// 0.0-1.0
    pub confidence: f32,
}

/// A rasterized PDF page.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub image: Vec<u8>,
    pub mime_type: String,
}

/// Vision OCR provider (layer 1).
pub trait VisionOcr: Send + Sync {
    fn extract_text(&self, image: &[u8], mime_type: &str) -> Result<OcrOutput, PipelineError>;

    /// Provider label recorded in layer timings.
    fn provider(&self) -> &str {
        "vision_ocr"
    }
}

/// Converts PDF pages to images the OCR provider accepts.
pub trait PdfConverter: Send + Sync {
    fn convert_to_image(&self, pdf: &[u8], page: usize) -> Result<ConvertedImage, PipelineError>;
    fn page_count(&self, pdf: &[u8]) -> Result<usize, PipelineError>;
}

impl<T: VisionOcr + ?Sized> VisionOcr for std::sync::Arc<T> {
    fn extract_text(&self, image: &[u8], mime_type: &str) -> Result<OcrOutput, PipelineError> {
        (**self).extract_text(image, mime_type)
    }

    fn provider(&self) -> &str {
        (**self).provider()
    }
}

impl<T: PdfConverter + ?Sized> PdfConverter for std::sync::Arc<T> {
    fn convert_to_image(&self, pdf: &[u8], page: usize) -> Result<ConvertedImage, PipelineError> {
        (**self).convert_to_image(pdf, page)
    }

    fn page_count(&self, pdf: &[u8]) -> Result<usize, PipelineError> {
        (**self).page_count(pdf)
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Mock OCR engine returning fixed text, counting calls.
pub struct MockVisionOcr {
    text: String,
    confidence: f32,
    available: bool,
    calls: AtomicUsize,
}

impl MockVisionOcr {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// An engine whose provider is down.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new("", 0.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionOcr for MockVisionOcr {
    fn extract_text(&self, _image: &[u8], _mime_type: &str) -> Result<OcrOutput, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(PipelineError::OcrUnavailable("mock provider offline".into()));
        }
        Ok(OcrOutput {
            full_text: self.text.clone(),
            blocks: self
                .text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| TextBlock {
                    text: l.to_string(),
                    confidence: self.confidence,
                })
                .collect(),
            confidence: self.confidence,
        })
    }

    fn provider(&self) -> &str {
        "mock_ocr"
    }
}

/// Mock PDF converter: every page becomes a fixed PNG payload.
pub struct MockPdfConverter {
    pages: usize,
    fail: bool,
}

impl MockPdfConverter {
    pub fn new(pages: usize) -> Self {
        Self { pages, fail: false }
    }

    pub fn failing() -> Self {
        Self { pages: 0, fail: true }
    }
}

impl PdfConverter for MockPdfConverter {
    fn convert_to_image(&self, _pdf: &[u8], page: usize) -> Result<ConvertedImage, PipelineError> {
        if self.fail || page >= self.pages {
            return Err(PipelineError::PdfConversion(format!("cannot render page {page}")));
        }
        Ok(ConvertedImage {
            image: b"\x89PNG mock".to_vec(),
            mime_type: "image/png".to_string(),
        })
    }

    fn page_count(&self, _pdf: &[u8]) -> Result<usize, PipelineError> {
        if self.fail {
            return Err(PipelineError::PdfConversion("unreadable PDF".into()));
        }
        Ok(self.pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ocr_counts_calls_and_splits_blocks() {
        let ocr = MockVisionOcr::new("LINE ONE\n\nLINE TWO", 0.9);
        let out = ocr.extract_text(b"img", "image/png").unwrap();
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(ocr.calls(), 1);
    }

    #[test]
    fn unavailable_ocr_errors() {
        let ocr = MockVisionOcr::unavailable();
        assert!(matches!(
            ocr.extract_text(b"img", "image/png"),
            Err(PipelineError::OcrUnavailable(_))
        ));
    }

    #[test]
    fn pdf_converter_bounds_pages() {
        let pdf = MockPdfConverter::new(1);
        assert_eq!(pdf.page_count(b"%PDF").unwrap(), 1);
        assert!(pdf.convert_to_image(b"%PDF", 0).is_ok());
        assert!(pdf.convert_to_image(b"%PDF", 1).is_err());
    }

    #[test]
    fn traits_are_object_safe() {
        fn _assert_ocr(_: &dyn VisionOcr) {}
        fn _assert_pdf(_: &dyn PdfConverter) {}
    }
}

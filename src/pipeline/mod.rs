pub mod types;
pub mod ocr;
pub mod extraction;
pub mod structuring;
pub mod cache;
pub mod merge;
pub mod processor;

pub use types::*;
pub use ocr::*;
pub use cache::{CacheError, ExtractionCache};
pub use merge::{merge_outputs, overall_confidence};
pub use processor::ExtractionPipeline;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("OCR provider unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("PDF conversion failed: {0}")]
    PdfConversion(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

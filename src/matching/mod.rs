//! Fuzzy comparators for names, dates, numbers and free text.
//!
//! Tolerant of OCR noise: accents, titles, name order and off-by-one dates
//! are absorbed here so the sync and validation layers see a single
//! similarity score per field.

pub mod normalize;
pub mod similarity;
pub mod matcher;

pub use normalize::*;
pub use similarity::*;
pub use matcher::*;

use crate::models::{FieldMap, ValidationCheck};

use super::structuring::StructuredOutput;

const OCR_WEIGHT: f32 = 0.4;
const FIELD_WEIGHT: f32 = 0.3;
const VALIDATION_WEIGHT: f32 = 0.3;
/// Field count at which the field component saturates.
const FIELD_SATURATION: f32 = 10.0;

/// Merge extractor output with an optional AI proposal. An AI field is only
/// accepted where the extractor left the field absent or empty; the two
/// validation lists are concatenated, extractor checks first.
pub fn merge_outputs(
    mut fields: FieldMap,
    mut validations: Vec<ValidationCheck>,
    ai: Option<&StructuredOutput>,
) -> (FieldMap, Vec<ValidationCheck>) {
    let Some(ai) = ai else {
        return (fields, validations);
    };

    for (name, field) in &ai.fields {
        let free = fields.get(name).map_or(true, |existing| existing.is_empty());
        if free && !field.is_empty() {
            fields.insert(name.clone(), field.clone());
        }
    }
    validations.extend(ai.validations.iter().cloned());

    (fields, validations)
}

/// `0.4·ocr + 0.3·min(1, fields/10) + 0.3·(passed/total)`, rounded to three
/// decimals. The validation component is 0 when there are no checks.
pub fn overall_confidence(ocr_confidence: f32, field_count: usize, validations: &[ValidationCheck]) -> f32 {
    let field_part = (field_count as f32 / FIELD_SATURATION).min(1.0);
    let validation_part = if validations.is_empty() {
        0.0
    } else {
        validations.iter().filter(|v| v.passed).count() as f32 / validations.len() as f32
    };
    let raw = OCR_WEIGHT * ocr_confidence.clamp(0.0, 1.0)
        + FIELD_WEIGHT * field_part
        + VALIDATION_WEIGHT * validation_part;
    (raw * 1000.0).round() / 1000.0
}

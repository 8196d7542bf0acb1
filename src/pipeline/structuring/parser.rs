use serde::Deserialize;
use serde_json::{Map, Value};

use super::StructuringError;
use crate::models::{is_empty_value, ExtractedField, FieldMap, FieldSource, ValidationCheck};

/// Confidence assigned to every model-proposed field.
pub const AI_FIELD_CONFIDENCE: f32 = 0.7;

/// Parse the model response into AI-sourced fields and validation checks.
pub fn parse_structuring_response(
    response: &str,
) -> Result<(FieldMap, Vec<ValidationCheck>), StructuringError> {
    let json_str = extract_json_block(response)?;

    #[derive(Deserialize)]
    struct RawResponse {
        extracted: Option<Value>,
        validations: Option<Value>,
    }

    let raw: RawResponse = serde_json::from_str(json_str)
        .map_err(|e| StructuringError::JsonParsing(e.to_string()))?;

    let extracted = match raw.extracted {
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(StructuringError::ResponseParsing(
                "\"extracted\" is not an object".into(),
            ))
        }
        None => {
            return Err(StructuringError::MalformedResponse(
                "No \"extracted\" object".into(),
            ))
        }
    };

    let mut fields = FieldMap::new();
    flatten_into(&extracted, &mut fields);
    let validations = raw.validations.map(|v| parse_validations(&v)).unwrap_or_default();

    Ok((fields, validations))
}

/// Locate the JSON object in a model response: a ```json fence, else any
/// fence, else the outermost braces.
pub fn extract_json_block(response: &str) -> Result<&str, StructuringError> {
    for fence in ["```json", "```"] {
        if let Some(start) = response.find(fence) {
            let content_start = start + fence.len();
            let end = response[content_start..]
                .find("```")
                .ok_or_else(|| StructuringError::MalformedResponse("Unclosed JSON block".into()))?;
            return Ok(response[content_start..content_start + end].trim());
        }
    }

    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&response[start..=end]),
        _ => Err(StructuringError::MalformedResponse("No JSON object found".into())),
    }
}

/// Nested objects are flattened to their leaf keys, one level at a time: a
/// shallower key beats a nested one, then the first occurrence wins. Arrays
/// and empty values are skipped.
fn flatten_into(object: &Map<String, Value>, fields: &mut FieldMap) {
    let mut level = vec![object];
    while !level.is_empty() {
        let mut nested = Vec::new();
        for map in level {
            for (key, value) in map {
                match value {
                    Value::Object(inner) => nested.push(inner),
                    Value::Array(_) => {}
                    v if is_empty_value(v) => {}
                    v => {
                        fields.entry(key.clone()).or_insert_with(|| {
                            ExtractedField::new(key, v.clone(), AI_FIELD_CONFIDENCE, FieldSource::Ai)
                        });
                    }
                }
            }
        }
        level = nested;
    }
}

/// Accepts `{"name": bool}` objects or `[{"name": .., "passed": bool}]`
/// arrays. Non-boolean entries are ignored.
fn parse_validations(value: &Value) -> Vec<ValidationCheck> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(name, v)| v.as_bool().map(|passed| ValidationCheck::new(name, passed, FieldSource::Ai)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                let passed = item.get("passed")?.as_bool()?;
                Some(ValidationCheck::new(name, passed, FieldSource::Ai))
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> String {
        r#"Here is the extraction:

```json
{
  "extracted": {
    "guest_name": "Abebe Kebede",
    "hotel_city": "Abidjan",
    "nights": 7,
    "room_type": null,
    "stay": {"check_in_date": "2025-06-01", "guest_name": "Ignored"},
    "other_guests": ["A", "B"]
  },
  "validations": {
    "location_is_cote_divoire": true,
    "dates_coherent": false,
    "discrepancies": []
  }
}
```
"#
        .to_string()
    }

    #[test]
    fn top_level_key_beats_nested_duplicate() {
        let response = r#"{"extracted": {
            "a_details": {"guest_name": "NESTED", "deep": {"hotel_city": "Bouake"}},
            "guest_name": "TOP LEVEL",
            "z_address": {"hotel_city": "Abidjan"}
        }}"#;
        let (fields, _) = parse_structuring_response(response).unwrap();
        assert_eq!(fields["guest_name"].value, Value::String("TOP LEVEL".into()));
        assert_eq!(fields["hotel_city"].value, Value::String("Abidjan".into()));
    }

    #[test]
    fn parses_fields_and_validations() {
        let (fields, validations) = parse_structuring_response(&sample_response()).unwrap();
        assert_eq!(fields["guest_name"].value, Value::String("Abebe Kebede".into()));
        assert_eq!(fields["nights"].value, Value::from(7));
        assert_eq!(fields["check_in_date"].value, Value::String("2025-06-01".into()));
        assert!(!fields.contains_key("room_type"));
        assert!(!fields.contains_key("other_guests"));
        assert!(fields.values().all(|f| f.source == FieldSource::Ai));

        assert_eq!(validations.len(), 2);
        let coherent = validations.iter().find(|c| c.name == "dates_coherent").unwrap();
        assert!(!coherent.passed);
        assert_eq!(coherent.source, FieldSource::Ai);
    }

    #[test]
    fn accepts_bare_json_without_fence() {
        let response = r#"Sure. {"extracted": {"amount": 50000}, "validations": []} Done."#;
        let (fields, validations) = parse_structuring_response(response).unwrap();
        assert_eq!(fields["amount"].value, Value::from(50000));
        assert!(validations.is_empty());
    }

    #[test]
    fn validations_as_array() {
        let response = r#"{"extracted": {}, "validations": [{"name": "payee_is_tresor_ci", "passed": true}]}"#;
        let (_, validations) = parse_structuring_response(response).unwrap();
        assert_eq!(validations.len(), 1);
        assert!(validations[0].passed);
    }

    #[test]
    fn no_json_is_malformed() {
        let err = parse_structuring_response("I cannot read this document.").unwrap_err();
        assert!(matches!(err, StructuringError::MalformedResponse(_)));
    }

    #[test]
    fn unclosed_fence_is_malformed() {
        let err = extract_json_block("```json\n{\"extracted\": {}}").unwrap_err();
        assert!(matches!(err, StructuringError::MalformedResponse(_)));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = parse_structuring_response("```json\n{extracted: oops}\n```").unwrap_err();
        assert!(matches!(err, StructuringError::JsonParsing(_)));
    }

    #[test]
    fn missing_extracted_is_malformed() {
        let err = parse_structuring_response(r#"{"validations": {}}"#).unwrap_err();
        assert!(matches!(err, StructuringError::MalformedResponse(_)));
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::FieldSource;

/// One extracted value with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub name: String,
    pub value: Value,
    /// 0.0-1.0
    pub confidence: f32,
    pub source: FieldSource,
}

impl ExtractedField {
    pub fn new(name: &str, value: impl Into<Value>, confidence: f32, source: FieldSource) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn is_empty(&self) -> bool {
        is_empty_value(&self.value)
    }
}

/// Fields keyed by name. Ordered so serialized results are stable.
pub type FieldMap = BTreeMap<String, ExtractedField>;

/// A named validation predicate and whether it held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub source: FieldSource,
}

impl ValidationCheck {
    pub fn new(name: &str, passed: bool, source: FieldSource) -> Self {
        Self {
            name: name.to_string(),
            passed,
            source,
        }
    }
}

/// Null, blank strings, and empty arrays/objects count as "no value".
/// `false` and `0` are real values.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Flatten a field map into a JSON object of `name -> value`.
pub fn fields_to_object(fields: &FieldMap) -> Value {
    let map: serde_json::Map<String, Value> = fields
        .values()
        .map(|f| (f.name.clone(), f.value.clone()))
        .collect();
    Value::Object(map)
}

/// Look up the first non-empty value among `keys`. Keys may be dotted
/// paths into nested objects (`"dates.from"`).
pub fn lookup<'a>(doc: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        let mut current = doc;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        (!is_empty_value(current)).then_some(current)
    })
}

/// String view of the first non-empty value among `keys`.
/// Numbers are rendered; booleans, arrays and objects are skipped.
pub fn lookup_text(doc: &Value, keys: &[&str]) -> Option<String> {
    match lookup(doc, keys)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Boolean view: JSON booleans plus the usual yes/no spellings.
pub fn lookup_bool(doc: &Value, keys: &[&str]) -> Option<bool> {
    match lookup(doc, keys)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "oui" | "1" | "y" => Some(true),
            "false" | "no" | "non" | "0" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("  ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!("X")));
    }

    #[test]
    fn lookup_prefers_first_non_empty_key() {
        let doc = json!({"check_in": "", "check_in_date": "2025-06-01"});
        assert_eq!(
            lookup_text(&doc, &["check_in", "check_in_date"]).as_deref(),
            Some("2025-06-01")
        );
    }

    #[test]
    fn lookup_follows_dotted_paths() {
        let doc = json!({"dates": {"from": "2025-06-01"}});
        assert_eq!(lookup_text(&doc, &["dates.from"]).as_deref(), Some("2025-06-01"));
        assert_eq!(lookup_text(&doc, &["dates.to"]), None);
    }

    #[test]
    fn lookup_bool_reads_spellings() {
        let doc = json!({"a": "oui", "b": false, "c": 1, "d": "maybe"});
        assert_eq!(lookup_bool(&doc, &["a"]), Some(true));
        assert_eq!(lookup_bool(&doc, &["b"]), Some(false));
        assert_eq!(lookup_bool(&doc, &["c"]), Some(true));
        assert_eq!(lookup_bool(&doc, &["d"]), None);
    }

    #[test]
    fn confidence_is_clamped() {
        let f = ExtractedField::new("x", "y", 1.7, FieldSource::Extractor);
        assert_eq!(f.confidence, 1.0);
    }
}

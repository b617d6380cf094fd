//! Strict key-set and value-type contracts for model output.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Expected JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// Array of any values; items are coerced to text by the consumer
    List,
    Number,
    Object,
    /// Any value, including `null`
    Any,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::List => value.is_array(),
            Self::Number => value.is_number(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::List => "list",
            Self::Number => "number",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

/// An exact key set with a type per key.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [(&'static str, FieldType)],
}

/// Why an object does not satisfy a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    KeyMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    WrongType {
        key: String,
        expected: &'static str,
    },
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyMismatch { expected, actual } => {
                write!(f, "keys {actual:?} do not match required {expected:?}")
            }
            Self::WrongType { key, expected } => write!(f, "'{key}' must be a {expected}"),
        }
    }
}

impl Schema {
    #[must_use]
    pub const fn new(fields: &'static [(&'static str, FieldType)]) -> Self {
        Self { fields }
    }

    /// Required keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.fields.iter().map(|(k, _)| (*k).to_string()).collect();
        keys.sort();
        keys
    }

    /// Check that `obj` has exactly the schema's keys and each value has the
    /// declared type.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self, obj: &Map<String, Value>) -> Result<(), SchemaViolation> {
        let expected = self.keys();
        let mut actual: Vec<String> = obj.keys().cloned().collect();
        actual.sort();
        if actual != expected {
            return Err(SchemaViolation::KeyMismatch { expected, actual });
        }

        for (key, ty) in self.fields {
            if !obj.get(*key).is_some_and(|v| ty.accepts(v)) {
                return Err(SchemaViolation::WrongType {
                    key: (*key).to_string(),
                    expected: ty.name(),
                });
            }
        }
        Ok(())
    }
}

/// A typed value the model is asked to produce.
pub trait StructuredOutput: DeserializeOwned + Send {
    fn schema() -> Schema;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: Schema = Schema::new(&[("name", FieldType::String), ("tags", FieldType::List)]);

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_accepts_exact_keys() {
        assert!(SCHEMA.validate(&obj(json!({"name": "x", "tags": []}))).is_ok());
    }

    #[test]
    fn test_rejects_extra_and_missing_keys() {
        let extra = SCHEMA.validate(&obj(json!({"name": "x", "tags": [], "more": 1})));
        assert!(matches!(extra, Err(SchemaViolation::KeyMismatch { .. })));

        let missing = SCHEMA.validate(&obj(json!({"name": "x"})));
        match missing {
            Err(SchemaViolation::KeyMismatch { expected, actual }) => {
                assert_eq!(expected, vec!["name", "tags"]);
                assert_eq!(actual, vec!["name"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejects_wrong_types() {
        let err = SCHEMA
            .validate(&obj(json!({"name": "x", "tags": "a,b"})))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::WrongType {
                key: "tags".to_string(),
                expected: "list"
            }
        );
        assert_eq!(err.to_string(), "'tags' must be a list");
    }
}

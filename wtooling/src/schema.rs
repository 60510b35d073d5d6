//! Tagged-schema interpreter for tool argument validation.
//!
//! Remote tools declare their inputs as JSON schema. Rather than reflecting
//! over the schema at call time, it is interpreted once into a small tagged
//! tree; unknown or unsupported schema constructs degrade to [`ParamSchema::Any`]
//! so a partially understood tool still remains callable.
//!
//! ```rust
//! use serde_json::json;
//! use wtooling::ParamSchema;
//!
//! let schema = ParamSchema::interpret(&json!({
//!     "type": "object",
//!     "properties": {"query": {"type": "string"}},
//!     "required": ["query"]
//! }));
//!
//! assert!(schema.validate(&json!({"query": "running shoes"})).is_ok());
//! assert!(schema.validate(&json!({"query": 7})).is_err());
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::ToolError;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamSchema {
    Object {
        properties: BTreeMap<String, ParamSchema>,
        required: Vec<String>,
    },
    String,
    Number,
    Boolean,
    Array(Box<ParamSchema>),
    Any,
}

impl ParamSchema {
    /// Builds a tagged schema from a raw JSON-schema value, leniently.
    pub fn interpret(schema: &Value) -> Self {
        let Some(schema) = schema.as_object() else {
            return Self::Any;
        };

        match schema.get("type").and_then(Value::as_str) {
            Some("object") => {
                let properties = schema
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|properties| {
                        properties
                            .iter()
                            .map(|(key, value)| (key.clone(), Self::interpret(value)))
                            .collect()
                    })
                    .unwrap_or_default();

                let required = schema
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|required| {
                        required
                            .iter()
                            .filter_map(Value::as_str)
                            .map(ToString::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                Self::Object {
                    properties,
                    required,
                }
            }
            Some("string") => Self::String,
            Some("number") | Some("integer") => Self::Number,
            Some("boolean") => Self::Boolean,
            Some("array") => Self::Array(Box::new(
                schema.get("items").map(Self::interpret).unwrap_or(Self::Any),
            )),
            _ => Self::Any,
        }
    }

    /// Checks a decoded argument value against the schema. Unknown object
    /// keys are permitted; missing required keys and type mismatches fail.
    pub fn validate(&self, value: &Value) -> Result<(), ToolError> {
        self.validate_at(value, "arguments")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), ToolError> {
        match self {
            Self::Any => Ok(()),
            Self::String => match value.is_string() {
                true => Ok(()),
                false => Err(mismatch(path, "string", value)),
            },
            Self::Number => match value.is_number() {
                true => Ok(()),
                false => Err(mismatch(path, "number", value)),
            },
            Self::Boolean => match value.is_boolean() {
                true => Ok(()),
                false => Err(mismatch(path, "boolean", value)),
            },
            Self::Array(items) => {
                let entries = value
                    .as_array()
                    .ok_or_else(|| mismatch(path, "array", value))?;

                for (position, entry) in entries.iter().enumerate() {
                    items.validate_at(entry, &format!("{path}[{position}]"))?;
                }

                Ok(())
            }
            Self::Object {
                properties,
                required,
            } => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| mismatch(path, "object", value))?;

                for key in required {
                    if !entries.contains_key(key) {
                        return Err(ToolError::invalid_arguments(format!(
                            "{path}: missing required key '{key}'"
                        )));
                    }
                }

                for (key, entry) in entries {
                    if let Some(schema) = properties.get(key) {
                        schema.validate_at(entry, &format!("{path}.{key}"))?;
                    }
                }

                Ok(())
            }
        }
    }
}

fn mismatch(path: &str, expected: &str, value: &Value) -> ToolError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };

    ToolError::invalid_arguments(format!("{path}: expected {expected}, found {found}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ToolErrorKind;

    #[test]
    fn interpret_builds_object_schema_with_required_keys() {
        let schema = ParamSchema::interpret(&json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "limit": {"type": "integer"}
            },
            "required": ["query"]
        }));

        assert!(schema.validate(&json!({"query": "shoes"})).is_ok());
        assert!(schema.validate(&json!({"query": "shoes", "limit": 5})).is_ok());

        let missing = schema.validate(&json!({"limit": 5})).unwrap_err();
        assert_eq!(missing.kind, ToolErrorKind::InvalidArguments);
        assert!(missing.message.contains("query"));
    }

    #[test]
    fn unknown_constructs_degrade_to_any() {
        let schema = ParamSchema::interpret(&json!({"oneOf": [{"type": "string"}]}));
        assert_eq!(schema, ParamSchema::Any);
        assert!(schema.validate(&json!(42)).is_ok());
    }

    #[test]
    fn array_items_are_validated_with_positions() {
        let schema = ParamSchema::interpret(&json!({
            "type": "array",
            "items": {"type": "number"}
        }));

        assert!(schema.validate(&json!([1, 2.5])).is_ok());

        let error = schema.validate(&json!([1, "two"])).unwrap_err();
        assert!(error.message.contains("[1]"));
    }

    #[test]
    fn extra_object_keys_are_permitted() {
        let schema = ParamSchema::interpret(&json!({
            "type": "object",
            "properties": {"query": {"type": "string"}}
        }));

        assert!(schema.validate(&json!({"query": "x", "extra": true})).is_ok());
    }
}

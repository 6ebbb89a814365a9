//! Structural response contract.
//!
//! A [`Schema`] is sent to Gemini as `responseSchema` and is also checked
//! locally against whatever comes back, so a reply is never trusted to have
//! the promised shape.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Schema {
    Object {
        properties: BTreeMap<String, Schema>,
        required: Vec<String>,
    },
    Array {
        items: Box<Schema>,
        #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
    },
    String {
        #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
        allowed: Vec<String>,
    },
}

/// First place where a value departs from its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::String {
            allowed: Vec::new(),
        }
    }

    pub fn one_of<S: AsRef<str>>(values: &[S]) -> Self {
        Schema::String {
            allowed: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            min_items: None,
        }
    }

    pub fn array_of_at_least(items: Schema, min_items: usize) -> Self {
        Schema::Array {
            items: Box::new(items),
            min_items: Some(min_items),
        }
    }

    /// Object whose listed properties are all required.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let properties: BTreeMap<String, Schema> = properties
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        let required = properties.keys().cloned().collect();
        Schema::Object {
            properties,
            required,
        }
    }

    pub fn validate(&self, value: &Value) -> Result<(), Violation> {
        self.validate_at("$", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<(), Violation> {
        let violation = |reason: String| Violation {
            path: path.to_string(),
            reason,
        };

        match self {
            Schema::Object {
                properties,
                required,
            } => {
                let map = value
                    .as_object()
                    .ok_or_else(|| violation(format!("expected object, found {}", kind_of(value))))?;

                for name in required {
                    if map.get(name).map_or(true, Value::is_null) {
                        return Err(Violation {
                            path: format!("{}.{}", path, name),
                            reason: "required field missing".to_string(),
                        });
                    }
                }

                for (name, schema) in properties {
                    if let Some(field) = map.get(name).filter(|v| !v.is_null()) {
                        schema.validate_at(&format!("{}.{}", path, name), field)?;
                    }
                }
                Ok(())
            }
            Schema::Array { items, min_items } => {
                let elements = value
                    .as_array()
                    .ok_or_else(|| violation(format!("expected array, found {}", kind_of(value))))?;

                if let Some(min) = min_items {
                    if elements.len() < *min {
                        return Err(violation(format!(
                            "expected at least {} items, found {}",
                            min,
                            elements.len()
                        )));
                    }
                }

                for (index, element) in elements.iter().enumerate() {
                    items.validate_at(&format!("{}[{}]", path, index), element)?;
                }
                Ok(())
            }
            Schema::String { allowed } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| violation(format!("expected string, found {}", kind_of(value))))?;

                if !allowed.is_empty() && !allowed.iter().any(|a| a == text) {
                    return Err(violation(format!(
                        "'{}' is not one of: {}",
                        text,
                        allowed.join(", ")
                    )));
                }
                Ok(())
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

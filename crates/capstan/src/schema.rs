//! Schema descriptors for capability arguments.
//!
//! A [`Schema`] is an ordered list of [`Field`]s. It is pure data: the
//! validator in [`crate::validate`] walks it, and [`Schema::to_json_schema`]
//! renders it for `tools/list`.

use std::collections::HashSet;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::error::ConfigError;

/// The shape of one field value.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String {
        choices: Option<Vec<String>>,
        pattern: Option<Regex>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        integer: bool,
    },
    Boolean,
    /// Array whose items all have the given kind.
    Array(Box<FieldKind>),
    /// Nested object with its own properties.
    Object(Schema),
}

impl FieldKind {
    pub fn string() -> Self {
        FieldKind::String {
            choices: None,
            pattern: None,
        }
    }

    pub fn number() -> Self {
        FieldKind::Number {
            minimum: None,
            maximum: None,
            integer: false,
        }
    }

    pub fn integer() -> Self {
        FieldKind::Number {
            minimum: None,
            maximum: None,
            integer: true,
        }
    }

    /// Name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String { .. } => "string",
            FieldKind::Number { integer: true, .. } => "integer",
            FieldKind::Number { .. } => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array(_) => "array",
            FieldKind::Object(_) => "object",
        }
    }

    fn to_json_schema(&self) -> Value {
        match self {
            FieldKind::String { choices, pattern } => {
                let mut out = json!({ "type": "string" });
                if let Some(choices) = choices {
                    out["enum"] = json!(choices);
                }
                if let Some(pattern) = pattern {
                    out["pattern"] = json!(pattern.as_str());
                }
                out
            }
            FieldKind::Number {
                minimum,
                maximum,
                integer,
            } => {
                let mut out = json!({ "type": if *integer { "integer" } else { "number" } });
                if let Some(min) = minimum {
                    out["minimum"] = json!(min);
                }
                if let Some(max) = maximum {
                    out["maximum"] = json!(max);
                }
                out
            }
            FieldKind::Boolean => json!({ "type": "boolean" }),
            FieldKind::Array(items) => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            FieldKind::Object(schema) => schema.to_json_schema(),
        }
    }

    fn check(&self, owner: &str) -> Result<(), ConfigError> {
        match self {
            FieldKind::Array(items) => items.check(owner),
            FieldKind::Object(schema) => schema.check(owner),
            _ => Ok(()),
        }
    }
}

/// One named argument.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::string())
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::number())
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::integer())
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn array(name: impl Into<String>, items: FieldKind) -> Self {
        Self::new(name, FieldKind::Array(Box::new(items)))
    }

    pub fn object(name: impl Into<String>, properties: Schema) -> Self {
        Self::new(name, FieldKind::Object(properties))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restrict a string field to a fixed set. No effect on other kinds.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let FieldKind::String { choices, .. } = &mut self.kind {
            *choices = Some(values.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Require a string field to match a regular expression.
    pub fn pattern(mut self, re: &str) -> Result<Self, ConfigError> {
        let compiled = Regex::new(re).map_err(|source| ConfigError::InvalidPattern {
            field: self.name.clone(),
            source,
        })?;
        if let FieldKind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(compiled);
        }
        Ok(self)
    }

    pub fn minimum(mut self, value: f64) -> Self {
        if let FieldKind::Number { minimum, .. } = &mut self.kind {
            *minimum = Some(value);
        }
        self
    }

    pub fn maximum(mut self, value: f64) -> Self {
        if let FieldKind::Number { maximum, .. } = &mut self.kind {
            *maximum = Some(value);
        }
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut out = self.kind.to_json_schema();
        if let Some(description) = &self.description {
            out["description"] = json!(description);
        }
        if let Some(default) = &self.default {
            out["default"] = default.clone();
        }
        out
    }
}

/// An object-level argument shape.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    strict: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Reject arguments that are not declared.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check structural invariants. Called when the owning capability is registered.
    pub fn check(&self, owner: &str) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    owner: owner.to_string(),
                    field: field.name.clone(),
                });
            }
            field.kind.check(owner)?;
        }
        Ok(())
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut out = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            out["required"] = json!(required);
        }
        if self.strict {
            out["additionalProperties"] = json!(false);
        }
        out
    }
}

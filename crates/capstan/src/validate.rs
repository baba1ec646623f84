//! Two-phase argument handling: validate untyped input, then bind it.
//!
//! Phase 1 ([`validate`]) checks a raw JSON mapping against a [`Schema`] and
//! yields [`Arguments`] with declared defaults filled in. Phase 2
//! ([`Arguments::bind`]) deserializes the validated bundle into a typed struct.
//!
//! Tools use the strict mode below: a string is never parsed as a number and
//! the first failure short-circuits. Prompts use [`bind_prompt_arguments`],
//! the lenient mode, where every value is carried as a string.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{HandlerError, ValidationError};
use crate::schema::{FieldKind, Schema};
use crate::types::PromptArgument;

/// Field path used when the argument container itself is wrong.
pub const ROOT_FIELD: &str = "arguments";

/// Arguments that passed schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Bind into a typed struct.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ValidationError::new(ROOT_FIELD, e.to_string()))
    }
}

/// Validate raw caller arguments against a schema. Fail-fast.
pub fn validate(schema: &Schema, raw: Option<&Value>) -> Result<Arguments, ValidationError> {
    let empty = Map::new();
    let map = match raw {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ValidationError::new(
                ROOT_FIELD,
                format!("expected an object, got {}", json_type_name(other)),
            ))
        }
    };

    validate_object(schema, map, None).map(Arguments)
}

fn validate_object(
    schema: &Schema,
    map: &Map<String, Value>,
    parent: Option<&str>,
) -> Result<Map<String, Value>, ValidationError> {
    let path_of = |name: &str| match parent {
        Some(p) => format!("{p}.{name}"),
        None => name.to_string(),
    };

    if schema.is_strict() {
        if let Some(unknown) = map.keys().find(|k| schema.get(k).is_none()) {
            return Err(ValidationError::new(path_of(unknown), "unknown field"));
        }
    }

    // Undeclared fields pass through untouched.
    let mut out = map.clone();

    for field in schema.fields() {
        let path = path_of(&field.name);
        match map.get(&field.name).filter(|v| !v.is_null()) {
            Some(value) => {
                let checked = validate_value(&field.kind, value, &path)?;
                out.insert(field.name.clone(), checked);
            }
            None => {
                out.remove(&field.name);
                if let Some(default) = &field.default {
                    out.insert(field.name.clone(), default.clone());
                } else if field.required {
                    return Err(ValidationError::missing(path));
                }
            }
        }
    }

    Ok(out)
}

fn validate_value(kind: &FieldKind, value: &Value, path: &str) -> Result<Value, ValidationError> {
    match kind {
        FieldKind::String { choices, pattern } => {
            let s = value.as_str().ok_or_else(|| type_mismatch(kind, value, path))?;
            if let Some(choices) = choices {
                if !choices.iter().any(|c| c == s) {
                    return Err(ValidationError::new(
                        path,
                        format!("must be one of: {}", choices.join(", ")),
                    ));
                }
            }
            if let Some(re) = pattern {
                if !re.is_match(s) {
                    return Err(ValidationError::new(
                        path,
                        format!("does not match pattern {}", re.as_str()),
                    ));
                }
            }
            Ok(value.clone())
        }
        FieldKind::Number {
            minimum,
            maximum,
            integer,
        } => {
            let n = value.as_f64().ok_or_else(|| type_mismatch(kind, value, path))?;
            let canonical = if *integer {
                Value::from(as_integer(kind, value, n, path)?)
            } else {
                value.clone()
            };
            if let Some(min) = minimum {
                if n < *min {
                    return Err(ValidationError::new(path, format!("is below minimum {min}")));
                }
            }
            if let Some(max) = maximum {
                if n > *max {
                    return Err(ValidationError::new(path, format!("exceeds maximum {max}")));
                }
            }
            Ok(canonical)
        }
        FieldKind::Boolean => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err(type_mismatch(kind, value, path))
            }
        }
        FieldKind::Array(items) => {
            let elements = value.as_array().ok_or_else(|| type_mismatch(kind, value, path))?;
            elements
                .iter()
                .enumerate()
                .map(|(i, item)| validate_value(items, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldKind::Object(schema) => {
            let map = value.as_object().ok_or_else(|| type_mismatch(kind, value, path))?;
            validate_object(schema, map, Some(path)).map(Value::Object)
        }
    }
}

/// Integer fields always come out as an `i64`. Integral floats such as `2.0`
/// are rewritten; anything outside the `i64` range is rejected.
fn as_integer(kind: &FieldKind, value: &Value, n: f64, path: &str) -> Result<i64, ValidationError> {
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    if value.is_u64() {
        return Err(out_of_range(path));
    }
    if n.fract() != 0.0 {
        return Err(type_mismatch(kind, value, path));
    }
    // 2^63 is exactly representable; every integral f64 below it fits.
    if n < -(I64_BOUND) || n >= I64_BOUND {
        return Err(out_of_range(path));
    }
    Ok(n as i64)
}

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn out_of_range(path: &str) -> ValidationError {
    ValidationError::new(path, "is out of range for a 64-bit integer")
}

fn type_mismatch(kind: &FieldKind, value: &Value, path: &str) -> ValidationError {
    ValidationError::new(
        path,
        format!("expected {}, got {}", kind.type_name(), json_type_name(value)),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Prompt arguments after lenient binding: every value is a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptArguments(HashMap<String, String>);

impl PromptArguments {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The value, or `default` when absent or empty.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.get(name) {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }

    /// A non-empty value or a descriptive handler error.
    pub fn require(&self, name: &str) -> Result<&str, HandlerError> {
        match self.get(name) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(HandlerError::failed(format!("{name} is required"))),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PromptArguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Bind prompt arguments leniently and check declared-required ones are present.
pub fn bind_prompt_arguments(
    specs: &[PromptArgument],
    raw: Option<&Value>,
) -> Result<PromptArguments, ValidationError> {
    let mut out = HashMap::new();
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (key, value) in map {
                let text = match value {
                    Value::Null => continue,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.insert(key.clone(), text);
            }
        }
        Some(other) => {
            return Err(ValidationError::new(
                ROOT_FIELD,
                format!("expected an object, got {}", json_type_name(other)),
            ))
        }
    }

    if let Some(missing) = specs
        .iter()
        .find(|spec| spec.required && !out.contains_key(&spec.name))
    {
        return Err(ValidationError::missing(missing.name.clone()));
    }

    Ok(PromptArguments(out))
}

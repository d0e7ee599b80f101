//! Declarative document schemas and the validator that enforces them.
//!
//! A [`Schema`] is a static list of [`FieldSpec`]s. Each spec names a field,
//! its expected [`FieldType`], whether it may be absent ([`Presence`]), and
//! any extra [`Constraint`]s (score ranges, e-mail syntax, ...).
//!
//! [`check`] validates a raw JSON field map against a schema and returns the
//! normalized map: defaults filled in, optional fields present as `null`,
//! unknown fields dropped. It reports **every** violated field at once.
//!
//! [`validate`] is the typed entry point: it runs [`check`] for a
//! [`Document`] type and yields a [`Validated<T>`], the only value the
//! document store accepts for insertion.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use startupmate_core::models::ContactMessage;
//! use startupmate_core::schema::validate;
//!
//! let raw = json!({ "name": "Ada", "email": "ada@example.com", "message": "hi" });
//! let msg = validate::<ContactMessage>(raw.as_object().unwrap()).unwrap();
//! assert_eq!(msg.document().email, "ada@example.com");
//!
//! let raw = json!({ "name": "Ada", "email": "not-an-email" });
//! let err = validate::<ContactMessage>(raw.as_object().unwrap()).unwrap_err();
//! assert_eq!(err.violations().len(), 2);
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::validate_email;

/// Pseudo field name used for violations that concern the whole document.
pub const DOCUMENT_FIELD: &str = "<document>";

/// Value type expected for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    /// Ordered sequence whose elements all have the inner type.
    Sequence(&'static FieldType),
    /// String-keyed mapping whose values all have the inner type.
    Mapping(&'static FieldType),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Sequence(inner) => write!(f, "sequence of {}", inner),
            FieldType::Mapping(inner) => write!(f, "mapping of {}", inner),
        }
    }
}

/// Additional constraint checked once a value has the right type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// String must contain something other than whitespace.
    NonEmpty,
    /// Integer must lie in `min..=max`.
    Range { min: i64, max: i64 },
    /// Integer must be `>= min`.
    Minimum(i64),
    /// String must be an e-mail address (see [`is_email`]).
    Email,
}

/// Inclusive 0–100 bound shared by all score fields.
pub const SCORE: Constraint = Constraint::Range { min: 0, max: 100 };

/// Value filled in when a defaulted field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    EmptySequence,
    EmptyMapping,
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            DefaultValue::EmptySequence => Value::Array(Vec::new()),
            DefaultValue::EmptyMapping => Value::Object(Map::new()),
        }
    }
}

/// Whether a field may be absent, and what replaces it when it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// Absent or `null` is accepted and normalized to `null`.
    Optional,
    /// Absent or `null` is replaced by the default.
    Default(DefaultValue),
}

/// Declaration of one field of a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub presence: Presence,
    pub constraints: &'static [Constraint],
}

impl FieldSpec {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            presence: Presence::Required,
            constraints: &[],
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            presence: Presence::Optional,
            constraints: &[],
        }
    }

    pub const fn defaulted(name: &'static str, ty: FieldType, default: DefaultValue) -> Self {
        Self {
            name,
            ty,
            presence: Presence::Default(default),
            constraints: &[],
        }
    }

    pub const fn with(self, constraints: &'static [Constraint]) -> Self {
        Self {
            constraints,
            ..self
        }
    }
}

/// A named document shape, stored in its own collection.
#[derive(Debug)]
pub struct Schema {
    /// Human-readable kind name, e.g. `IdeaAnalysis`.
    pub name: &'static str,
    /// Collection the documents of this kind are stored in.
    pub collection: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A Rust type backed by a declared [`Schema`].
///
/// The serde representation of the type must agree with its schema: any map
/// accepted by [`check`] must deserialize into `Self`.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static Schema;
}

/// One violated field and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validation failure listing every violated field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{schema} failed validation: {}", describe(.violations))]
pub struct ValidationError {
    pub schema: &'static str,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True if any violation concerns `field` (or one of its elements).
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| {
            v.field == field
                || v.field.starts_with(&format!("{}[", field))
                || v.field.starts_with(&format!("{}.", field))
        })
    }
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A document known to satisfy every constraint of its schema.
///
/// Only [`validate`] constructs this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    document: T,
    fields: Map<String, Value>,
}

impl<T> Validated<T> {
    pub fn document(&self) -> &T {
        &self.document
    }

    /// The normalized field map, exactly as it will be persisted.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_inner(self) -> T {
        self.document
    }
}

/// Validates `raw` against `schema`, returning the normalized field map.
pub fn check(
    schema: &Schema,
    raw: &Map<String, Value>,
) -> Result<Map<String, Value>, ValidationError> {
    let mut normalized = Map::new();
    let mut violations = Vec::new();

    for spec in schema.fields {
        match raw.get(spec.name) {
            None | Some(Value::Null) => match spec.presence {
                Presence::Required => {
                    let reason = if raw.contains_key(spec.name) {
                        "must not be null"
                    } else {
                        "field required"
                    };
                    violations.push(Violation::new(spec.name, reason));
                }
                Presence::Optional => {
                    normalized.insert(spec.name.to_string(), Value::Null);
                }
                Presence::Default(default) => {
                    normalized.insert(spec.name.to_string(), default.to_value());
                }
            },
            Some(value) => {
                let before = violations.len();
                check_type(spec.name, spec.ty, value, &mut violations);
                if violations.len() == before {
                    for constraint in spec.constraints {
                        check_constraint(spec.name, *constraint, value, &mut violations);
                    }
                }
                if violations.len() == before {
                    normalized.insert(spec.name.to_string(), value.clone());
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(normalized)
    } else {
        Err(ValidationError {
            schema: schema.name,
            violations,
        })
    }
}

/// Validates `raw` against `T`'s schema and builds the typed document.
pub fn validate<T: Document>(raw: &Map<String, Value>) -> Result<Validated<T>, ValidationError> {
    let schema = T::schema();
    let fields = check(schema, raw)?;
    let document = serde_json::from_value(Value::Object(fields.clone())).map_err(|e| {
        ValidationError {
            schema: schema.name,
            violations: vec![Violation::new(DOCUMENT_FIELD, e.to_string())],
        }
    })?;
    Ok(Validated { document, fields })
}

/// Like [`validate`], for a body that may not even be a JSON object.
pub fn validate_value<T: Document>(raw: &Value) -> Result<Validated<T>, ValidationError> {
    match raw.as_object() {
        Some(map) => validate(map),
        None => Err(ValidationError {
            schema: T::schema().name,
            violations: vec![Violation::new(
                DOCUMENT_FIELD,
                format!("expected an object, got {}", json_type_name(raw)),
            )],
        }),
    }
}

/// E-mail syntax as accepted by `validator`, with at least one `.` in the
/// domain.
pub fn is_email(s: &str) -> bool {
    validate_email(s) && s.rsplit_once('@').is_some_and(|(_, domain)| domain.contains('.'))
}

fn check_type(path: &str, ty: FieldType, value: &Value, out: &mut Vec<Violation>) {
    let type_ok = match ty {
        FieldType::String => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Sequence(inner) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_type(&format!("{}[{}]", path, i), *inner, item, out);
                }
                true
            }
            None => false,
        },
        FieldType::Mapping(inner) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    check_type(&format!("{}.{}", path, key), *inner, item, out);
                }
                true
            }
            None => false,
        },
    };
    if !type_ok {
        out.push(Violation::new(
            path,
            format!("must be of type {}, got {}", ty, json_type_name(value)),
        ));
    }
}

fn check_constraint(path: &str, constraint: Constraint, value: &Value, out: &mut Vec<Violation>) {
    match constraint {
        Constraint::NonEmpty => {
            if value.as_str().is_some_and(|s| s.trim().is_empty()) {
                out.push(Violation::new(path, "must not be empty"));
            }
        }
        Constraint::Range { min, max } => {
            if !value.as_i64().is_some_and(|n| (min..=max).contains(&n)) {
                out.push(Violation::new(
                    path,
                    format!("must be between {} and {}, got {}", min, max, value),
                ));
            }
        }
        Constraint::Minimum(min) => {
            // u64 values above i64::MAX are trivially above any i64 minimum
            let ok = value.as_i64().map_or(value.is_u64(), |n| n >= min);
            if !ok {
                out.push(Violation::new(
                    path,
                    format!("must be at least {}, got {}", min, value),
                ));
            }
        }
        Constraint::Email => {
            if value.as_str().is_some_and(|s| !is_email(s)) {
                out.push(Violation::new(path, "value is not a valid email address"));
            }
        }
    }
}

/// Return a human-readable name for a JSON value's type.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

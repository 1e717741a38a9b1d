//! Struct validation against registered constraints.
//!
//! # Data Flow
//! ```text
//! Input (raw bytes | structured value | none)
//!     → materialize (decode over the target's current values)
//!     → constrain (each declared field, in declaration order)
//!     → classify (every error leaves with exactly one category)
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::validation::error::{classify, BoxError, ValidationError};
use crate::validation::registry::ConstraintRegistry;
use crate::validation::{Constrained, Field};

/// Data to decode into a target before its constraints are checked.
#[derive(Debug, Clone, Default)]
pub enum Input<'a> {
    /// Validate the target's current values as-is.
    #[default]
    None,
    /// Encoded JSON bytes, typically a request body.
    Raw(&'a [u8]),
    /// An already-structured value.
    Structured(Value),
}

impl Input<'_> {
    /// Encode any serializable value into structured input.
    pub fn structured<S: Serialize + ?Sized>(value: &S) -> Result<Self, ValidationError> {
        serde_json::to_value(value)
            .map(Input::Structured)
            .map_err(ValidationError::json_parse)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Input::Raw(bytes)
    }
}

impl<'a> From<Option<&'a [u8]>> for Input<'a> {
    fn from(bytes: Option<&'a [u8]>) -> Self {
        bytes.map_or(Input::None, Input::Raw)
    }
}

impl From<Value> for Input<'_> {
    fn from(value: Value) -> Self {
        Input::Structured(value)
    }
}

/// A single failed field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    #[error("{field}: non zero value required")]
    Required { field: &'static str },

    #[error("{field}: does not validate as {entry}")]
    Invalid { field: &'static str, entry: String },

    #[error("{field}: unknown constraint `{constraint}`")]
    UnknownConstraint { field: &'static str, constraint: String },

    #[error("{field}: malformed rule `{entry}`")]
    MalformedRule { field: &'static str, entry: String },
}

impl FieldViolation {
    pub fn field(&self) -> &'static str {
        match self {
            FieldViolation::Required { field }
            | FieldViolation::Invalid { field, .. }
            | FieldViolation::UnknownConstraint { field, .. }
            | FieldViolation::MalformedRule { field, .. } => field,
        }
    }
}

/// Every violation found in one validation pass, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

/// Validates values against a shared [`ConstraintRegistry`].
///
/// Cheap to clone; safe to use from many handlers at once.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<ConstraintRegistry>,
    required_by_default: bool,
}

impl Validator {
    /// Tagged fields are required unless their rules say `optional`.
    pub fn new(registry: Arc<ConstraintRegistry>) -> Self {
        Self {
            registry,
            required_by_default: true,
        }
    }

    pub fn fields_required_by_default(mut self, required: bool) -> Self {
        self.required_by_default = required;
        self
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    /// Decode `input` into `target`, then check every constrained field.
    ///
    /// A decode failure returns a `json-parse` error and leaves `target`
    /// unchanged; constraint failures return a `validate` error.
    pub fn validate<'a, T>(&self, target: &mut T, input: impl Into<Input<'a>>) -> Result<(), ValidationError>
    where
        T: Constrained + Serialize + DeserializeOwned,
    {
        self.run(target, input.into()).map_err(classify)
    }

    /// Check `target`'s current values without decoding anything.
    pub fn check<T: Constrained + ?Sized>(&self, target: &T) -> Result<(), ValidationError> {
        self.constrain(target).map_err(|violations| classify(Box::new(violations)))
    }

    fn run<T>(&self, target: &mut T, input: Input<'_>) -> Result<(), BoxError>
    where
        T: Constrained + Serialize + DeserializeOwned,
    {
        match input {
            Input::None => {}
            Input::Raw(bytes) => {
                let value: Value = serde_json::from_slice(bytes).map_err(ValidationError::json_parse)?;
                decode_into(target, value)?;
            }
            Input::Structured(value) => decode_into(target, value)?,
        }
        self.constrain(target)?;
        Ok(())
    }

    fn constrain<T: Constrained + ?Sized>(&self, target: &T) -> Result<(), Violations> {
        let violations: Vec<FieldViolation> = target
            .fields()
            .iter()
            .filter_map(|field| self.check_field(field).err())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Violations(violations))
        }
    }

    fn check_field(&self, field: &Field<'_>) -> Result<(), FieldViolation> {
        let Some(rules) = field.rules else {
            return Ok(());
        };

        let mut required = None;
        let mut entries = Vec::new();
        for entry in rules.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry {
                "optional" => required = Some(false),
                "required" => required = Some(true),
                _ => entries.push(entry),
            }
        }

        // An empty rule string behaves like no rules at all.
        if entries.is_empty() && required.is_none() {
            return Ok(());
        }
        let required = required.unwrap_or(self.required_by_default);

        if field.value.is_zero() {
            return if required {
                Err(FieldViolation::Required { field: field.name })
            } else {
                Ok(())
            };
        }

        for entry in entries {
            let name = entry.split('(').next().unwrap_or(entry).trim();
            let Some(constraint) = self.registry.get(name) else {
                return Err(FieldViolation::UnknownConstraint {
                    field: field.name,
                    constraint: name.to_string(),
                });
            };
            match constraint.check(&field.value, entry) {
                Some(true) => {}
                Some(false) => {
                    return Err(FieldViolation::Invalid {
                        field: field.name,
                        entry: entry.to_string(),
                    })
                }
                None => {
                    return Err(FieldViolation::MalformedRule {
                        field: field.name,
                        entry: entry.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

/// Overlay `input` onto the target's current values and decode the result.
///
/// Keys missing from (or null in) the input keep their current value.
fn decode_into<T>(target: &mut T, input: Value) -> Result<(), ValidationError>
where
    T: Serialize + DeserializeOwned,
{
    let merged = match (serde_json::to_value(&*target), input) {
        (_, Value::Null) => return Ok(()),
        (Ok(Value::Object(mut current)), Value::Object(incoming)) => {
            current.extend(incoming.into_iter().filter(|(_, v)| !v.is_null()));
            Value::Object(current)
        }
        (_, incoming) => incoming,
    };
    *target = serde_json::from_value(merged).map_err(ValidationError::json_parse)?;
    Ok(())
}

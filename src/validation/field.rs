//! Field descriptors for validatable types.

use std::fmt;

/// The validator's view of a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl<'a> FieldValue<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `""`, `0` and `false` count as "not provided".
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(n) => *n == 0,
            FieldValue::UInt(n) => *n == 0,
            FieldValue::Bool(b) => !b,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::UInt(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Str(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u16> for FieldValue<'_> {
    fn from(value: u16) -> Self {
        FieldValue::UInt(value.into())
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(value: u32) -> Self {
        FieldValue::UInt(value.into())
    }
}

impl From<u64> for FieldValue<'_> {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One field of a validatable value: its name, rule string and current value.
///
/// Rule strings are comma-separated constraint entries, e.g.
/// `"runelength(1|30)"` or `"email,optional"`. `None` leaves the field
/// unconstrained.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub name: &'static str,
    pub rules: Option<&'static str>,
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, rules: &'static str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            name,
            rules: Some(rules),
            value: value.into(),
        }
    }

    pub fn unconstrained(name: &'static str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            name,
            rules: None,
            value: value.into(),
        }
    }
}

/// A type whose fields carry declarative constraints.
///
/// `fields` lists every field in declaration order; the validator checks
/// them in that order.
pub trait Constrained {
    fn fields(&self) -> Vec<Field<'_>>;
}

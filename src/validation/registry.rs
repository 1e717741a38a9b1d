//! Named constraint table.
//!
//! # Responsibilities
//! - Map constraint names to matching logic
//! - Compile parameter patterns once, at registration
//! - Refuse ambiguous rule sets (duplicate names)
//!
//! # Design Decisions
//! - Regex and custom constraints share one namespace
//! - Built once during startup, read-only afterwards (shared via Arc)
//! - Registration failures are initialization errors, never request errors

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::validation::FieldValue;

/// Predicate for a parameterized constraint; receives the captured params.
pub type ParamPredicate = Arc<dyn Fn(&FieldValue<'_>, &[&str]) -> bool + Send + Sync>;

/// Predicate for a custom constraint.
pub type CustomPredicate = Arc<dyn Fn(&FieldValue<'_>) -> bool + Send + Sync>;

/// Error raised while populating the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("constraint `{0}` is already registered")]
    Duplicate(String),

    #[error("constraint `{name}` has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How a constraint matches a value.
#[derive(Clone)]
pub enum ConstraintKind {
    /// Parameterized: `pattern` is matched against the rule entry
    /// (e.g. `runelength(1|30)`) and its capture groups become params.
    Regex {
        pattern: Regex,
        predicate: ParamPredicate,
    },
    /// Plain predicate, referenced by bare name.
    Custom(CustomPredicate),
}

/// A registered constraint.
#[derive(Clone)]
pub struct ConstraintSpec {
    name: String,
    kind: ConstraintKind,
}

impl ConstraintSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Apply the constraint to `value`.
    ///
    /// `entry` is the full rule entry. Returns `None` when the entry does not
    /// fit the constraint's parameter pattern (a malformed rule).
    pub fn check(&self, value: &FieldValue<'_>, entry: &str) -> Option<bool> {
        match &self.kind {
            ConstraintKind::Regex { pattern, predicate } => {
                let captures = pattern.captures(entry)?;
                let params: Vec<&str> = captures
                    .iter()
                    .skip(1)
                    .map(|m| m.map_or("", |m| m.as_str()))
                    .collect();
                Some(predicate(value, &params))
            }
            ConstraintKind::Custom(predicate) => (entry == self.name).then(|| predicate(value)),
        }
    }
}

impl fmt::Debug for ConstraintSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ConstraintKind::Regex { pattern, .. } => format!("Regex({})", pattern.as_str()),
            ConstraintKind::Custom(_) => "Custom".to_string(),
        };
        f.debug_struct("ConstraintSpec")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// Table of constraints, looked up by exact name.
#[derive(Debug, Default)]
pub struct ConstraintRegistry {
    constraints: HashMap<String, ConstraintSpec>,
}

impl ConstraintRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in constraints.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        register_builtins(&mut registry)?;
        Ok(registry)
    }

    /// Register a parameterized constraint.
    pub fn register_regex<F>(&mut self, name: &str, pattern: &str, predicate: F) -> Result<(), RegistryError>
    where
        F: Fn(&FieldValue<'_>, &[&str]) -> bool + Send + Sync + 'static,
    {
        self.ensure_vacant(name)?;
        let pattern = Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
            name: name.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        self.insert(name, ConstraintKind::Regex {
            pattern,
            predicate: Arc::new(predicate),
        });
        Ok(())
    }

    /// Register a custom constraint.
    pub fn register_custom<F>(&mut self, name: &str, predicate: F) -> Result<(), RegistryError>
    where
        F: Fn(&FieldValue<'_>) -> bool + Send + Sync + 'static,
    {
        self.ensure_vacant(name)?;
        self.insert(name, ConstraintKind::Custom(Arc::new(predicate)));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ConstraintSpec> {
        self.constraints.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constraints.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    fn ensure_vacant(&self, name: &str) -> Result<(), RegistryError> {
        if self.contains(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        Ok(())
    }

    fn insert(&mut self, name: &str, kind: ConstraintKind) {
        tracing::trace!(constraint = name, "Constraint registered");
        self.constraints.insert(
            name.to_string(),
            ConstraintSpec {
                name: name.to_string(),
                kind,
            },
        );
    }
}

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

const DNS_NAME_PATTERN: &str = r"^([a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})(\.[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})*[._]?$";

fn range_pattern(name: &str) -> String {
    format!(r"^{name}\((\d+)\|(\d+)\)$")
}

fn register_builtins(registry: &mut ConstraintRegistry) -> Result<(), RegistryError> {
    registry.register_regex("asciilength", &range_pattern("asciilength"), |value, params| {
        value
            .as_str()
            .filter(|s| s.is_ascii())
            .is_some_and(|s| in_range(s.len(), params))
    })?;
    registry.register_regex("alphanumlength", &range_pattern("alphanumlength"), |value, params| {
        value
            .as_str()
            .filter(|s| s.chars().all(|c| c.is_ascii_alphanumeric()))
            .is_some_and(|s| in_range(s.len(), params))
    })?;
    registry.register_regex("stringlength", &range_pattern("stringlength"), |value, params| {
        value.as_str().is_some_and(|s| in_range(s.len(), params))
    })?;
    registry.register_regex("runelength", &range_pattern("runelength"), |value, params| {
        value.as_str().is_some_and(|s| in_range(s.chars().count(), params))
    })?;

    let email = compile("email", EMAIL_PATTERN)?;
    registry.register_custom("email", move |value| {
        value.as_str().is_some_and(|s| s.len() <= 254 && email.is_match(s))
    })?;

    let dns_name = compile("host", DNS_NAME_PATTERN)?;
    registry.register_custom("host", move |value| {
        value.as_str().is_some_and(|s| {
            s.parse::<IpAddr>().is_ok() || (!s.is_empty() && s.len() <= 255 && dns_name.is_match(s))
        })
    })?;

    registry.register_custom("port", |value| {
        let port = match value {
            FieldValue::Int(n) => Some(*n),
            FieldValue::UInt(n) => i64::try_from(*n).ok(),
            FieldValue::Str(s) => s.parse::<i64>().ok(),
            FieldValue::Bool(_) => None,
        };
        port.is_some_and(|p| (1..=65535).contains(&p))
    })?;

    Ok(())
}

fn compile(name: &str, pattern: &str) -> Result<Regex, RegistryError> {
    Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn in_range(len: usize, params: &[&str]) -> bool {
    let (Some(min), Some(max)) = (param(params, 0), param(params, 1)) else {
        return false;
    };
    (min..=max).contains(&len)
}

fn param(params: &[&str], index: usize) -> Option<usize> {
    params.get(index).and_then(|p| p.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(registry: &ConstraintRegistry, name: &str, entry: &str, value: FieldValue<'_>) -> Option<bool> {
        registry.get(name).and_then(|c| c.check(&value, entry))
    }

    #[test]
    fn test_duplicate_regex_registration_fails() {
        let mut registry = ConstraintRegistry::new();
        registry
            .register_regex("even", r"^even\((\d+)\)$", |_, _| true)
            .unwrap();
        let err = registry
            .register_regex("even", r"^even\((\d+)\)$", |_, _| true)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "even"));
    }

    #[test]
    fn test_duplicate_across_kinds_fails_in_any_order() {
        let mut registry = ConstraintRegistry::new();
        registry.register_custom("slug", |_| true).unwrap();
        assert!(registry.register_regex("slug", r"^slug$", |_, _| true).is_err());

        let mut registry = ConstraintRegistry::new();
        registry.register_regex("slug", r"^slug$", |_, _| true).unwrap();
        assert!(registry.register_custom("slug", |_| true).is_err());
    }

    #[test]
    fn test_builtin_names_are_taken() {
        let mut registry = ConstraintRegistry::with_builtins().unwrap();
        assert!(matches!(
            registry.register_custom("email", |_| true),
            Err(RegistryError::Duplicate(_))
        ));
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut registry = ConstraintRegistry::new();
        let err = registry.register_regex("broken", r"^broken\((\d+$", |_, _| true).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPattern { .. }));
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn test_runelength_counts_characters() {
        let registry = ConstraintRegistry::with_builtins().unwrap();
        let entry = "runelength(1|3)";
        assert_eq!(check(&registry, "runelength", entry, FieldValue::Str("日本語")), Some(true));
        assert_eq!(check(&registry, "runelength", entry, FieldValue::Str("abcd")), Some(false));
        assert_eq!(check(&registry, "runelength", entry, FieldValue::Int(3)), Some(false));
    }

    #[test]
    fn test_string_length_variants() {
        let registry = ConstraintRegistry::with_builtins().unwrap();
        assert_eq!(
            check(&registry, "stringlength", "stringlength(1|3)", FieldValue::Str("日本")),
            Some(false)
        );
        assert_eq!(
            check(&registry, "asciilength", "asciilength(1|5)", FieldValue::Str("héllo")),
            Some(false)
        );
        assert_eq!(
            check(&registry, "asciilength", "asciilength(1|5)", FieldValue::Str("he-lo")),
            Some(true)
        );
        assert_eq!(
            check(&registry, "alphanumlength", "alphanumlength(2|8)", FieldValue::Str("abc123")),
            Some(true)
        );
        assert_eq!(
            check(&registry, "alphanumlength", "alphanumlength(2|8)", FieldValue::Str("abc-123")),
            Some(false)
        );
    }

    #[test]
    fn test_malformed_entry_has_no_verdict() {
        let registry = ConstraintRegistry::with_builtins().unwrap();
        assert_eq!(check(&registry, "runelength", "runelength(1)", FieldValue::Str("a")), None);
        assert_eq!(check(&registry, "email", "email(1)", FieldValue::Str("a@b.c")), None);
    }

    #[test]
    fn test_email_host_port() {
        let registry = ConstraintRegistry::with_builtins().unwrap();
        assert_eq!(check(&registry, "email", "email", FieldValue::Str("ops@example.com")), Some(true));
        assert_eq!(check(&registry, "email", "email", FieldValue::Str("not-an-email")), Some(false));

        assert_eq!(check(&registry, "host", "host", FieldValue::Str("smtp.example.com")), Some(true));
        assert_eq!(check(&registry, "host", "host", FieldValue::Str("10.0.0.1")), Some(true));
        assert_eq!(check(&registry, "host", "host", FieldValue::Str("bad host")), Some(false));

        assert_eq!(check(&registry, "port", "port", FieldValue::Int(465)), Some(true));
        assert_eq!(check(&registry, "port", "port", FieldValue::Str("587")), Some(true));
        assert_eq!(check(&registry, "port", "port", FieldValue::Int(70000)), Some(false));
        assert_eq!(check(&registry, "port", "port", FieldValue::Int(-1)), Some(false));
    }
}

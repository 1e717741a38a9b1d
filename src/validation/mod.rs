//! Declarative struct validation.
//!
//! # Data Flow
//! ```text
//! startup:
//!     registry.rs (built-in + custom constraints) → Arc<ConstraintRegistry>
//!     → validator.rs (Validator, cloned into every consumer)
//!
//! per request:
//!     body bytes → Validator::validate(&mut target, body)
//!     → Ok(()) | ValidationError { category: json-parse | validate }
//! ```
//!
//! # Design Decisions
//! - Field rules are declared per type through [`Constrained`], not discovered
//!   at runtime
//! - Tagged fields are required by default; a rule can opt out with `optional`
//! - All violations of one pass are reported together

pub mod error;
pub mod field;
pub mod registry;
pub mod validator;

pub use error::{classify, ValidationError, JSON_PARSE, VALIDATE};
pub use field::{Constrained, Field, FieldValue};
pub use registry::{ConstraintRegistry, ConstraintSpec, RegistryError};
pub use validator::{FieldViolation, Input, Validator, Violations};

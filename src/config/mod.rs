//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! configs/default.toml (baseline, embedded)
//!     + configs/{ALARMS_ENV}.toml (overlay, embedded)
//!     → loader.rs (find & parse both documents)
//!     → store.rs (deep merge, overlay wins per key)
//!     → schema.rs (typed settings, validated MailConfig)
//!     → shared via Arc to the server and handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - A missing or corrupt document is a startup failure, never a degraded mode
//! - Getters fall back to zero values rather than failing

pub mod loader;
pub mod schema;
pub mod store;

pub use loader::{active_environment, load_config, ConfigError, ConfigLoader, ENV_VAR};
pub use schema::{HttpSettings, LogSettings, MailConfig, MetricsSettings, DEFAULT_LISTEN};
pub use store::ConfigStore;

//! Alarm relay library.

pub mod alarm;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod validation;

pub use config::ConfigStore;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use validation::{ValidationError, Validator};

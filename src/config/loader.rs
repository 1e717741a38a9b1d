//! Configuration loading from the documents embedded in the binary.

use figment::providers::{Format, Toml};
use figment::value::Dict;
use figment::Figment;
use thiserror::Error;

use crate::config::store::ConfigStore;
use crate::validation::ValidationError;

/// Process environment variable naming the active environment.
pub const ENV_VAR: &str = "ALARMS_ENV";

/// Development environment (used when [`ENV_VAR`] is unset or empty).
pub const DEV: &str = "dev";
/// Test environment.
pub const TEST: &str = "test";
/// Production environment.
pub const PRODUCTION: &str = "production";

/// Name of the baseline document.
pub const BASELINE: &str = "default";

static EMBEDDED: &[(&str, &str)] = &[
    (BASELINE, include_str!("../../configs/default.toml")),
    (DEV, include_str!("../../configs/dev.toml")),
    (TEST, include_str!("../../configs/test.toml")),
    (PRODUCTION, include_str!("../../configs/production.toml")),
];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration document `{0}` not found")]
    MissingDocument(String),

    #[error("configuration document `{document}` is invalid: {source}")]
    Parse {
        document: String,
        #[source]
        source: figment::Error,
    },

    #[error("mail configuration is invalid: {0}")]
    InvalidMail(#[source] ValidationError),
}

/// Name of the active environment, read from [`ENV_VAR`].
pub fn active_environment() -> String {
    resolve_environment(std::env::var(ENV_VAR).ok())
}

/// Empty or missing names resolve to [`DEV`].
pub fn resolve_environment(name: Option<String>) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEV.to_string())
}

/// Loads a baseline document plus one environment overlay.
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader<'a> {
    documents: &'a [(&'a str, &'a str)],
}

impl ConfigLoader<'static> {
    /// Loader over the documents compiled into the binary.
    pub fn embedded() -> Self {
        Self { documents: EMBEDDED }
    }
}

impl<'a> ConfigLoader<'a> {
    /// Loader over caller-supplied `(name, toml source)` pairs.
    pub fn new(documents: &'a [(&'a str, &'a str)]) -> Self {
        Self { documents }
    }

    /// Build the layered store for `environment`.
    ///
    /// Both the baseline and the overlay must exist and parse.
    pub fn load(&self, environment: &str) -> Result<ConfigStore, ConfigError> {
        let baseline = self.document(BASELINE)?;
        let overlay = self.document(environment)?;

        let keys = overlay.len();
        let store = ConfigStore::layered(baseline, overlay);
        tracing::debug!(environment, overlay_keys = keys, "Configuration loaded");
        Ok(store)
    }

    fn document(&self, name: &str) -> Result<Dict, ConfigError> {
        let (_, source) = self
            .documents
            .iter()
            .find(|(document, _)| *document == name)
            .ok_or_else(|| ConfigError::MissingDocument(name.to_string()))?;

        Figment::from(Toml::string(source))
            .extract()
            .map_err(|source| ConfigError::Parse {
                document: name.to_string(),
                source,
            })
    }
}

/// Load the embedded configuration for `environment`.
pub fn load_config(environment: &str) -> Result<ConfigStore, ConfigError> {
    ConfigLoader::embedded().load(environment)
}

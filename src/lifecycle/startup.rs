//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the constraint registry and the validator
//! - Load the layered configuration for the active environment
//! - Validate the mail configuration before any traffic is accepted
//! - Assemble the server state from the pieces above
//!
//! # Design Decisions
//! - Every failure here is a [`StartupError`], distinct from request errors
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;

use crate::alarm::{MailError, Mailer};
use crate::config::{load_config, ConfigError, ConfigStore, MailConfig};
use crate::http::{AppState, HttpServer};
use crate::observability::logging::LoggingError;
use crate::validation::{ConstraintRegistry, RegistryError, Validator};

/// Unrecoverable initialization failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("constraint registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("mail transport: {0}")]
    Mail(#[from] MailError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the service needs, built once before serving.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub environment: String,
    pub config: Arc<ConfigStore>,
    pub validator: Validator,
    pub mail: MailConfig,
}

/// Build the registry, load configuration for `environment`, validate mail settings.
pub fn bootstrap(environment: &str) -> Result<Bootstrap, StartupError> {
    let registry = ConstraintRegistry::with_builtins()?;
    let config = load_config(environment)?;
    Bootstrap::assemble(environment, registry, config)
}

impl Bootstrap {
    /// Assemble from an already-populated registry and store.
    pub fn assemble(
        environment: &str,
        registry: ConstraintRegistry,
        config: ConfigStore,
    ) -> Result<Self, StartupError> {
        let validator = Validator::new(Arc::new(registry));
        let mail = config.mail_config(&validator)?;
        Ok(Self {
            environment: environment.to_string(),
            config: Arc::new(config),
            validator,
            mail,
        })
    }

    pub fn app_state(&self, mailer: Arc<dyn Mailer>) -> AppState {
        AppState {
            validator: self.validator.clone(),
            mailer,
            sender: self.mail.user.as_str().into(),
            receivers: self.config.alarm_receivers().into(),
            token: self.config.alarm_token().into(),
        }
    }

    pub fn http_server(&self, mailer: Arc<dyn Mailer>) -> HttpServer {
        HttpServer::new(self.app_state(mailer), &self.config.http_settings())
    }
}

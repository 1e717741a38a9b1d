//! Typed views over the configuration store.
//!
//! The store holds raw values; this module projects the subtrees the
//! service reads into typed settings, with the defaults the service
//! falls back to when a document leaves them out.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;
use crate::config::store::ConfigStore;
use crate::validation::{Constrained, Field, Validator};

/// Listen address used when `listen` is unset.
pub const DEFAULT_LISTEN: &str = ":7001";

/// SMTP settings, validated before the service starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: i64,
    pub user: String,
    pub password: String,
}

impl Constrained for MailConfig {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("host", "host", &self.host),
            Field::new("port", "port", self.port),
            Field::new("user", "email", &self.user),
            Field::new("password", "runelength(1|100)", &self.password),
        ]
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            body_limit: 64 * 1024,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `json` or `pretty`.
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "127.0.0.1:9090".to_string(),
        }
    }
}

impl ConfigStore {
    pub fn app_name(&self) -> String {
        self.get_string("app")
    }

    /// Configured listen address, `:7001` by default.
    pub fn listen(&self) -> String {
        self.get_string_default("listen", DEFAULT_LISTEN)
    }

    /// [`listen`](Self::listen) as a bindable socket address; a bare
    /// `:port` binds on all interfaces.
    pub fn listen_addr(&self) -> String {
        let listen = self.listen();
        if listen.starts_with(':') {
            format!("0.0.0.0{listen}")
        } else {
            listen
        }
    }

    pub fn alarm_receivers(&self) -> Vec<String> {
        self.get_string_slice("alarm.receiver")
    }

    pub fn alarm_token(&self) -> String {
        self.get_string("alarm.token")
    }

    /// Mail settings, with the password resolved from the process environment.
    pub fn mail_config(&self, validator: &Validator) -> Result<MailConfig, ConfigError> {
        self.mail_config_with(validator, |name| std::env::var(name).ok())
    }

    /// Mail settings, resolving the password through `lookup`.
    ///
    /// When the stored password names a variable that `lookup` resolves to a
    /// non-empty value, that value replaces it.
    pub fn mail_config_with<F>(&self, validator: &Validator, lookup: F) -> Result<MailConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut password = self.get_string("mail.password");
        if !password.is_empty() {
            if let Some(secret) = lookup(&password).filter(|s| !s.is_empty()) {
                password = secret;
            }
        }

        let mail = MailConfig {
            host: self.get_string("mail.host"),
            port: self.get_int("mail.port"),
            user: self.get_string("mail.user"),
            password,
        };
        validator.check(&mail).map_err(ConfigError::InvalidMail)?;
        Ok(mail)
    }

    pub fn http_settings(&self) -> HttpSettings {
        let defaults = HttpSettings::default();
        let body_limit = self.get_uint_default("http.body_limit", defaults.body_limit as u64);
        HttpSettings {
            timeout: self.get_duration_default("http.timeout", defaults.timeout),
            body_limit: usize::try_from(body_limit).unwrap_or(defaults.body_limit),
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        let defaults = LogSettings::default();
        LogSettings {
            level: self.get_string_default("log.level", &defaults.level),
            format: self.get_string_default("log.format", &defaults.format),
        }
    }

    pub fn metrics_settings(&self) -> MetricsSettings {
        let defaults = MetricsSettings::default();
        MetricsSettings {
            enabled: self.get_bool("metrics.enabled"),
            listen: self.get_string_default("metrics.listen", &defaults.listen),
        }
    }
}

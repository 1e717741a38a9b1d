//! Layered configuration and constraint registry behaviour through the public API.

use std::sync::Arc;
use std::time::Duration;

use alarms::config::{load_config, ConfigError, ConfigLoader};
use alarms::validation::{ConstraintRegistry, FieldValue, RegistryError, Validator};

#[test]
fn test_test_environment_overrides_baseline() {
    let store = load_config("test").unwrap();
    assert_eq!(store.listen(), "127.0.0.1:7001");
    assert_eq!(store.alarm_token(), "test-token");
    assert_eq!(store.get_int("mail.port"), 2525);
    // Inherited from the baseline document.
    assert_eq!(store.get_string("mail.user"), "alarms@example.com");
    assert_eq!(store.http_settings().timeout, Duration::from_secs(30));
}

#[test]
fn test_missing_overlay_is_fatal() {
    assert!(matches!(
        load_config("qa"),
        Err(ConfigError::MissingDocument(name)) if name == "qa"
    ));
}

#[test]
fn test_password_resolved_from_environment() {
    let documents = [
        (
            "default",
            "[mail]\nhost = \"smtp.example.com\"\nport = 587\nuser = \"a@example.com\"\npassword = \"SMTP_PW\"",
        ),
        ("dev", ""),
    ];
    let store = ConfigLoader::new(&documents).load("dev").unwrap();
    let validator = Validator::new(Arc::new(ConstraintRegistry::with_builtins().unwrap()));
    let mail = store
        .mail_config_with(&validator, |name| (name == "SMTP_PW").then(|| "secret123".to_string()))
        .unwrap();
    assert_eq!(mail.password, "secret123");
}

#[test]
fn test_custom_constraints_extend_the_builtins() {
    let mut registry = ConstraintRegistry::with_builtins().unwrap();
    registry
        .register_custom("lowercase", |value| {
            value.as_str().is_some_and(|s| s.chars().all(|c| !c.is_uppercase()))
        })
        .unwrap();
    assert!(matches!(
        registry.register_regex("lowercase", r"^lowercase$", |_, _| true),
        Err(RegistryError::Duplicate(_))
    ));

    let lowercase = registry.get("lowercase").unwrap();
    assert_eq!(lowercase.check(&FieldValue::Str("ops"), "lowercase"), Some(true));
    assert_eq!(lowercase.check(&FieldValue::Str("Ops"), "lowercase"), Some(false));
}

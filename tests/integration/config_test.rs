//! Settings Integration Tests

use std::fs;

use execution_notify::{ConfigService, NotificationService, NotifyError, TemplateRegistry};

#[test]
fn test_settings_file_feeds_service() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("notify.json");
    fs::write(
        &path,
        r#"{
            "base_url": "https://workflows.example.com",
            "telegram_endpoint": "http://localhost:8081",
            "default_timeout_ms": 3000
        }"#,
    )
    .unwrap();

    let config = ConfigService::load(&path).unwrap();
    let service = NotificationService::new(
        config.settings().clone(),
        TemplateRegistry::with_defaults().unwrap(),
    )
    .unwrap();

    assert_eq!(service.settings().default_timeout_ms, 3000);
    assert_eq!(service.settings().telegram_endpoint, "http://localhost:8081");
}

#[test]
fn test_reload_keeps_previous_settings_on_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("notify.json");
    fs::write(&path, r#"{"default_timeout_ms": 1500}"#).unwrap();

    let mut config = ConfigService::load(&path).unwrap();
    fs::write(&path, r#"{"base_url": "ftp://nope"}"#).unwrap();

    let err = config.reload().unwrap_err();
    assert!(matches!(err, NotifyError::Config(_)));
    assert_eq!(config.settings().default_timeout_ms, 1500);
}

#[test]
fn test_bundled_templates_registered() {
    let registry = TemplateRegistry::with_defaults().unwrap();
    assert!(registry.contains("telegram-template"));
    assert!(registry.contains("mail-template"));
}

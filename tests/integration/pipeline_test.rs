//! Notification Pipeline Integration Tests
//!
//! Runs whole invocations through `NotificationService` with the bundled
//! templates and the real channels over in-memory transports.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use execution_notify::{
    MailExecution, NotificationTask, NotifyError, NotifySettings, Overrides, PipelineStage,
    TelegramExecution,
};

use crate::common::*;

fn telegram_task(overrides: Overrides) -> TelegramExecution {
    TelegramExecution {
        config: telegram_config(),
        overrides,
    }
}

// ============================================================================
// Telegram
// ============================================================================

#[tokio::test]
async fn test_failed_execution_reported_over_telegram() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let result = telegram_task(Overrides::default())
        .run(&service, &failed_execution())
        .await
        .unwrap();
    assert_eq!(result.acknowledgment, "42");

    let sent = api.sent();
    assert_eq!(sent.len(), 1);
    let request = &sent[0];
    assert_eq!(request.chat_id, "2072728690");
    assert_eq!(request.parse_mode, Some("HTML"));
    assert!(request.text.contains("[prod] f1"));
    assert!(request.text.contains("FAILED"));
    assert!(request.text.contains("/ui/executions/prod/f1/e1"));
    assert!(request.text.contains("Duration: 1m 5.3s"));
    assert!(request.text.contains("<code>t2</code>"));
    assert!(!request.text.contains("t3"));
}

#[tokio::test]
async fn test_base_url_produces_absolute_link() {
    let api = FakeTelegramApi::ok();
    let settings = NotifySettings {
        base_url: Some("https://workflows.example.com/".to_string()),
        ..Default::default()
    };
    let service = service_with(settings, api.clone(), Arc::new(FakeMailTransport::default()));

    telegram_task(Overrides::default())
        .run(&service, &failed_execution())
        .await
        .unwrap();

    assert!(api.sent()[0]
        .text
        .contains("https://workflows.example.com/ui/executions/prod/f1/e1"));
}

#[tokio::test]
async fn test_successful_execution_has_no_failed_task() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let mut execution = failed_execution();
    execution.task_run_list.truncate(1);
    if let Some(state) = execution.state.as_mut() {
        state.kind = execution_notify::StateType::Success;
    }

    telegram_task(Overrides::default())
        .run(&service, &execution)
        .await
        .unwrap();

    let text = &api.sent()[0].text;
    assert!(text.contains("SUCCESS"));
    assert!(!text.contains("Failed task"));
}

#[tokio::test]
async fn test_running_execution_reports_still_running() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let mut execution = failed_execution();
    if let Some(state) = execution.state.as_mut() {
        state.kind = execution_notify::StateType::Running;
        state.end_date = None;
    }

    telegram_task(Overrides::default())
        .run(&service, &execution)
        .await
        .unwrap();

    assert!(api.sent()[0].text.contains("Duration: still running"));
}

// ============================================================================
// Overrides
// ============================================================================

#[tokio::test]
async fn test_custom_message_replaces_template() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let overrides = Overrides {
        custom_fields: Some(json!({"env": "prod-eu"}).as_object().unwrap().clone()),
        custom_message: Some("{{ execution.flowId }} broke on {{ env }} after {{ duration }}".to_string()),
    };

    telegram_task(overrides)
        .run(&service, &failed_execution())
        .await
        .unwrap();

    let request = &api.sent()[0];
    assert_eq!(request.text, "f1 broke on prod-eu after 1m 5.3s");
    assert_eq!(request.parse_mode, None);
}

#[tokio::test]
async fn test_blank_custom_message_falls_back_to_template() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let overrides = Overrides {
        custom_fields: None,
        custom_message: Some("   ".to_string()),
    };

    telegram_task(overrides)
        .run(&service, &failed_execution())
        .await
        .unwrap();

    assert_eq!(api.sent()[0].parse_mode, Some("HTML"));
}

#[tokio::test]
async fn test_custom_fields_cannot_shadow_computed_values() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let overrides = Overrides {
        custom_fields: Some(
            json!({"duration": "forever", "team": "data"})
                .as_object()
                .unwrap()
                .clone(),
        ),
        custom_message: None,
    };

    telegram_task(overrides)
        .run(&service, &failed_execution())
        .await
        .unwrap();

    let text = &api.sent()[0].text;
    assert!(text.contains("Duration: 1m 5.3s"));
    assert!(!text.contains("Duration: forever"));
    assert!(text.contains("<i>team</i>: data"));
}

#[tokio::test]
async fn test_rendering_is_deterministic() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));
    let task = telegram_task(Overrides {
        custom_fields: Some(json!({"b": 2, "a": 1}).as_object().unwrap().clone()),
        custom_message: None,
    });

    task.run(&service, &failed_execution()).await.unwrap();
    task.run(&service, &failed_execution()).await.unwrap();

    let sent = api.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_invalid_execution_fails_at_build() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let mut execution = failed_execution();
    execution.state = None;

    let failure = telegram_task(Overrides::default())
        .run(&service, &execution)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Build);
    assert!(matches!(failure.error, NotifyError::InvalidExecution(_)));
    assert!(!failure.is_retryable());
    assert!(api.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_template_fails_at_render() {
    let api = FakeTelegramApi::ok();
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let mut task = telegram_task(Overrides::default());
    task.config.template = Some("weekly-digest".to_string());

    let failure = task.run(&service, &failed_execution()).await.unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Render);
    assert!(matches!(failure.error, NotifyError::TemplateNotFound(_)));
    assert!(api.sent().is_empty());
}

#[tokio::test]
async fn test_delivery_timeout_is_retryable_transport_failure() {
    let api = FakeTelegramApi::hanging(Duration::from_millis(500));
    let service = service(api.clone(), Arc::new(FakeMailTransport::default()));

    let mut task = telegram_task(Overrides::default());
    task.config.timeout_ms = Some(20);

    let failure = task.run(&service, &failed_execution()).await.unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Deliver);
    assert!(matches!(failure.error, NotifyError::ChannelTransport(_)));
    assert!(failure.is_retryable());
    assert!(failure.to_string().contains("timed out after 20ms"));
    assert!(api.sent().is_empty());
}

// ============================================================================
// Mail
// ============================================================================

#[tokio::test]
async fn test_failed_execution_reported_over_mail() {
    let transport = Arc::new(FakeMailTransport::default());
    let service = service(FakeTelegramApi::ok(), transport.clone());

    let task = MailExecution {
        config: mail_config(),
        overrides: Overrides::default(),
    };
    let result = task.run(&service, &failed_execution()).await.unwrap();
    assert!(result.acknowledgment.starts_with("250"));

    let messages = transport.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Subject: This is the subject"));
    assert!(messages[0].contains("To: to@mail.com"));
    assert!(messages[0].contains("text/html"));
}

#[tokio::test]
async fn test_mail_custom_message_is_plain_text() {
    let transport = Arc::new(FakeMailTransport::default());
    let service = service(FakeTelegramApi::ok(), transport.clone());

    let task = MailExecution {
        config: mail_config(),
        overrides: Overrides {
            custom_fields: None,
            custom_message: Some("{{ execution.id }} finished".to_string()),
        },
    };
    task.run(&service, &failed_execution()).await.unwrap();

    let messages = transport.messages.lock().unwrap();
    assert!(messages[0].contains("text/plain"));
    assert!(messages[0].contains("e1 finished"));
}

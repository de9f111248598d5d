//! Shared fixtures for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lettre::Message;

use execution_notify::services::notification::channels::telegram::{
    ApiReply, SendMessageRequest, SentMessage, TelegramApi, TelegramResponse,
};
use execution_notify::services::notification::channels::{
    MailChannel, MailTransport, NotificationChannel, TelegramChannel,
};
use execution_notify::{
    Execution, MailConfig, NotificationService, NotifyResult, NotifySettings, State, StateType,
    TaskRun, TelegramConfig, TemplateRegistry, TransportStrategy,
};

pub fn ts(value: &str) -> chrono::DateTime<chrono::Utc> {
    value.parse().unwrap()
}

pub fn task_run(id: &str, task_id: &str, kind: StateType) -> TaskRun {
    TaskRun {
        id: id.to_string(),
        task_id: task_id.to_string(),
        parent_task_run_id: None,
        value: None,
        position: None,
        state: State {
            kind,
            start_date: ts("2026-03-01T10:00:00Z"),
            end_date: Some(ts("2026-03-01T10:00:01Z")),
        },
    }
}

/// Execution e1 of prod/f1 that failed on t2 after 65.3 seconds.
pub fn failed_execution() -> Execution {
    Execution {
        id: "e1".to_string(),
        namespace: "prod".to_string(),
        flow_id: "f1".to_string(),
        state: Some(State {
            kind: StateType::Failed,
            start_date: ts("2026-03-01T10:00:00Z"),
            end_date: Some(ts("2026-03-01T10:01:05.300Z")),
        }),
        task_run_list: vec![
            task_run("r1", "t1", StateType::Success),
            task_run("r2", "t2", StateType::Failed),
            task_run("r3", "t3", StateType::Killed),
        ],
    }
}

pub fn telegram_config() -> TelegramConfig {
    TelegramConfig {
        token: "6090305634:secret-token".to_string(),
        chat_id: "2072728690".to_string(),
        endpoint: None,
        disable_notification: false,
        template: None,
        timeout_ms: None,
    }
}

pub fn mail_config() -> MailConfig {
    MailConfig {
        host: "nohost-mail.site".to_string(),
        port: 465,
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        from: "from@mail.com".to_string(),
        to: "to@mail.com".to_string(),
        cc: None,
        subject: "This is the subject".to_string(),
        session_timeout_ms: None,
        transport_strategy: TransportStrategy::Smtps,
        template: None,
    }
}

/// Bot API stand-in that records requests and replies with a fixed answer.
pub struct FakeTelegramApi {
    reply: TelegramResponse,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<(String, SendMessageRequest)>>,
}

impl FakeTelegramApi {
    fn accepted() -> ApiReply {
        ApiReply {
            ok: true,
            result: Some(SentMessage { message_id: 42 }),
            ..Default::default()
        }
    }

    pub fn ok() -> Arc<Self> {
        Self::replying(200, Self::accepted())
    }

    pub fn replying(status: u16, reply: ApiReply) -> Arc<Self> {
        Arc::new(Self {
            reply: TelegramResponse { status, reply },
            delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answers successfully, but only after `delay`.
    pub fn hanging(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: TelegramResponse {
                status: 200,
                reply: Self::accepted(),
            },
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl TelegramApi for FakeTelegramApi {
    async fn send_message(
        &self,
        endpoint: &str,
        _token: &str,
        request: &SendMessageRequest,
    ) -> NotifyResult<TelegramResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), request.clone()));
        Ok(self.reply.clone())
    }
}

/// SMTP stand-in that keeps the formatted messages.
#[derive(Default)]
pub struct FakeMailTransport {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl MailTransport for FakeMailTransport {
    async fn send(
        &self,
        _config: &MailConfig,
        message: Message,
        _timeout: Duration,
    ) -> NotifyResult<String> {
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        self.messages.lock().unwrap().push(raw);
        Ok("250 2.0.0 Ok: queued".to_string())
    }
}

pub fn service_with(
    settings: NotifySettings,
    telegram: Arc<FakeTelegramApi>,
    mail: Arc<FakeMailTransport>,
) -> NotificationService {
    let endpoint = settings.telegram_endpoint.clone();
    let channels: Vec<Box<dyn NotificationChannel>> = vec![
        Box::new(TelegramChannel::new(telegram, endpoint)),
        Box::new(MailChannel::new(mail)),
    ];
    NotificationService::with_channels(settings, TemplateRegistry::with_defaults().unwrap(), channels)
}

pub fn service(telegram: Arc<FakeTelegramApi>, mail: Arc<FakeMailTransport>) -> NotificationService {
    service_with(NotifySettings::default(), telegram, mail)
}

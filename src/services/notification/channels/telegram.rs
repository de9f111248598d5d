//! Telegram Bot API Notification Channel
//!
//! Sends the rendered message via the Bot API `sendMessage` endpoint and maps
//! the API's answer onto the notification error taxonomy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use execution_notify_core::{NotifyError, NotifyResult, ProxyConfig};

use super::{mismatched_config, with_timeout, NotificationChannel};
use crate::services::http_client::build_http_client;
use crate::services::notification::template::{RenderedMessage, TemplateFormat};
use crate::services::notification::types::{ChannelConfig, ChannelType, DeliveryResult};

/// Body of a `sendMessage` call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    pub disable_notification: bool,
}

/// Message acknowledged by the Bot API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Envelope returned by every Bot API method
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error_code: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub result: Option<SentMessage>,
}

/// Raw outcome of a Bot API call that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramResponse {
    pub status: u16,
    pub reply: ApiReply,
}

/// Low-level Bot API client.
///
/// Returns `Err` only for failures that never produced an HTTP response;
/// API-level rejections come back as a [`TelegramResponse`] and are
/// classified by [`TelegramChannel`].
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn send_message(
        &self,
        endpoint: &str,
        token: &str,
        request: &SendMessageRequest,
    ) -> NotifyResult<TelegramResponse>;
}

/// Bot API client over reqwest.
pub struct HttpTelegramApi {
    client: reqwest::Client,
}

impl HttpTelegramApi {
    pub fn new(proxy: Option<&ProxyConfig>) -> NotifyResult<Self> {
        Ok(Self {
            client: build_http_client(proxy)?,
        })
    }
}

/// Map a reqwest failure to a transport error. The URL carries the bot
/// token, so it is stripped before the message is kept.
fn transport_error(err: reqwest::Error) -> NotifyError {
    if err.is_timeout() {
        NotifyError::transport("Telegram request timed out")
    } else if err.is_connect() {
        NotifyError::transport(format!("Telegram connection failed: {}", err.without_url()))
    } else {
        NotifyError::transport(format!("Telegram request failed: {}", err.without_url()))
    }
}

#[async_trait]
impl TelegramApi for HttpTelegramApi {
    async fn send_message(
        &self,
        endpoint: &str,
        token: &str,
        request: &SendMessageRequest,
    ) -> NotifyResult<TelegramResponse> {
        let api_url = format!(
            "{}/bot{}/sendMessage",
            endpoint.trim_end_matches('/'),
            token
        );

        let response = self
            .client
            .post(&api_url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        let reply = serde_json::from_str::<ApiReply>(&body).unwrap_or_else(|_| ApiReply {
            description: Some(body.chars().take(200).collect()),
            ..Default::default()
        });

        Ok(TelegramResponse { status, reply })
    }
}

/// Telegram channel: one `sendMessage` call per delivery.
pub struct TelegramChannel {
    api: Arc<dyn TelegramApi>,
    default_endpoint: String,
}

impl TelegramChannel {
    pub fn new(api: Arc<dyn TelegramApi>, default_endpoint: impl Into<String>) -> Self {
        Self {
            api,
            default_endpoint: default_endpoint.into(),
        }
    }

    fn parse_mode(format: TemplateFormat) -> Option<&'static str> {
        match format {
            TemplateFormat::Html => Some("HTML"),
            TemplateFormat::MarkdownV2 => Some("MarkdownV2"),
            TemplateFormat::Plain => None,
        }
    }

    /// Turn a Bot API answer into a delivery result or a typed failure.
    fn classify(response: TelegramResponse) -> NotifyResult<DeliveryResult> {
        let success = (200..300).contains(&response.status);
        if success && response.reply.ok {
            let ack = response
                .reply
                .result
                .map(|msg| msg.message_id.to_string())
                .unwrap_or_else(|| "ok".to_string());
            return Ok(DeliveryResult::new(ChannelType::Telegram, ack));
        }

        let code = response.reply.error_code.unwrap_or(response.status);
        let description = response
            .reply
            .description
            .unwrap_or_else(|| format!("HTTP {}", response.status));

        match code {
            401 | 404 => Err(NotifyError::auth(format!(
                "Telegram rejected the bot token: {}",
                description
            ))),
            403 => Err(NotifyError::target(format!(
                "Telegram refused the chat: {}",
                description
            ))),
            400 if description.to_lowercase().contains("chat") => Err(NotifyError::target(
                format!("Telegram rejected the chat id: {}", description),
            )),
            400 => Err(NotifyError::config(format!(
                "Telegram rejected the message: {}",
                description
            ))),
            _ => Err(NotifyError::transport(format!(
                "Telegram returned HTTP {}: {}",
                code, description
            ))),
        }
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Telegram
    }

    async fn deliver(
        &self,
        config: &ChannelConfig,
        message: &RenderedMessage,
        timeout: Duration,
    ) -> NotifyResult<DeliveryResult> {
        let cfg = match config {
            ChannelConfig::Telegram(cfg) => cfg,
            other => return Err(mismatched_config(ChannelType::Telegram, other)),
        };

        if cfg.token.trim().is_empty() {
            return Err(NotifyError::auth("Telegram bot token not configured"));
        }
        if cfg.chat_id.trim().is_empty() {
            return Err(NotifyError::target("Telegram chat id not configured"));
        }

        let endpoint = cfg.endpoint.as_deref().unwrap_or(&self.default_endpoint);
        let request = SendMessageRequest {
            chat_id: cfg.chat_id.clone(),
            text: message.body.clone(),
            parse_mode: Self::parse_mode(message.format),
            disable_notification: cfg.disable_notification,
        };

        tracing::debug!(
            chat_id = %cfg.chat_id,
            parse_mode = ?request.parse_mode,
            "Sending Telegram message"
        );

        let response = with_timeout(
            ChannelType::Telegram,
            timeout,
            self.api.send_message(endpoint, &cfg.token, &request),
        )
        .await?;

        Self::classify(response)
    }
}

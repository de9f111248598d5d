//! Notification Service
//!
//! Runs one invocation through Build -> Override -> Render -> Deliver. Every
//! stage fails fast: nothing is sent unless all earlier stages succeeded, and
//! the failing stage is reported with the error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use execution_notify_core::{Execution, NotifyError, NotifyResult};

use super::channels::{
    HttpTelegramApi, MailChannel, NotificationChannel, SmtpMailTransport, TelegramChannel,
};
use super::context::ContextBuilder;
use super::overrides::{self, Overrides};
use super::template::{TemplateRegistry, TemplateRenderer};
use super::types::*;
use crate::models::settings::NotifySettings;

/// Stateless dispatcher shared by all notification tasks.
///
/// Holds the context builder, the template renderer and a registry of
/// channel implementations keyed by channel type. Concurrent invocations
/// share nothing mutable.
pub struct NotificationService {
    settings: NotifySettings,
    builder: ContextBuilder,
    renderer: TemplateRenderer,
    channels: HashMap<ChannelType, Box<dyn NotificationChannel>>,
}

impl NotificationService {
    /// Create a service wired to the real Telegram (reqwest) and mail (SMTP) channels.
    pub fn new(settings: NotifySettings, registry: TemplateRegistry) -> NotifyResult<Self> {
        settings.validate().map_err(NotifyError::config)?;

        let telegram_api = HttpTelegramApi::new(settings.proxy.as_ref())?;
        let channels: Vec<Box<dyn NotificationChannel>> = vec![
            Box::new(TelegramChannel::new(
                Arc::new(telegram_api),
                settings.telegram_endpoint.clone(),
            )),
            Box::new(MailChannel::new(Arc::new(SmtpMailTransport))),
        ];

        Ok(Self::with_channels(settings, registry, channels))
    }

    /// Create a service with caller-supplied channel implementations.
    pub fn with_channels(
        settings: NotifySettings,
        registry: TemplateRegistry,
        channels: Vec<Box<dyn NotificationChannel>>,
    ) -> Self {
        let channels = channels
            .into_iter()
            .map(|channel| (channel.channel_type(), channel))
            .collect();

        Self {
            builder: ContextBuilder::new(settings.base_url.clone()),
            renderer: TemplateRenderer::new(Arc::new(registry)),
            settings,
            channels,
        }
    }

    pub fn settings(&self) -> &NotifySettings {
        &self.settings
    }

    /// Notify about `execution` over the channel selected by `config`.
    pub async fn dispatch(
        &self,
        config: &ChannelConfig,
        execution: &Execution,
        overrides: &Overrides,
    ) -> Result<DeliveryResult, TaskFailure> {
        let channel_type = config.channel_type();
        let mut state = InvocationState::Pending;

        let fail = |stage: PipelineStage, error: NotifyError| {
            tracing::warn!(
                execution_id = %execution.id,
                channel = %channel_type,
                stage = %stage,
                state = ?InvocationState::Failed(stage),
                kind = error.kind(),
                retryable = error.is_retryable(),
                "Notification failed: {}",
                error
            );
            TaskFailure::new(stage, error)
        };

        let context = self
            .builder
            .build(execution)
            .map_err(|e| fail(PipelineStage::Build, e))?;
        state = advance(state, PipelineStage::Build, &execution.id);

        let plan = overrides::apply(&context, overrides, config.template_id());
        state = advance(state, PipelineStage::Override, &execution.id);

        let message = self
            .renderer
            .render_plan(&plan)
            .map_err(|e| fail(PipelineStage::Render, e))?;
        state = advance(state, PipelineStage::Render, &execution.id);

        let channel = self
            .channels
            .get(&channel_type)
            .ok_or_else(|| {
                NotifyError::config(format!("no {} channel registered", channel_type))
            })
            .map_err(|e| fail(PipelineStage::Deliver, e))?;

        let result = channel
            .deliver(config, &message, self.timeout_for(config))
            .await
            .map_err(|e| fail(PipelineStage::Deliver, e))?;
        state = advance(state, PipelineStage::Deliver, &execution.id);

        tracing::info!(
            execution_id = %execution.id,
            channel = %channel_type,
            delivery_id = %result.id,
            acknowledgment = %result.acknowledgment,
            state = ?state,
            "Notification delivered"
        );

        Ok(result)
    }

    fn timeout_for(&self, config: &ChannelConfig) -> Duration {
        Duration::from_millis(
            config
                .timeout_ms()
                .filter(|ms| *ms > 0)
                .unwrap_or(self.settings.default_timeout_ms),
        )
    }
}

fn advance(state: InvocationState, stage: PipelineStage, execution_id: &str) -> InvocationState {
    debug_assert_eq!(state.next_stage(), Some(stage));
    let next = InvocationState::completed(stage);
    tracing::debug!(execution_id = %execution_id, from = ?state, to = ?next, "Notification stage completed");
    next
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("settings", &self.settings)
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

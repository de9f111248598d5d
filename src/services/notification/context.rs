//! Execution Context Builder
//!
//! Derives the channel-agnostic facts a notification is rendered from:
//! deep link, human duration, start date and the first failed task run.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};

use execution_notify_core::{Execution, NotifyResult, StateType, TaskRun};

/// Placeholder rendered as the duration of an execution without an end date.
pub const RUNNING_DURATION: &str = "still running";

/// First failed task run of an execution, or its explicit absence.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstFailed {
    Found(TaskRun),
    Absent,
}

impl FirstFailed {
    pub fn task_run(&self) -> Option<&TaskRun> {
        match self {
            Self::Found(run) => Some(run),
            Self::Absent => None,
        }
    }

    /// `false` when absent so templates can branch with `{{#if firstFailed}}`.
    fn to_value(&self) -> Value {
        match self {
            Self::Found(run) => serde_json::to_value(run).unwrap_or(Value::Bool(false)),
            Self::Absent => Value::Bool(false),
        }
    }
}

/// Identity and final state of the execution being notified about
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub id: String,
    pub namespace: String,
    pub flow_id: String,
    pub state: StateType,
}

/// Facts derived from one execution snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContext {
    pub execution: ExecutionSummary,
    pub link: String,
    pub duration: String,
    pub start_date: DateTime<Utc>,
    pub first_failed: FirstFailed,
}

impl NotificationContext {
    /// Field mapping handed to the template renderer.
    pub fn to_render_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "execution".to_string(),
            json!({
                "id": self.execution.id,
                "namespace": self.execution.namespace,
                "flowId": self.execution.flow_id,
                "state": self.execution.state.to_string(),
            }),
        );
        map.insert("link".to_string(), Value::String(self.link.clone()));
        map.insert("duration".to_string(), Value::String(self.duration.clone()));
        map.insert(
            "startDate".to_string(),
            Value::String(self.start_date.to_rfc3339()),
        );
        map.insert("firstFailed".to_string(), self.first_failed.to_value());
        map
    }
}

/// Builds a [`NotificationContext`] from an execution snapshot.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    base_url: Option<String>,
}

impl ContextBuilder {
    pub fn new(base_url: Option<String>) -> Self {
        Self { base_url }
    }

    pub fn build(&self, execution: &Execution) -> NotifyResult<NotificationContext> {
        let state = execution.validated_state()?;

        let duration = match state.duration() {
            Some(elapsed) => human_duration(elapsed),
            None => RUNNING_DURATION.to_string(),
        };

        let first_failed = match execution.find_first_by_state(StateType::Failed) {
            Some(run) => FirstFailed::Found(run.clone()),
            None => FirstFailed::Absent,
        };

        Ok(NotificationContext {
            execution: ExecutionSummary {
                id: execution.id.clone(),
                namespace: execution.namespace.clone(),
                flow_id: execution.flow_id.clone(),
                state: state.kind,
            },
            link: execution_link(self.base_url.as_deref(), execution),
            duration,
            start_date: state.start_date,
            first_failed,
        })
    }
}

/// Format an elapsed time rounded half-up to the tenth of a second.
///
/// `2.5s`, `1m 5.3s`, `2h 0m 1.0s`. Negative spans clamp to zero.
pub fn human_duration(elapsed: Duration) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    let tenths = (millis + 50) / 100;
    let total_secs = tenths / 10;
    let fraction = tenths % 10;

    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}.{}s", hours, minutes, seconds, fraction)
    } else if minutes > 0 {
        format!("{}m {}.{}s", minutes, seconds, fraction)
    } else {
        format!("{}.{}s", seconds, fraction)
    }
}

/// Deep link to the execution page of the workflow UI.
///
/// Relative (`/ui/executions/...`) when no base URL is configured.
pub fn execution_link(base_url: Option<&str>, execution: &Execution) -> String {
    let path = format!(
        "ui/executions/{}/{}/{}",
        urlencoding::encode(&execution.namespace),
        urlencoding::encode(&execution.flow_id),
        urlencoding::encode(&execution.id)
    );

    match base_url.map(|b| b.trim_end_matches('/')).filter(|b| !b.is_empty()) {
        Some(base) => format!("{}/{}", base, path),
        None => format!("/{}", path),
    }
}

//! Execution Snapshot
//!
//! Read-only view of a workflow execution as supplied by the engine when a
//! notification is triggered. Field names follow the engine's camelCase JSON.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{NotifyError, NotifyResult};

/// State type of an execution or a task run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateType {
    Created,
    Running,
    Paused,
    Restarted,
    Killing,
    Success,
    Warning,
    Failed,
    Killed,
}

impl StateType {
    /// Whether this state is final.
    pub fn is_terminated(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Warning | Self::Failed | Self::Killed
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Restarted => "RESTARTED",
            Self::Killing => "KILLING",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        };
        write!(f, "{}", s)
    }
}

/// Current state of an execution or task run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(rename = "type", alias = "current")]
    pub kind: StateType,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl State {
    /// Elapsed time between start and end, `None` while still running.
    pub fn duration(&self) -> Option<Duration> {
        self.end_date.map(|end| end - self.start_date)
    }
}

/// One task's execution record within an execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    pub id: String,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_run_id: Option<String>,
    /// Iteration value for tasks spawned by a loop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub state: State,
}

/// One run of a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub namespace: String,
    pub flow_id: String,
    #[serde(default)]
    pub state: Option<State>,
    #[serde(default)]
    pub task_run_list: Vec<TaskRun>,
}

impl Execution {
    /// Return the state, failing when the record cannot be notified about.
    pub fn validated_state(&self) -> NotifyResult<&State> {
        if self.id.trim().is_empty() {
            return Err(NotifyError::invalid_execution("execution id is empty"));
        }
        self.state.as_ref().ok_or_else(|| {
            NotifyError::invalid_execution(format!("execution {} has no state", self.id))
        })
    }

    /// Task runs in execution order.
    ///
    /// Ordered by `position` only when the engine supplied one for every run,
    /// otherwise sequence order is kept. The sort is stable so ties keep
    /// sequence order.
    pub fn ordered_task_runs(&self) -> Vec<&TaskRun> {
        let mut runs: Vec<&TaskRun> = self.task_run_list.iter().collect();
        if runs.iter().all(|run| run.position.is_some()) {
            runs.sort_by_key(|run| run.position);
        }
        runs
    }

    /// First task run in execution order whose state matches `kind`.
    pub fn find_first_by_state(&self, kind: StateType) -> Option<&TaskRun> {
        self.ordered_task_runs()
            .into_iter()
            .find(|run| run.state.kind == kind)
    }
}

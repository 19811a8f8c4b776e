use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{validate, workflow_instance as instance, workflow_task as task};

use crate::errors::ServiceError;
use crate::lifecycle::{fold_status, Lifecycle};

macro_rules! status_strings {
    ($ty:ident, $label:literal, { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self { $($ty::$variant => $text),+ }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $ty {
            type Err = ServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let folded = fold_status(s);
                $(
                    if folded == $text.to_lowercase() $(|| folded == $alias)* {
                        return Ok($ty::$variant);
                    }
                )+
                Err(ServiceError::Validation(format!(concat!("unknown ", $label, " status '{}'"), s)))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ServiceError;
            fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
        }

        impl From<$ty> for String {
            fn from(s: $ty) -> Self { s.as_str().to_string() }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InstanceStatus {
    Pending,
    InProgress,
    InApproval,
    Completed,
    Rejected,
    Suspended,
    Cancelled,
    Failed,
}

status_strings!(InstanceStatus, "workflow", {
    Pending => "Pending",
    InProgress => "InProgress" | "active" | "running",
    InApproval => "InApproval",
    Completed => "Completed" | "done",
    Rejected => "Rejected",
    Suspended => "Suspended" | "paused",
    Cancelled => "Cancelled" | "canceled",
    Failed => "Failed" | "error",
});

impl InstanceStatus {
    /// Running instances accept task decisions.
    pub fn is_running(self) -> bool { matches!(self, InstanceStatus::InProgress | InstanceStatus::InApproval) }
}

impl Lifecycle for InstanceStatus {
    const ENTITY: &'static str = "workflow";

    fn targets(self) -> &'static [Self] {
        use InstanceStatus::*;
        match self {
            Pending => &[InProgress, Cancelled],
            InProgress => &[InApproval, Completed, Rejected, Suspended, Cancelled, Failed],
            InApproval => &[Completed, Rejected, InProgress, Cancelled],
            Suspended => &[InProgress, Cancelled],
            Rejected => &[InProgress],
            Failed => &[InProgress],
            Completed | Cancelled => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    Skipped,
    Cancelled,
}

status_strings!(TaskStatus, "task", {
    Pending => "Pending",
    InProgress => "InProgress" | "active",
    Approved => "Approved" | "completed",
    Rejected => "Rejected",
    Skipped => "Skipped",
    Cancelled => "Cancelled" | "canceled",
});

impl TaskStatus {
    pub fn is_open(self) -> bool { matches!(self, TaskStatus::Pending | TaskStatus::InProgress) }

    /// Counts towards completion of the instance.
    pub fn is_done(self) -> bool { matches!(self, TaskStatus::Approved | TaskStatus::Skipped) }
}

impl Lifecycle for TaskStatus {
    const ENTITY: &'static str = "workflow task";

    fn targets(self) -> &'static [Self] {
        use TaskStatus::*;
        match self {
            Pending => &[InProgress, Skipped, Cancelled],
            InProgress => &[Approved, Rejected, Cancelled],
            Rejected => &[InProgress],
            Approved | Skipped | Cancelled => &[],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub assignee: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewWorkflow {
    pub definition_key: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub tasks: Vec<NewTask>,
}

impl NewWorkflow {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate::required_text("definition_key", &self.definition_key, 100)?;
        validate::required_text("entity_type", &self.entity_type, 100)?;
        if self.tasks.is_empty() {
            return Err(ServiceError::Validation("a workflow needs at least one task".into()));
        }
        for t in &self.tasks {
            validate::required_text("task name", &t.name, 200)?;
        }
        Ok(())
    }
}

/// An instance with its tasks in sequence order.
#[derive(Clone, Debug, Serialize)]
pub struct WorkflowView {
    #[serde(flatten)]
    pub instance: instance::Model,
    pub tasks: Vec<task::Model>,
}

pub(crate) fn task_status(t: &task::Model) -> Result<TaskStatus, ServiceError> { t.status.parse() }

/// Instance status implied by its tasks once a decision has been applied.
///
/// Activates the next pending task when none is in progress; the instance is
/// `InApproval` while its last open task is being decided.
pub(crate) fn advance(tasks: &mut [task::Model], now: DateTime<Utc>) -> Result<InstanceStatus, ServiceError> {
    let statuses: Vec<TaskStatus> = tasks.iter().map(task_status).collect::<Result<_, _>>()?;
    if statuses.iter().all(|s| s.is_done()) {
        return Ok(InstanceStatus::Completed);
    }
    if !statuses.contains(&TaskStatus::InProgress) {
        if let Some(next) = tasks
            .iter_mut()
            .filter(|t| t.status == TaskStatus::Pending.as_str())
            .min_by_key(|t| t.sequence)
        {
            next.status = TaskStatus::InProgress.as_str().to_string();
            next.updated_at = now.into();
        }
    }
    let open = tasks.iter().filter(|t| task_status(t).is_ok_and(TaskStatus::is_open)).count();
    Ok(if open == 1 { InstanceStatus::InApproval } else { InstanceStatus::InProgress })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn task(sequence: i32, status: TaskStatus) -> task::Model {
        let now = Utc::now().into();
        task::Model {
            id: Uuid::new_v4(),
            instance_id: Uuid::nil(),
            name: format!("step {sequence}"),
            sequence,
            assignee: Some("reviewer".into()),
            status: status.as_str().into(),
            comments: None,
            completed_by: None,
            completed_at: None,
            due_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{workflow_instance as instance, workflow_task as task};

use super::domain::{advance, task_status, InstanceStatus, NewWorkflow, TaskStatus, WorkflowView};
use super::repository::WorkflowRepository;
use crate::errors::ServiceError;
use crate::lifecycle::Lifecycle;
use crate::metrics;

fn instance_status(wf: &instance::Model) -> Result<InstanceStatus, ServiceError> { wf.status.parse() }

/// Guarded instance move; returns whether the status changed.
fn move_instance(wf: &mut instance::Model, to: InstanceStatus, now: DateTime<Utc>) -> Result<bool, ServiceError> {
    let from = instance_status(wf)?;
    from.ensure_transition(to)?;
    if from == to {
        return Ok(false);
    }
    wf.status = to.as_str().to_string();
    wf.updated_at = now.into();
    if to == InstanceStatus::Completed || to == InstanceStatus::Cancelled {
        wf.completed_at = Some(now.into());
    }
    info!(workflow_id = %wf.id, from = %from, to = %to, "workflow_status_changed");
    Ok(true)
}

fn move_task(t: &mut task::Model, to: TaskStatus, now: DateTime<Utc>) -> Result<(), ServiceError> {
    let from = task_status(t)?;
    from.ensure_transition(to)?;
    t.status = to.as_str().to_string();
    t.updated_at = now.into();
    Ok(())
}

fn ensure_running(wf: &instance::Model) -> Result<(), ServiceError> {
    let status = instance_status(wf)?;
    if !status.is_running() {
        return Err(ServiceError::InvalidState(format!("workflow is {status}; tasks can only be decided while it is running")));
    }
    Ok(())
}

fn require_status(wf: &instance::Model, allowed: &[InstanceStatus], action: &str) -> Result<InstanceStatus, ServiceError> {
    let status = instance_status(wf)?;
    if !allowed.contains(&status) {
        return Err(ServiceError::InvalidState(format!("cannot {action} a workflow that is {status}")));
    }
    Ok(status)
}

pub struct WorkflowService<R: WorkflowRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: WorkflowRepository + ?Sized> WorkflowService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    async fn load(&self, tenant_id: Uuid, id: Uuid) -> Result<(instance::Model, Vec<task::Model>), ServiceError> {
        self.repo.find(tenant_id, id).await?.ok_or_else(|| ServiceError::not_found("workflow"))
    }

    async fn persist(
        &self,
        wf: instance::Model,
        tasks: Vec<task::Model>,
        instance_changed: bool,
    ) -> Result<WorkflowView, ServiceError> {
        self.repo.save(wf.clone(), tasks.clone()).await?;
        if instance_changed {
            metrics::record_transition(InstanceStatus::ENTITY, &wf.status);
        }
        Ok(WorkflowView { instance: wf, tasks })
    }

    fn task_index(tasks: &[task::Model], task_id: Uuid) -> Result<usize, ServiceError> {
        tasks.iter().position(|t| t.id == task_id).ok_or_else(|| ServiceError::not_found("workflow task"))
    }

    /// Create a `Pending` instance with tasks numbered in the given order.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, definition = %input.definition_key))]
    pub async fn create(&self, tenant_id: Uuid, by: &str, input: NewWorkflow) -> Result<WorkflowView, ServiceError> {
        input.validate()?;
        let now = Utc::now().into();
        let wf = instance::Model {
            id: Uuid::new_v4(),
            tenant_id,
            definition_key: input.definition_key.trim().to_string(),
            entity_type: input.entity_type.trim().to_string(),
            entity_id: input.entity_id,
            status: InstanceStatus::Pending.as_str().to_string(),
            initiated_by: by.to_string(),
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let tasks: Vec<task::Model> = input
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, t)| task::Model {
                id: Uuid::new_v4(),
                instance_id: wf.id,
                name: t.name.trim().to_string(),
                sequence: i as i32 + 1,
                assignee: t.assignee.filter(|a| !a.trim().is_empty()),
                status: TaskStatus::Pending.as_str().to_string(),
                comments: None,
                completed_by: None,
                completed_at: None,
                due_at: t.due_at.map(Into::into),
                created_at: now,
                updated_at: now,
            })
            .collect();
        self.repo.insert(wf.clone(), tasks.clone()).await?;
        info!(workflow_id = %wf.id, tasks = tasks.len(), "workflow_created");
        Ok(WorkflowView { instance: wf, tasks })
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkflowView, ServiceError> {
        let (instance, tasks) = self.load(tenant_id, id).await?;
        Ok(WorkflowView { instance, tasks })
    }

    pub async fn list(&self, tenant_id: Uuid, status: Option<InstanceStatus>) -> Result<Vec<instance::Model>, ServiceError> {
        Ok(self
            .repo
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|w| status.map_or(true, |s| instance_status(w).ok() == Some(s)))
            .collect())
    }

    /// Open tasks assigned to `assignee`.
    pub async fn tasks_for(&self, tenant_id: Uuid, assignee: &str) -> Result<Vec<task::Model>, ServiceError> {
        if assignee.trim().is_empty() {
            return Err(ServiceError::Validation("assignee is required".into()));
        }
        self.repo.open_tasks_for(tenant_id, assignee.trim()).await
    }

    #[instrument(skip(self))]
    pub async fn start(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkflowView, ServiceError> {
        let (mut wf, mut tasks) = self.load(tenant_id, id).await?;
        require_status(&wf, &[InstanceStatus::Pending], "start")?;
        let now = Utc::now();
        move_instance(&mut wf, InstanceStatus::InProgress, now)?;
        wf.started_at = Some(now.into());
        let next = advance(&mut tasks, now)?;
        move_instance(&mut wf, next, now)?;
        self.persist(wf, tasks, true).await
    }

    /// Approve the task; the next pending task becomes active or the workflow completes.
    #[instrument(skip(self, comments))]
    pub async fn approve_task(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        task_id: Uuid,
        by: &str,
        comments: Option<&str>,
    ) -> Result<WorkflowView, ServiceError> {
        let (mut wf, mut tasks) = self.load(tenant_id, id).await?;
        ensure_running(&wf)?;
        let now = Utc::now();
        let idx = Self::task_index(&tasks, task_id)?;
        let t = &mut tasks[idx];
        move_task(t, TaskStatus::Approved, now)?;
        t.completed_by = Some(by.to_string());
        t.completed_at = Some(now.into());
        if let Some(c) = comments.map(str::trim).filter(|c| !c.is_empty()) {
            t.comments = Some(c.to_string());
        }
        metrics::record_transition(TaskStatus::ENTITY, TaskStatus::Approved.as_str());
        let next = advance(&mut tasks, now)?;
        let changed = move_instance(&mut wf, next, now)?;
        self.persist(wf, tasks, changed).await
    }

    /// Reject the task; the whole workflow becomes `Rejected` until retried.
    #[instrument(skip(self, reason))]
    pub async fn reject_task(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        task_id: Uuid,
        by: &str,
        reason: &str,
    ) -> Result<WorkflowView, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::Validation("rejection reason is required".into()));
        }
        let (mut wf, mut tasks) = self.load(tenant_id, id).await?;
        ensure_running(&wf)?;
        let now = Utc::now();
        let idx = Self::task_index(&tasks, task_id)?;
        let t = &mut tasks[idx];
        move_task(t, TaskStatus::Rejected, now)?;
        t.completed_by = Some(by.to_string());
        t.completed_at = Some(now.into());
        t.comments = Some(reason.trim().to_string());
        metrics::record_transition(TaskStatus::ENTITY, TaskStatus::Rejected.as_str());
        let changed = move_instance(&mut wf, InstanceStatus::Rejected, now)?;
        self.persist(wf, tasks, changed).await
    }

    #[instrument(skip(self))]
    pub async fn skip_task(&self, tenant_id: Uuid, id: Uuid, task_id: Uuid, by: &str) -> Result<WorkflowView, ServiceError> {
        let (mut wf, mut tasks) = self.load(tenant_id, id).await?;
        ensure_running(&wf)?;
        let now = Utc::now();
        let idx = Self::task_index(&tasks, task_id)?;
        let t = &mut tasks[idx];
        move_task(t, TaskStatus::Skipped, now)?;
        t.completed_by = Some(by.to_string());
        t.completed_at = Some(now.into());
        metrics::record_transition(TaskStatus::ENTITY, TaskStatus::Skipped.as_str());
        let next = advance(&mut tasks, now)?;
        let changed = move_instance(&mut wf, next, now)?;
        self.persist(wf, tasks, changed).await
    }

    pub async fn suspend(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkflowView, ServiceError> {
        let (mut wf, tasks) = self.load(tenant_id, id).await?;
        let changed = move_instance(&mut wf, InstanceStatus::Suspended, Utc::now())?;
        self.persist(wf, tasks, changed).await
    }

    pub async fn resume(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkflowView, ServiceError> {
        let (mut wf, tasks) = self.load(tenant_id, id).await?;
        require_status(&wf, &[InstanceStatus::Suspended], "resume")?;
        let changed = move_instance(&mut wf, InstanceStatus::InProgress, Utc::now())?;
        self.persist(wf, tasks, changed).await
    }

    /// Cancel the workflow and every task still open.
    #[instrument(skip(self))]
    pub async fn cancel(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkflowView, ServiceError> {
        let (mut wf, mut tasks) = self.load(tenant_id, id).await?;
        let now = Utc::now();
        let changed = move_instance(&mut wf, InstanceStatus::Cancelled, now)?;
        for t in tasks.iter_mut().filter(|t| task_status(t).is_ok_and(TaskStatus::is_open)) {
            move_task(t, TaskStatus::Cancelled, now)?;
        }
        self.persist(wf, tasks, changed).await
    }

    /// Put a rejected or failed workflow back in progress, reopening rejected tasks.
    #[instrument(skip(self))]
    pub async fn retry(&self, tenant_id: Uuid, id: Uuid) -> Result<WorkflowView, ServiceError> {
        let (mut wf, mut tasks) = self.load(tenant_id, id).await?;
        require_status(&wf, &[InstanceStatus::Rejected, InstanceStatus::Failed], "retry")?;
        let now = Utc::now();
        let changed = move_instance(&mut wf, InstanceStatus::InProgress, now)?;
        for t in tasks.iter_mut().filter(|t| task_status(t).ok() == Some(TaskStatus::Rejected)) {
            move_task(t, TaskStatus::InProgress, now)?;
            t.completed_by = None;
            t.completed_at = None;
        }
        self.persist(wf, tasks, changed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::domain::NewTask;
    use crate::workflow::repository::mock::MockWorkflowRepository;

    fn svc() -> WorkflowService<MockWorkflowRepository> { WorkflowService::new(Arc::new(MockWorkflowRepository::default())) }

    fn input(steps: &[&str]) -> NewWorkflow {
        NewWorkflow {
            definition_key: "policy-approval".into(),
            entity_type: "Policy".into(),
            entity_id: Some(Uuid::new_v4()),
            tasks: steps
                .iter()
                .map(|s| NewTask { name: s.to_string(), assignee: Some(s.to_string()), due_at: None })
                .collect(),
        }
    }

    #[tokio::test]
    async fn approvals_walk_the_chain_to_completion() {
        let svc = svc();
        let t = Uuid::new_v4();
        let wf = svc.create(t, "alice", input(&["manager", "ciso", "board"])).await.unwrap();
        assert_eq!(wf.instance.status, "Pending");
        assert_eq!(wf.tasks.iter().map(|t| t.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);
        let id = wf.instance.id;

        let v = svc.start(t, id).await.unwrap();
        assert_eq!(v.instance.status, "InProgress");
        assert!(v.instance.started_at.is_some());
        assert_eq!(v.tasks[0].status, "InProgress");
        assert_eq!(svc.tasks_for(t, "manager").await.unwrap().len(), 1);

        let v = svc.approve_task(t, id, v.tasks[0].id, "manager", Some("ok")).await.unwrap();
        assert_eq!(v.tasks[1].status, "InProgress");
        assert_eq!(v.instance.status, "InProgress");
        assert!(svc.tasks_for(t, "manager").await.unwrap().is_empty());

        let v = svc.approve_task(t, id, v.tasks[1].id, "ciso", None).await.unwrap();
        assert_eq!(v.instance.status, "InApproval");

        let v = svc.approve_task(t, id, v.tasks[2].id, "board", None).await.unwrap();
        assert_eq!(v.instance.status, "Completed");
        assert!(v.instance.completed_at.is_some());
        assert_eq!(svc.cancel(t, id).await.unwrap_err().code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn reject_then_retry() {
        let svc = svc();
        let t = Uuid::new_v4();
        let wf = svc.create(t, "alice", input(&["manager", "ciso"])).await.unwrap();
        let id = wf.instance.id;
        let first = wf.tasks[0].id;
        svc.start(t, id).await.unwrap();

        assert_eq!(svc.reject_task(t, id, first, "manager", "").await.unwrap_err().code(), "VALIDATION_FAILED");
        let v = svc.reject_task(t, id, first, "manager", "missing budget").await.unwrap();
        assert_eq!(v.instance.status, "Rejected");
        assert_eq!(v.tasks[0].comments.as_deref(), Some("missing budget"));
        assert_eq!(svc.approve_task(t, id, first, "manager", None).await.unwrap_err().code(), "INVALID_STATE");

        let v = svc.retry(t, id).await.unwrap();
        assert_eq!(v.instance.status, "InProgress");
        assert_eq!(v.tasks[0].status, "InProgress");
        assert!(v.tasks[0].completed_by.is_none());
    }

    #[tokio::test]
    async fn skip_pending_task_and_suspend_resume() {
        let svc = svc();
        let t = Uuid::new_v4();
        let wf = svc.create(t, "alice", input(&["a", "b", "c"])).await.unwrap();
        let id = wf.instance.id;
        let v = svc.start(t, id).await.unwrap();
        // the active task cannot be skipped
        assert_eq!(svc.skip_task(t, id, v.tasks[0].id, "alice").await.unwrap_err().code(), "INVALID_STATE");
        let v = svc.skip_task(t, id, v.tasks[1].id, "alice").await.unwrap();
        assert_eq!(v.tasks[1].status, "Skipped");
        assert_eq!(v.instance.status, "InProgress");

        let v = svc.suspend(t, id).await.unwrap();
        assert_eq!(v.instance.status, "Suspended");
        assert_eq!(svc.approve_task(t, id, v.tasks[0].id, "a", None).await.unwrap_err().code(), "INVALID_STATE");
        let v = svc.resume(t, id).await.unwrap();
        assert_eq!(v.instance.status, "InProgress");
        assert_eq!(svc.resume(t, id).await.unwrap_err().code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn cancel_closes_open_tasks() {
        let svc = svc();
        let t = Uuid::new_v4();
        let wf = svc.create(t, "alice", input(&["a", "b"])).await.unwrap();
        let id = wf.instance.id;
        svc.start(t, id).await.unwrap();
        let v = svc.cancel(t, id).await.unwrap();
        assert_eq!(v.instance.status, "Cancelled");
        assert!(v.tasks.iter().all(|t| t.status == "Cancelled"));
        assert_eq!(svc.list(t, Some(InstanceStatus::Cancelled)).await.unwrap().len(), 1);
        assert!(svc.list(t, Some(InstanceStatus::Pending)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_step_workflow_goes_straight_to_approval() {
        let svc = svc();
        let t = Uuid::new_v4();
        let wf = svc.create(t, "alice", input(&["owner"])).await.unwrap();
        let v = svc.start(t, wf.instance.id).await.unwrap();
        assert_eq!(v.instance.status, "InApproval");
        assert_eq!(svc.start(t, wf.instance.id).await.unwrap_err().code(), "INVALID_STATE");
        assert!(matches!(svc.get(Uuid::new_v4(), wf.instance.id).await, Err(ServiceError::NotFound(_))));
    }
}

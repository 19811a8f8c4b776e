use async_trait::async_trait;
use uuid::Uuid;

use models::{workflow_instance as instance, workflow_task as task};

use crate::errors::ServiceError;

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Insert an instance together with its tasks.
    async fn insert(&self, wf: instance::Model, tasks: Vec<task::Model>) -> Result<(), ServiceError>;
    /// Persist an instance and the given tasks in one unit of work.
    async fn save(&self, wf: instance::Model, tasks: Vec<task::Model>) -> Result<(), ServiceError>;
    /// Instance plus its tasks ordered by sequence.
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<(instance::Model, Vec<task::Model>)>, ServiceError>;
    /// Newest first.
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<instance::Model>, ServiceError>;
    /// Pending or in-progress tasks assigned to `assignee` within the tenant.
    async fn open_tasks_for(&self, tenant_id: Uuid, assignee: &str) -> Result<Vec<task::Model>, ServiceError>;
}

pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockWorkflowRepository {
        instances: Mutex<HashMap<Uuid, instance::Model>>,
        tasks: Mutex<HashMap<Uuid, task::Model>>,
    }

    #[async_trait]
    impl WorkflowRepository for MockWorkflowRepository {
        async fn insert(&self, wf: instance::Model, tasks: Vec<task::Model>) -> Result<(), ServiceError> {
            self.instances.lock().insert(wf.id, wf);
            let mut rows = self.tasks.lock();
            for t in tasks {
                rows.insert(t.id, t);
            }
            Ok(())
        }

        async fn save(&self, wf: instance::Model, tasks: Vec<task::Model>) -> Result<(), ServiceError> {
            let mut instances = self.instances.lock();
            if !instances.contains_key(&wf.id) {
                return Err(ServiceError::not_found("workflow"));
            }
            instances.insert(wf.id, wf);
            let mut rows = self.tasks.lock();
            for t in tasks {
                rows.insert(t.id, t);
            }
            Ok(())
        }

        async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<(instance::Model, Vec<task::Model>)>, ServiceError> {
            let Some(wf) = self.instances.lock().get(&id).filter(|w| w.tenant_id == tenant_id).cloned() else {
                return Ok(None);
            };
            let mut tasks: Vec<_> = self.tasks.lock().values().filter(|t| t.instance_id == id).cloned().collect();
            tasks.sort_by_key(|t| t.sequence);
            Ok(Some((wf, tasks)))
        }

        async fn list(&self, tenant_id: Uuid) -> Result<Vec<instance::Model>, ServiceError> {
            let mut out: Vec<_> = self.instances.lock().values().filter(|w| w.tenant_id == tenant_id).cloned().collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn open_tasks_for(&self, tenant_id: Uuid, assignee: &str) -> Result<Vec<task::Model>, ServiceError> {
            let instances = self.instances.lock();
            let mut out: Vec<_> = self
                .tasks
                .lock()
                .values()
                .filter(|t| t.assignee.as_deref() == Some(assignee))
                .filter(|t| matches!(t.status.as_str(), "Pending" | "InProgress"))
                .filter(|t| instances.get(&t.instance_id).is_some_and(|w| w.tenant_id == tenant_id))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.sequence.cmp(&b.sequence)));
            Ok(out)
        }
    }
}

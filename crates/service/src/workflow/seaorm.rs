use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, TransactionTrait,
};
use sea_orm::sea_query::JoinType;
use uuid::Uuid;

use models::{workflow_instance as instance, workflow_task as task};

use super::domain::TaskStatus;
use super::repository::WorkflowRepository;
use crate::errors::ServiceError;

fn db_err(e: sea_orm::DbErr) -> ServiceError { ServiceError::Db(e.to_string()) }

pub struct SeaOrmWorkflowRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl WorkflowRepository for SeaOrmWorkflowRepository {
    async fn insert(&self, wf: instance::Model, tasks: Vec<task::Model>) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        wf.into_active_model().reset_all().insert(&txn).await.map_err(db_err)?;
        for t in tasks {
            t.into_active_model().reset_all().insert(&txn).await.map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn save(&self, wf: instance::Model, tasks: Vec<task::Model>) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        wf.into_active_model().reset_all().update(&txn).await.map_err(db_err)?;
        for t in tasks {
            t.into_active_model().reset_all().update(&txn).await.map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<(instance::Model, Vec<task::Model>)>, ServiceError> {
        let Some(wf) = instance::Entity::find_by_id(id)
            .filter(instance::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let tasks = task::Entity::find()
            .filter(task::Column::InstanceId.eq(id))
            .order_by_asc(task::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(Some((wf, tasks)))
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<instance::Model>, ServiceError> {
        instance::Entity::find()
            .filter(instance::Column::TenantId.eq(tenant_id))
            .order_by_desc(instance::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn open_tasks_for(&self, tenant_id: Uuid, assignee: &str) -> Result<Vec<task::Model>, ServiceError> {
        task::Entity::find()
            .join(JoinType::InnerJoin, task::Relation::Instance.def())
            .filter(instance::Column::TenantId.eq(tenant_id))
            .filter(task::Column::Assignee.eq(assignee))
            .filter(task::Column::Status.is_in([TaskStatus::Pending.as_str(), TaskStatus::InProgress.as_str()]))
            .order_by_asc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

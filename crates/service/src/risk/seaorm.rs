use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use models::risk;

use super::repository::RiskRepository;
use crate::errors::ServiceError;

pub struct SeaOrmRiskRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl RiskRepository for SeaOrmRiskRepository {
    async fn insert(&self, risk: risk::Model) -> Result<risk::Model, ServiceError> {
        risk.into_active_model()
            .reset_all()
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn update(&self, risk: risk::Model) -> Result<risk::Model, ServiceError> {
        risk.into_active_model()
            .reset_all()
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<risk::Model>, ServiceError> {
        risk::Entity::find_by_id(id)
            .filter(risk::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<risk::Model>, ServiceError> {
        risk::Entity::find()
            .filter(risk::Column::TenantId.eq(tenant_id))
            .order_by_desc(risk::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = risk::Entity::delete_many()
            .filter(risk::Column::Id.eq(id))
            .filter(risk::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }
}

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use models::risk_appetite_setting as setting;

use super::repository::AppetiteRepository;
use crate::errors::ServiceError;

pub struct SeaOrmAppetiteRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl AppetiteRepository for SeaOrmAppetiteRepository {
    async fn insert(&self, s: setting::Model) -> Result<setting::Model, ServiceError> {
        s.into_active_model().reset_all().insert(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn update(&self, s: setting::Model) -> Result<setting::Model, ServiceError> {
        s.into_active_model().reset_all().update(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<setting::Model>, ServiceError> {
        setting::Entity::find_by_id(id)
            .filter(setting::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<setting::Model>, ServiceError> {
        setting::Entity::find()
            .filter(setting::Column::TenantId.eq(tenant_id))
            .order_by_asc(setting::Column::Category)
            .order_by_asc(setting::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = setting::Entity::delete_many()
            .filter(setting::Column::Id.eq(id))
            .filter(setting::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }
}

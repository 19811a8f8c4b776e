use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use models::tenant;

use super::repository::TenantRepository;
use crate::errors::ServiceError;

pub struct SeaOrmTenantRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl TenantRepository for SeaOrmTenantRepository {
    async fn insert(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError> {
        Ok(tenant.into_active_model().reset_all().insert(&self.db).await?)
    }

    async fn update(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError> {
        Ok(tenant.into_active_model().reset_all().update(&self.db).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<tenant::Model>, ServiceError> {
        Ok(tenant::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<tenant::Model>, ServiceError> {
        Ok(tenant::Entity::find().filter(tenant::Column::Slug.eq(slug)).one(&self.db).await?)
    }

    async fn page(&self, page_idx: u64, per_page: u64) -> Result<(Vec<tenant::Model>, u64), ServiceError> {
        let paginator = tenant::Entity::find()
            .order_by_desc(tenant::Column::CreatedAt)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_idx).await?;
        Ok((items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::{TenantService, TenantStatus};
    use crate::test_support::get_db;
    use std::sync::Arc;

    #[tokio::test]
    async fn tenant_crud_against_postgres() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let svc = TenantService::new(Arc::new(SeaOrmTenantRepository { db: db.clone() }));

        let name = format!("Svc Tenant {}", Uuid::new_v4().simple());
        let t = svc.create(&name, "owner@example.com").await?;
        assert_eq!(t.status, "Pending");
        assert_eq!(svc.get_by_slug(&t.slug).await?.id, t.id);
        let again = svc.create(&name, "other@example.com").await?;
        assert!(again.slug.starts_with(&format!("{}-", t.slug)));

        let active = svc.set_status(t.id, TenantStatus::Active).await?;
        assert_eq!(active.status, "Active");

        tenant::Entity::delete_by_id(t.id).exec(&db).await?;
        tenant::Entity::delete_by_id(again.id).exec(&db).await?;
        assert_eq!(svc.get(t.id).await.unwrap_err().code(), "NOT_FOUND");
        Ok(())
    }
}

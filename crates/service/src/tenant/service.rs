use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::tenant;

use super::domain::TenantStatus;
use super::repository::TenantRepository;
use crate::errors::ServiceError;
use crate::lifecycle::Lifecycle;
use crate::metrics;

pub struct TenantService<R: TenantRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: TenantRepository + ?Sized> TenantService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Create a tenant in `Pending` status with a unique slug derived from its name.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, admin_email: &str) -> Result<tenant::Model, ServiceError> {
        tenant::validate_name(name)?;
        tenant::validate_email(admin_email)?;

        let mut slug = tenant::slugify(name);
        if slug.is_empty() {
            return Err(ServiceError::Validation("name must contain letters or digits".into()));
        }
        if self.repo.find_by_slug(&slug).await?.is_some() {
            slug = format!("{}-{}", slug, Utc::now().format("%H%M%S"));
            if self.repo.find_by_slug(&slug).await?.is_some() {
                return Err(ServiceError::Conflict(format!("tenant slug '{slug}' already exists")));
            }
        }

        let now = Utc::now().into();
        let row = tenant::Model {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            slug,
            admin_email: admin_email.trim().to_string(),
            status: TenantStatus::Pending.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.insert(row).await?;
        info!(tenant_id = %created.id, slug = %created.slug, "tenant_created");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<tenant::Model, ServiceError> {
        self.repo.find(id).await?.ok_or_else(|| ServiceError::not_found("tenant"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<tenant::Model, ServiceError> {
        self.repo
            .find_by_slug(&slug.trim().to_lowercase())
            .await?
            .ok_or_else(|| ServiceError::not_found("tenant"))
    }

    /// Newest tenants first.
    pub async fn list(&self, opts: Pagination) -> Result<Page<tenant::Model>, ServiceError> {
        let (idx, per_page) = opts.normalize();
        let (items, total) = self.repo.page(idx, per_page).await?;
        Ok(Page::new(items, total, opts))
    }

    /// Update name and/or admin e-mail; the slug is kept stable.
    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, name: Option<&str>, admin_email: Option<&str>) -> Result<tenant::Model, ServiceError> {
        let mut row = self.get(id).await?;
        if let Some(name) = name {
            tenant::validate_name(name)?;
            row.name = name.trim().to_string();
        }
        if let Some(email) = admin_email {
            tenant::validate_email(email)?;
            row.admin_email = email.trim().to_string();
        }
        row.updated_at = Utc::now().into();
        let updated = self.repo.update(row).await?;
        info!(tenant_id = %updated.id, "tenant_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: Uuid, to: TenantStatus) -> Result<tenant::Model, ServiceError> {
        let mut row = self.get(id).await?;
        let from: TenantStatus = row.status.parse()?;
        from.ensure_transition(to)?;
        if from == to {
            return Ok(row);
        }
        row.status = to.as_str().to_string();
        row.updated_at = Utc::now().into();
        let updated = self.repo.update(row).await?;
        metrics::record_transition(TenantStatus::ENTITY, to.as_str());
        info!(tenant_id = %id, from = %from, to = %to, "tenant_status_changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::repository::mock::MockTenantRepository;

    fn svc() -> TenantService<MockTenantRepository> { TenantService::new(Arc::new(MockTenantRepository::default())) }

    #[tokio::test]
    async fn create_update_and_lookup() {
        let svc = svc();
        let t = svc.create("Gulf Bank", "owner@gulf.example").await.unwrap();
        assert_eq!(t.status, "Pending");
        assert_eq!(t.slug, "gulf-bank");
        assert_eq!(svc.get_by_slug("Gulf-Bank").await.unwrap().id, t.id);

        let updated = svc.update(t.id, Some("Gulf Bank Group"), None).await.unwrap();
        assert_eq!(updated.name, "Gulf Bank Group");
        assert_eq!(updated.slug, "gulf-bank");
        assert_eq!(svc.get(Uuid::new_v4()).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn duplicate_name_gets_time_suffix() {
        let svc = svc();
        let a = svc.create("Acme", "a@example.com").await.unwrap();
        let b = svc.create("Acme", "b@example.com").await.unwrap();
        assert!(b.slug.starts_with("acme-"));
        assert_eq!(b.slug.len(), a.slug.len() + 7);
    }

    #[tokio::test]
    async fn status_changes_are_guarded() {
        let svc = svc();
        let t = svc.create("Acme", "a@example.com").await.unwrap();
        let err = svc.set_status(t.id, TenantStatus::Suspended).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        svc.set_status(t.id, TenantStatus::Active).await.unwrap();
        let suspended = svc.set_status(t.id, TenantStatus::Suspended).await.unwrap();
        assert_eq!(suspended.status, "Suspended");
        assert_eq!(svc.set_status(t.id, TenantStatus::Pending).await.unwrap_err().code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let svc = svc();
        for name in ["One", "Two", "Three"] {
            svc.create(name, "x@example.com").await.unwrap();
        }
        let page = svc.list(Pagination { page: 1, per_page: 2 }).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].created_at >= page.items[1].created_at);
    }

    #[tokio::test]
    async fn rejects_bad_email() {
        let err = svc().create("Acme", "not-an-email").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use models::tenant;

use crate::errors::ServiceError;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn insert(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError>;
    async fn update(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<tenant::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<tenant::Model>, ServiceError>;
    /// Newest first. Returns one page and the unpaged total.
    async fn page(&self, page_idx: u64, per_page: u64) -> Result<(Vec<tenant::Model>, u64), ServiceError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockTenantRepository {
        rows: Mutex<HashMap<Uuid, tenant::Model>>,
    }

    #[async_trait]
    impl TenantRepository for MockTenantRepository {
        async fn insert(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError> {
            let mut rows = self.rows.lock();
            // mirrors the unique index on slug
            if rows.contains_key(&tenant.id) || rows.values().any(|t| t.slug == tenant.slug) {
                return Err(ServiceError::Conflict(format!("tenant slug '{}' already exists", tenant.slug)));
            }
            rows.insert(tenant.id, tenant.clone());
            Ok(tenant)
        }

        async fn update(&self, tenant: tenant::Model) -> Result<tenant::Model, ServiceError> {
            let mut rows = self.rows.lock();
            match rows.get_mut(&tenant.id) {
                Some(slot) => {
                    *slot = tenant.clone();
                    Ok(tenant)
                }
                None => Err(ServiceError::not_found("tenant")),
            }
        }

        async fn find(&self, id: Uuid) -> Result<Option<tenant::Model>, ServiceError> {
            Ok(self.rows.lock().get(&id).cloned())
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<tenant::Model>, ServiceError> {
            Ok(self.rows.lock().values().find(|t| t.slug == slug).cloned())
        }

        async fn page(&self, page_idx: u64, per_page: u64) -> Result<(Vec<tenant::Model>, u64), ServiceError> {
            let mut all: Vec<tenant::Model> = self.rows.lock().values().cloned().collect();
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let total = all.len() as u64;
            let items = all.into_iter().skip((page_idx * per_page) as usize).take(per_page as usize).collect();
            Ok((items, total))
        }
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use models::risk_appetite_setting as setting;

use crate::errors::ServiceError;

/// Persistence for appetite settings, scoped to a tenant.
#[async_trait]
pub trait AppetiteRepository: Send + Sync {
    async fn insert(&self, s: setting::Model) -> Result<setting::Model, ServiceError>;
    async fn update(&self, s: setting::Model) -> Result<setting::Model, ServiceError>;
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<setting::Model>, ServiceError>;
    /// Ordered by category, then name.
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<setting::Model>, ServiceError>;
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockAppetiteRepository {
        rows: Mutex<HashMap<Uuid, setting::Model>>,
    }

    #[async_trait]
    impl AppetiteRepository for MockAppetiteRepository {
        async fn insert(&self, s: setting::Model) -> Result<setting::Model, ServiceError> {
            self.rows.lock().insert(s.id, s.clone());
            Ok(s)
        }

        async fn update(&self, s: setting::Model) -> Result<setting::Model, ServiceError> {
            let mut rows = self.rows.lock();
            match rows.get_mut(&s.id) {
                Some(slot) => {
                    *slot = s.clone();
                    Ok(s)
                }
                None => Err(ServiceError::not_found("risk appetite setting")),
            }
        }

        async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<setting::Model>, ServiceError> {
            Ok(self.rows.lock().get(&id).filter(|s| s.tenant_id == tenant_id).cloned())
        }

        async fn list(&self, tenant_id: Uuid) -> Result<Vec<setting::Model>, ServiceError> {
            let mut out: Vec<setting::Model> = self.rows.lock().values().filter(|s| s.tenant_id == tenant_id).cloned().collect();
            out.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
            Ok(out)
        }

        async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
            let mut rows = self.rows.lock();
            if rows.get(&id).is_some_and(|s| s.tenant_id == tenant_id) {
                rows.remove(&id);
                return Ok(true);
            }
            Ok(false)
        }
    }
}

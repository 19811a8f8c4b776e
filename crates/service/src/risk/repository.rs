use async_trait::async_trait;
use uuid::Uuid;

use models::risk;

use crate::errors::ServiceError;

/// Persistence for risk rows; every lookup is scoped to a tenant.
#[async_trait]
pub trait RiskRepository: Send + Sync {
    async fn insert(&self, risk: risk::Model) -> Result<risk::Model, ServiceError>;
    async fn update(&self, risk: risk::Model) -> Result<risk::Model, ServiceError>;
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<risk::Model>, ServiceError>;
    /// Newest first.
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<risk::Model>, ServiceError>;
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockRiskRepository {
        rows: Mutex<HashMap<Uuid, risk::Model>>,
    }

    #[async_trait]
    impl RiskRepository for MockRiskRepository {
        async fn insert(&self, risk: risk::Model) -> Result<risk::Model, ServiceError> {
            let mut rows = self.rows.lock();
            if rows.contains_key(&risk.id) {
                return Err(ServiceError::Conflict("risk already exists".into()));
            }
            rows.insert(risk.id, risk.clone());
            Ok(risk)
        }

        async fn update(&self, risk: risk::Model) -> Result<risk::Model, ServiceError> {
            let mut rows = self.rows.lock();
            match rows.get_mut(&risk.id) {
                Some(slot) => {
                    *slot = risk.clone();
                    Ok(risk)
                }
                None => Err(ServiceError::not_found("risk")),
            }
        }

        async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<risk::Model>, ServiceError> {
            Ok(self.rows.lock().get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
        }

        async fn list(&self, tenant_id: Uuid) -> Result<Vec<risk::Model>, ServiceError> {
            let mut out: Vec<risk::Model> = self.rows.lock().values().filter(|r| r.tenant_id == tenant_id).cloned().collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
            let mut rows = self.rows.lock();
            if rows.get(&id).is_some_and(|r| r.tenant_id == tenant_id) {
                rows.remove(&id);
                return Ok(true);
            }
            Ok(false)
        }
    }
}

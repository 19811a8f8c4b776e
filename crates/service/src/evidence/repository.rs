use async_trait::async_trait;
use uuid::Uuid;

use models::{evidence, evidence_score};

use crate::errors::ServiceError;

/// Evidence rows and their score history.
#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    async fn insert(&self, e: evidence::Model) -> Result<evidence::Model, ServiceError>;
    async fn update(&self, e: evidence::Model) -> Result<evidence::Model, ServiceError>;
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<evidence::Model>, ServiceError>;
    /// Newest first.
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<evidence::Model>, ServiceError>;
    /// Store `score` as the only final score of `e` and persist `e` in the same unit of work.
    async fn save_score(
        &self,
        e: evidence::Model,
        score: evidence_score::Model,
    ) -> Result<(evidence::Model, evidence_score::Model), ServiceError>;
    /// Newest first.
    async fn scores(&self, evidence_id: Uuid) -> Result<Vec<evidence_score::Model>, ServiceError>;
    async fn final_scores(&self, evidence_ids: &[Uuid]) -> Result<Vec<evidence_score::Model>, ServiceError>;
}

pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockEvidenceRepository {
        rows: Mutex<HashMap<Uuid, evidence::Model>>,
        scores: Mutex<Vec<evidence_score::Model>>,
    }

    #[async_trait]
    impl EvidenceRepository for MockEvidenceRepository {
        async fn insert(&self, e: evidence::Model) -> Result<evidence::Model, ServiceError> {
            let mut rows = self.rows.lock();
            if rows.values().any(|x| x.evidence_number == e.evidence_number) {
                return Err(ServiceError::Conflict("evidence number already exists".into()));
            }
            rows.insert(e.id, e.clone());
            Ok(e)
        }

        async fn update(&self, e: evidence::Model) -> Result<evidence::Model, ServiceError> {
            let mut rows = self.rows.lock();
            let slot = rows.get_mut(&e.id).ok_or_else(|| ServiceError::not_found("evidence"))?;
            *slot = e.clone();
            Ok(e)
        }

        async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<evidence::Model>, ServiceError> {
            Ok(self.rows.lock().get(&id).filter(|e| e.tenant_id == tenant_id).cloned())
        }

        async fn list(&self, tenant_id: Uuid) -> Result<Vec<evidence::Model>, ServiceError> {
            let mut out: Vec<_> = self.rows.lock().values().filter(|e| e.tenant_id == tenant_id).cloned().collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn save_score(
            &self,
            e: evidence::Model,
            score: evidence_score::Model,
        ) -> Result<(evidence::Model, evidence_score::Model), ServiceError> {
            let mut scores = self.scores.lock();
            for s in scores.iter_mut().filter(|s| s.evidence_id == e.id) {
                s.is_final = false;
            }
            scores.push(score.clone());
            self.rows.lock().insert(e.id, e.clone());
            Ok((e, score))
        }

        async fn scores(&self, evidence_id: Uuid) -> Result<Vec<evidence_score::Model>, ServiceError> {
            let mut out: Vec<_> = self.scores.lock().iter().filter(|s| s.evidence_id == evidence_id).cloned().collect();
            out.reverse();
            Ok(out)
        }

        async fn final_scores(&self, evidence_ids: &[Uuid]) -> Result<Vec<evidence_score::Model>, ServiceError> {
            Ok(self
                .scores
                .lock()
                .iter()
                .filter(|s| s.is_final && evidence_ids.contains(&s.evidence_id))
                .cloned()
                .collect())
        }
    }
}

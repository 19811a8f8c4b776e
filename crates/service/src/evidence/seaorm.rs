use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use models::{evidence, evidence_score};

use super::repository::EvidenceRepository;
use crate::errors::ServiceError;

fn db_err(e: sea_orm::DbErr) -> ServiceError { ServiceError::Db(e.to_string()) }

pub struct SeaOrmEvidenceRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl EvidenceRepository for SeaOrmEvidenceRepository {
    async fn insert(&self, e: evidence::Model) -> Result<evidence::Model, ServiceError> {
        e.into_active_model().reset_all().insert(&self.db).await.map_err(db_err)
    }

    async fn update(&self, e: evidence::Model) -> Result<evidence::Model, ServiceError> {
        e.into_active_model().reset_all().update(&self.db).await.map_err(db_err)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<evidence::Model>, ServiceError> {
        evidence::Entity::find_by_id(id)
            .filter(evidence::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<evidence::Model>, ServiceError> {
        evidence::Entity::find()
            .filter(evidence::Column::TenantId.eq(tenant_id))
            .order_by_desc(evidence::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn save_score(
        &self,
        e: evidence::Model,
        score: evidence_score::Model,
    ) -> Result<(evidence::Model, evidence_score::Model), ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        evidence_score::Entity::update_many()
            .col_expr(evidence_score::Column::IsFinal, Expr::value(false))
            .filter(evidence_score::Column::EvidenceId.eq(e.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let score = score.into_active_model().reset_all().insert(&txn).await.map_err(db_err)?;
        let e = e.into_active_model().reset_all().update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok((e, score))
    }

    async fn scores(&self, evidence_id: Uuid) -> Result<Vec<evidence_score::Model>, ServiceError> {
        evidence_score::Entity::find()
            .filter(evidence_score::Column::EvidenceId.eq(evidence_id))
            .order_by_desc(evidence_score::Column::ScoredAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn final_scores(&self, evidence_ids: &[Uuid]) -> Result<Vec<evidence_score::Model>, ServiceError> {
        if evidence_ids.is_empty() {
            return Ok(Vec::new());
        }
        evidence_score::Entity::find()
            .filter(evidence_score::Column::IsFinal.eq(true))
            .filter(evidence_score::Column::EvidenceId.is_in(evidence_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use configs::RiskScoringConfig;
use models::risk;

use super::domain::{heatmap, inherent_score, HeatCell, RiskFilter, RiskInput, RiskLevel, RiskStatistics, RiskStatus, RiskView};
use super::repository::RiskRepository;
use crate::errors::ServiceError;
use crate::lifecycle::Lifecycle;
use crate::metrics;

/// Risk register business service independent of web framework
pub struct RiskService<R: RiskRepository + ?Sized> {
    repo: Arc<R>,
    cfg: RiskScoringConfig,
}

impl<R: RiskRepository + ?Sized> RiskService<R> {
    pub fn new(repo: Arc<R>, cfg: RiskScoringConfig) -> Self { Self { repo, cfg } }

    pub fn config(&self) -> &RiskScoringConfig { &self.cfg }

    /// Raw rows for other services (appetite comparison).
    pub async fn risks_for(&self, tenant_id: Uuid) -> Result<Vec<risk::Model>, ServiceError> {
        self.repo.list(tenant_id).await
    }

    fn view(&self, risk: risk::Model) -> RiskView { RiskView::new(risk, &self.cfg) }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<risk::Model, ServiceError> {
        self.repo.find(tenant_id, id).await?.ok_or_else(|| ServiceError::not_found("risk"))
    }

    /// Register a new risk in `Identified` status.
    ///
    /// # Examples
    /// ```
    /// use service::risk::{RiskService, repository::mock::MockRiskRepository, domain::RiskInput};
    /// use std::sync::Arc;
    /// let svc = RiskService::new(Arc::new(MockRiskRepository::default()), Default::default());
    /// let input = RiskInput {
    ///     title: "Phishing".into(), description: "Credential theft".into(), category: "Security".into(),
    ///     likelihood: 3, impact: 4, owner: "ciso".into(), mitigation_strategy: None, due_date: None,
    /// };
    /// let r = tokio_test::block_on(svc.create(uuid::Uuid::new_v4(), "alice", input)).unwrap();
    /// assert_eq!(r.risk.inherent_score, 12);
    /// assert_eq!(r.risk.status, "Identified");
    /// ```
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, title = %input.title))]
    pub async fn create(&self, tenant_id: Uuid, by: &str, input: RiskInput) -> Result<RiskView, ServiceError> {
        input.validate(&self.cfg)?;
        let now = Utc::now().into();
        let row = risk::Model {
            id: Uuid::new_v4(),
            tenant_id,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            likelihood: input.likelihood,
            impact: input.impact,
            inherent_score: inherent_score(input.likelihood, input.impact),
            status: RiskStatus::Identified.as_str().to_string(),
            owner: input.owner.trim().to_string(),
            mitigation_strategy: input.mitigation_strategy.filter(|m| !m.trim().is_empty()),
            due_date: input.due_date.map(Into::into),
            created_by: by.to_string(),
            created_at: now,
            updated_at: now,
        };
        let saved = self.repo.insert(row).await?;
        info!(risk_id = %saved.id, score = saved.inherent_score, "risk_created");
        Ok(self.view(saved))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        Ok(self.view(self.find(tenant_id, id).await?))
    }

    pub async fn list(&self, tenant_id: Uuid, filter: &RiskFilter) -> Result<Vec<RiskView>, ServiceError> {
        let rows = self.repo.list(tenant_id).await?;
        Ok(rows
            .into_iter()
            .filter(|r| {
                filter.category.as_deref().map_or(true, |c| r.category.eq_ignore_ascii_case(c.trim()))
                    && filter.status.map_or(true, |s| r.status.parse::<RiskStatus>().ok() == Some(s))
            })
            .map(|r| self.view(r))
            .filter(|v| filter.level.map_or(true, |l| v.level == l))
            .collect())
    }

    /// Replace the editable fields and re-score; status is left untouched.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, risk_id = %id))]
    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: RiskInput) -> Result<RiskView, ServiceError> {
        input.validate(&self.cfg)?;
        let mut row = self.find(tenant_id, id).await?;
        row.title = input.title.trim().to_string();
        row.description = input.description.trim().to_string();
        row.category = input.category.trim().to_string();
        row.likelihood = input.likelihood;
        row.impact = input.impact;
        row.inherent_score = inherent_score(input.likelihood, input.impact);
        row.owner = input.owner.trim().to_string();
        row.mitigation_strategy = input.mitigation_strategy.filter(|m| !m.trim().is_empty());
        row.due_date = input.due_date.map(Into::into);
        row.updated_at = Utc::now().into();
        let saved = self.repo.update(row).await?;
        info!(score = saved.inherent_score, "risk_updated");
        Ok(self.view(saved))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(ServiceError::not_found("risk"));
        }
        info!(risk_id = %id, "risk_deleted");
        Ok(())
    }

    async fn move_to(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: RiskStatus,
        mitigation: Option<String>,
    ) -> Result<RiskView, ServiceError> {
        let mut row = self.find(tenant_id, id).await?;
        let from: RiskStatus = row.status.parse()?;
        from.ensure_transition(to)?;
        if from == to && mitigation.is_none() {
            return Ok(self.view(row));
        }
        row.status = to.as_str().to_string();
        if mitigation.is_some() {
            row.mitigation_strategy = mitigation;
        }
        row.updated_at = Utc::now().into();
        let saved = self.repo.update(row).await?;
        if from != to {
            metrics::record_transition(RiskStatus::ENTITY, to.as_str());
        }
        info!(risk_id = %id, from = %from, to = %to, "risk_status_changed");
        Ok(self.view(saved))
    }

    pub async fn start_assessment(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::UnderAssessment, None).await
    }

    pub async fn submit_for_decision(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::PendingDecision, None).await
    }

    pub async fn accept(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::Accepted, None).await
    }

    pub async fn reject_acceptance(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::RequiresMitigation, None).await
    }

    /// Record the mitigation applied; `details` becomes the mitigation strategy.
    pub async fn mitigate(&self, tenant_id: Uuid, id: Uuid, details: &str) -> Result<RiskView, ServiceError> {
        if details.trim().is_empty() {
            return Err(ServiceError::Validation("mitigation details are required".into()));
        }
        self.move_to(tenant_id, id, RiskStatus::Mitigated, Some(details.trim().to_string())).await
    }

    pub async fn start_monitoring(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::Monitoring, None).await
    }

    pub async fn close(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::Closed, None).await
    }

    pub async fn reopen(&self, tenant_id: Uuid, id: Uuid) -> Result<RiskView, ServiceError> {
        self.move_to(tenant_id, id, RiskStatus::Identified, None).await
    }

    /// High and critical risks, highest score first.
    pub async fn high_risks(&self, tenant_id: Uuid) -> Result<Vec<RiskView>, ServiceError> {
        let mut out: Vec<RiskView> = self
            .repo
            .list(tenant_id)
            .await?
            .into_iter()
            .map(|r| self.view(r))
            .filter(|v| v.level >= RiskLevel::High)
            .collect();
        out.sort_by(|a, b| b.risk.inherent_score.cmp(&a.risk.inherent_score));
        Ok(out)
    }

    pub async fn statistics(&self, tenant_id: Uuid) -> Result<RiskStatistics, ServiceError> {
        let rows = self.repo.list(tenant_id).await?;
        Ok(RiskStatistics::from_risks(&rows, &self.cfg))
    }

    pub async fn heatmap(&self, tenant_id: Uuid) -> Result<Vec<HeatCell>, ServiceError> {
        Ok(heatmap(&self.repo.list(tenant_id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::repository::mock::MockRiskRepository;

    fn svc() -> RiskService<MockRiskRepository> {
        RiskService::new(Arc::new(MockRiskRepository::default()), RiskScoringConfig::default())
    }

    fn input(l: i32, i: i32) -> RiskInput {
        RiskInput {
            title: format!("Risk {l}x{i}"),
            description: "Something can go wrong".into(),
            category: "Operational".into(),
            likelihood: l,
            impact: i,
            owner: "ops".into(),
            mitigation_strategy: Some("Backups".into()),
            due_date: None,
        }
    }

    #[tokio::test]
    async fn full_lifecycle_through_mitigation() {
        let svc = svc();
        let t = Uuid::new_v4();
        let r = svc.create(t, "alice", input(4, 5)).await.unwrap();
        assert_eq!(r.level, RiskLevel::Critical);
        assert_eq!(r.risk.created_by, "alice");

        svc.start_assessment(t, r.risk.id).await.unwrap();
        svc.submit_for_decision(t, r.risk.id).await.unwrap();
        svc.reject_acceptance(t, r.risk.id).await.unwrap();
        let m = svc.mitigate(t, r.risk.id, "Added WAF").await.unwrap();
        assert_eq!(m.risk.status, "Mitigated");
        assert_eq!(m.risk.mitigation_strategy.as_deref(), Some("Added WAF"));
        let c = svc.close(t, r.risk.id).await.unwrap();
        assert_eq!(c.risk.status, "Closed");
        let re = svc.reopen(t, r.risk.id).await.unwrap();
        assert_eq!(re.risk.status, "Identified");
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_and_not_persisted() {
        let svc = svc();
        let t = Uuid::new_v4();
        let r = svc.create(t, "alice", input(2, 2)).await.unwrap();
        let err = svc.accept(t, r.risk.id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        assert_eq!(svc.get(t, r.risk.id).await.unwrap().risk.status, "Identified");
    }

    #[tokio::test]
    async fn mitigate_requires_details() {
        let svc = svc();
        let t = Uuid::new_v4();
        let r = svc.create(t, "a", input(1, 1)).await.unwrap();
        assert_eq!(svc.mitigate(t, r.risk.id, " ").await.unwrap_err().code(), "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn tenant_isolation() {
        let svc = svc();
        let r = svc.create(Uuid::new_v4(), "a", input(1, 2)).await.unwrap();
        let other = Uuid::new_v4();
        assert!(matches!(svc.get(other, r.risk.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(other, r.risk.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_rescores() {
        let svc = svc();
        let t = Uuid::new_v4();
        let r = svc.create(t, "a", input(1, 2)).await.unwrap();
        let u = svc.update(t, r.risk.id, input(3, 3)).await.unwrap();
        assert_eq!(u.risk.inherent_score, 9);
        assert_eq!(u.level, RiskLevel::Medium);
        assert_eq!(u.appetite_score, 36);
    }

    #[tokio::test]
    async fn filters_statistics_and_heatmap() {
        let svc = svc();
        let t = Uuid::new_v4();
        let a = svc.create(t, "a", input(5, 5)).await.unwrap();
        svc.create(t, "a", input(3, 4)).await.unwrap();
        let mut other = input(1, 1);
        other.category = "Financial".into();
        svc.create(t, "a", other).await.unwrap();
        svc.start_assessment(t, a.risk.id).await.unwrap();

        let fin = svc.list(t, &RiskFilter { category: Some("financial".into()), ..Default::default() }).await.unwrap();
        assert_eq!(fin.len(), 1);
        let assessing = svc
            .list(t, &RiskFilter { status: Some(RiskStatus::UnderAssessment), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(assessing.len(), 1);

        let high = svc.high_risks(t).await.unwrap();
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].risk.inherent_score, 25);

        let stats = svc.statistics(t).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!((stats.critical, stats.high, stats.medium, stats.low), (1, 1, 0, 1));
        assert_eq!(stats.open, 3);

        let map = svc.heatmap(t).await.unwrap();
        assert_eq!(map.len(), 25);
        assert_eq!(map.iter().map(|c| c.count).sum::<u64>(), 3);
        assert_eq!(map[24], HeatCell { likelihood: 5, impact: 5, count: 1 });
    }
}

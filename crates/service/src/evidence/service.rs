use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use configs::EvidenceConfig;
use models::{evidence, evidence_score, validate};

use super::domain::{
    control_compliance, evidence_number, ControlCompliance, EvidenceFilter, EvidenceInput, EvidenceStatistics,
    EvidenceStatus,
};
use super::repository::EvidenceRepository;
use crate::errors::ServiceError;
use crate::lifecycle::Lifecycle;
use crate::metrics;

/// Result of scoring: the stored score and the evidence after any status change.
#[derive(Clone, Debug, Serialize)]
pub struct ScoreOutcome {
    pub evidence: evidence::Model,
    pub score: evidence_score::Model,
}

pub struct EvidenceService<R: EvidenceRepository + ?Sized> {
    repo: Arc<R>,
    cfg: EvidenceConfig,
}

impl<R: EvidenceRepository + ?Sized> EvidenceService<R> {
    pub fn new(repo: Arc<R>, cfg: EvidenceConfig) -> Self { Self { repo, cfg } }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<evidence::Model, ServiceError> {
        self.repo.find(tenant_id, id).await?.ok_or_else(|| ServiceError::not_found("evidence"))
    }

    /// Apply a guarded status change plus reviewer fields, then persist.
    async fn move_to(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: EvidenceStatus,
        reviewer: Option<&str>,
        comments: Option<String>,
    ) -> Result<evidence::Model, ServiceError> {
        let mut row = self.find(tenant_id, id).await?;
        let from: EvidenceStatus = row.status.parse()?;
        from.ensure_transition(to)?;
        if from == to && comments.is_none() {
            return Ok(row);
        }
        row.status = to.as_str().to_string();
        if let Some(r) = reviewer {
            row.reviewer = Some(r.to_string());
        }
        if comments.is_some() {
            row.review_comments = comments;
        }
        row.updated_at = Utc::now().into();
        let saved = self.repo.update(row).await?;
        if from != to {
            metrics::record_transition(EvidenceStatus::ENTITY, to.as_str());
        }
        info!(evidence_id = %id, from = %from, to = %to, "evidence_status_changed");
        Ok(saved)
    }

    /// Record new evidence as a `Draft`.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, title = %input.title))]
    pub async fn submit(&self, tenant_id: Uuid, by: &str, input: EvidenceInput) -> Result<evidence::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let row = evidence::Model {
            id: Uuid::new_v4(),
            tenant_id,
            control_id: input.control_id,
            evidence_number: evidence_number(now),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            evidence_type: input.evidence_type.trim().to_string(),
            file_url: input.file_url.filter(|u| !u.trim().is_empty()),
            status: EvidenceStatus::Draft.as_str().to_string(),
            submitted_by: by.to_string(),
            reviewer: None,
            review_comments: None,
            collected_at: input.collected_at.unwrap_or(now).into(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        let saved = self.repo.insert(row).await?;
        info!(evidence_id = %saved.id, number = %saved.evidence_number, "evidence_submitted");
        Ok(saved)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<evidence::Model, ServiceError> {
        self.find(tenant_id, id).await
    }

    pub async fn list(&self, tenant_id: Uuid, filter: &EvidenceFilter) -> Result<Vec<evidence::Model>, ServiceError> {
        Ok(self.repo.list(tenant_id).await?.into_iter().filter(|e| filter.matches(e)).collect())
    }

    pub async fn submit_for_review(&self, tenant_id: Uuid, id: Uuid) -> Result<evidence::Model, ServiceError> {
        self.move_to(tenant_id, id, EvidenceStatus::Submitted, None, None).await
    }

    pub async fn start_review(&self, tenant_id: Uuid, id: Uuid, reviewer: &str) -> Result<evidence::Model, ServiceError> {
        self.move_to(tenant_id, id, EvidenceStatus::InReview, Some(reviewer), None).await
    }

    pub async fn request_changes(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        reviewer: &str,
        comments: &str,
    ) -> Result<evidence::Model, ServiceError> {
        validate::required_text("comments", comments, 4000)?;
        self.move_to(tenant_id, id, EvidenceStatus::ChangesRequested, Some(reviewer), Some(comments.trim().to_string()))
            .await
    }

    /// Send evidence back into review after requested changes were made.
    pub async fn resubmit(&self, tenant_id: Uuid, id: Uuid, comments: Option<&str>) -> Result<evidence::Model, ServiceError> {
        let current: EvidenceStatus = self.find(tenant_id, id).await?.status.parse()?;
        if current != EvidenceStatus::ChangesRequested {
            return Err(ServiceError::InvalidTransition {
                entity: EvidenceStatus::ENTITY,
                from: current.to_string(),
                to: EvidenceStatus::InReview.to_string(),
                allowed: current.targets().iter().map(ToString::to_string).collect(),
            });
        }
        let comments = comments.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
        self.move_to(tenant_id, id, EvidenceStatus::InReview, None, comments).await
    }

    /// Store a 0..=100 score as the final one; scoring evidence under review also decides it.
    #[instrument(skip(self, comments))]
    pub async fn score(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        by: &str,
        score: i32,
        comments: Option<&str>,
    ) -> Result<ScoreOutcome, ServiceError> {
        validate::in_range("score", score, 0, 100)?;
        let mut row = self.find(tenant_id, id).await?;
        let from: EvidenceStatus = row.status.parse()?;
        let now = Utc::now().into();
        let to = if from == EvidenceStatus::InReview {
            if score >= self.cfg.min_score_to_accept {
                EvidenceStatus::Approved
            } else {
                EvidenceStatus::ChangesRequested
            }
        } else {
            from
        };
        if to != from {
            row.status = to.as_str().to_string();
            row.reviewer = Some(by.to_string());
            row.updated_at = now;
        }
        let entry = evidence_score::Model {
            id: Uuid::new_v4(),
            evidence_id: id,
            score,
            is_final: true,
            comments: comments.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string),
            scored_by: by.to_string(),
            scored_at: now,
        };
        let (evidence, score) = self.repo.save_score(row, entry).await?;
        if to != from {
            metrics::record_transition(EvidenceStatus::ENTITY, to.as_str());
        }
        info!(evidence_id = %id, score = score.score, status = %to, "evidence_scored");
        Ok(ScoreOutcome { evidence, score })
    }

    pub async fn approve(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        reviewer: &str,
        comments: Option<&str>,
    ) -> Result<evidence::Model, ServiceError> {
        let comments = comments.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
        self.move_to(tenant_id, id, EvidenceStatus::Approved, Some(reviewer), comments).await
    }

    pub async fn reject(&self, tenant_id: Uuid, id: Uuid, reviewer: &str, reason: &str) -> Result<evidence::Model, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::Validation("rejection reason is required".into()));
        }
        self.move_to(tenant_id, id, EvidenceStatus::Rejected, Some(reviewer), Some(reason.trim().to_string())).await
    }

    pub async fn archive(&self, tenant_id: Uuid, id: Uuid) -> Result<evidence::Model, ServiceError> {
        self.move_to(tenant_id, id, EvidenceStatus::Archived, None, None).await
    }

    pub async fn score_history(&self, tenant_id: Uuid, id: Uuid) -> Result<Vec<evidence_score::Model>, ServiceError> {
        self.find(tenant_id, id).await?;
        self.repo.scores(id).await
    }

    pub async fn control_compliance(&self, tenant_id: Uuid, control_id: Uuid) -> Result<ControlCompliance, ServiceError> {
        let items: Vec<evidence::Model> =
            self.repo.list(tenant_id).await?.into_iter().filter(|e| e.control_id == Some(control_id)).collect();
        let ids: Vec<Uuid> = items.iter().map(|e| e.id).collect();
        let scores = self.repo.final_scores(&ids).await?;
        Ok(control_compliance(control_id, &items, &scores))
    }

    pub async fn statistics(&self, tenant_id: Uuid) -> Result<EvidenceStatistics, ServiceError> {
        let items = self.repo.list(tenant_id).await?;
        let ids: Vec<Uuid> = items.iter().map(|e| e.id).collect();
        let scores = self.repo.final_scores(&ids).await?;
        Ok(EvidenceStatistics::compute(&items, &scores, Utc::now(), self.cfg.review_sla_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::domain::ComplianceStatus;
    use crate::evidence::repository::mock::MockEvidenceRepository;

    fn svc() -> EvidenceService<MockEvidenceRepository> {
        EvidenceService::new(Arc::new(MockEvidenceRepository::default()), EvidenceConfig::default())
    }

    fn input(control_id: Option<Uuid>) -> EvidenceInput {
        EvidenceInput {
            control_id,
            title: "Firewall rule review".into(),
            description: "Export of reviewed rules".into(),
            evidence_type: "Document".into(),
            file_url: Some("https://files.example.com/fw.pdf".into()),
            collected_at: None,
        }
    }

    async fn in_review(svc: &EvidenceService<MockEvidenceRepository>, t: Uuid, control: Option<Uuid>) -> Uuid {
        let e = svc.submit(t, "owner", input(control)).await.unwrap();
        svc.submit_for_review(t, e.id).await.unwrap();
        svc.start_review(t, e.id, "rev").await.unwrap();
        e.id
    }

    #[tokio::test]
    async fn draft_to_approved_by_score() {
        let svc = svc();
        let t = Uuid::new_v4();
        let e = svc.submit(t, "owner", input(None)).await.unwrap();
        assert_eq!(e.status, "Draft");
        assert!(e.evidence_number.starts_with("EV-"));

        let id = in_review(&svc, t, None).await;
        let out = svc.score(t, id, "rev", 85, Some("good")).await.unwrap();
        assert_eq!(out.evidence.status, "Approved");
        assert!(out.score.is_final);
        assert_eq!(svc.archive(t, id).await.unwrap().status, "Archived");
        assert_eq!(svc.approve(t, id, "rev", None).await.unwrap_err().code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn low_score_requests_changes_and_supersedes_history() {
        let svc = svc();
        let t = Uuid::new_v4();
        let id = in_review(&svc, t, None).await;
        let out = svc.score(t, id, "rev", 40, None).await.unwrap();
        assert_eq!(out.evidence.status, "ChangesRequested");

        svc.resubmit(t, id, Some("fixed")).await.unwrap();
        svc.score(t, id, "rev", 75, None).await.unwrap();
        let history = svc.score_history(t, id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, 75);
        assert!(history[0].is_final);
        assert!(!history[1].is_final);
    }

    #[tokio::test]
    async fn score_out_of_range_and_required_reason() {
        let svc = svc();
        let t = Uuid::new_v4();
        let id = in_review(&svc, t, None).await;
        assert_eq!(svc.score(t, id, "rev", 101, None).await.unwrap_err().code(), "VALIDATION_FAILED");
        assert_eq!(svc.reject(t, id, "rev", " ").await.unwrap_err().code(), "VALIDATION_FAILED");
        let r = svc.reject(t, id, "rev", "Blurry scan").await.unwrap();
        assert_eq!(r.review_comments.as_deref(), Some("Blurry scan"));
        assert_eq!(svc.submit_for_review(t, id).await.unwrap().status, "Submitted");
    }

    #[tokio::test]
    async fn resubmit_only_from_changes_requested() {
        let svc = svc();
        let t = Uuid::new_v4();
        let e = svc.submit(t, "owner", input(None)).await.unwrap();
        let err = svc.resubmit(t, e.id, None).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn compliance_and_statistics() {
        let svc = svc();
        let t = Uuid::new_v4();
        let control = Uuid::new_v4();
        assert_eq!(svc.control_compliance(t, control).await.unwrap().status, ComplianceStatus::NotStarted);

        let a = in_review(&svc, t, Some(control)).await;
        assert_eq!(svc.control_compliance(t, control).await.unwrap().status, ComplianceStatus::InProgress);
        svc.score(t, a, "rev", 95, None).await.unwrap();
        assert_eq!(svc.control_compliance(t, control).await.unwrap().status, ComplianceStatus::Compliant);

        let listed = svc.list(t, &EvidenceFilter { control_id: Some(control), ..Default::default() }).await.unwrap();
        assert_eq!(listed.len(), 1);

        let stats = svc.statistics(t).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.average_score, 95.0);
        assert!(matches!(svc.get(Uuid::new_v4(), a).await, Err(ServiceError::NotFound(_))));
    }
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{evidence, evidence_score, validate};

use crate::errors::ServiceError;
use crate::lifecycle::{fold_status, Lifecycle};

const COMPLIANT_MIN: f64 = 90.0;
const PARTIAL_MIN: f64 = 70.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EvidenceStatus {
    Draft,
    Submitted,
    InReview,
    ChangesRequested,
    Approved,
    Rejected,
    Archived,
}

impl EvidenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceStatus::Draft => "Draft",
            EvidenceStatus::Submitted => "Submitted",
            EvidenceStatus::InReview => "InReview",
            EvidenceStatus::ChangesRequested => "ChangesRequested",
            EvidenceStatus::Approved => "Approved",
            EvidenceStatus::Rejected => "Rejected",
            EvidenceStatus::Archived => "Archived",
        }
    }

    /// Waiting on a reviewer.
    pub fn is_pending_review(self) -> bool { matches!(self, EvidenceStatus::Submitted | EvidenceStatus::InReview) }
}

impl fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for EvidenceStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match fold_status(s).as_str() {
            "draft" => EvidenceStatus::Draft,
            "submitted" => EvidenceStatus::Submitted,
            "inreview" | "underreview" => EvidenceStatus::InReview,
            "changesrequested" => EvidenceStatus::ChangesRequested,
            "approved" | "verified" => EvidenceStatus::Approved,
            "rejected" => EvidenceStatus::Rejected,
            "archived" => EvidenceStatus::Archived,
            _ => return Err(ServiceError::Validation(format!("unknown evidence status '{s}'"))),
        };
        Ok(status)
    }
}

impl TryFrom<String> for EvidenceStatus {
    type Error = ServiceError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<EvidenceStatus> for String {
    fn from(s: EvidenceStatus) -> Self { s.as_str().to_string() }
}

impl Lifecycle for EvidenceStatus {
    const ENTITY: &'static str = "evidence";

    fn targets(self) -> &'static [Self] {
        use EvidenceStatus::*;
        match self {
            Draft => &[Submitted],
            Submitted => &[InReview, Approved, Rejected],
            InReview => &[Approved, Rejected, ChangesRequested],
            ChangesRequested => &[Submitted, InReview],
            Approved => &[Archived],
            Rejected => &[Submitted],
            Archived => &[],
        }
    }
}

/// `EV-YYYYMMDD-XXXXXX` where the suffix is six upper-case hex digits.
pub fn evidence_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("EV-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

#[derive(Clone, Debug, Deserialize)]
pub struct EvidenceInput {
    pub control_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub evidence_type: String,
    pub file_url: Option<String>,
    /// Defaults to submission time.
    pub collected_at: Option<DateTime<Utc>>,
}

impl EvidenceInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate::required_text("title", &self.title, 200)?;
        validate::required_text("description", &self.description, 4000)?;
        validate::required_text("evidence_type", &self.evidence_type, 50)?;
        if let Some(url) = &self.file_url {
            validate::optional_text("file_url", url, 1000)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EvidenceFilter {
    pub control_id: Option<Uuid>,
    pub status: Option<EvidenceStatus>,
}

impl EvidenceFilter {
    pub fn matches(&self, e: &evidence::Model) -> bool {
        self.control_id.map_or(true, |c| e.control_id == Some(c))
            && self.status.map_or(true, |s| e.status.parse::<EvidenceStatus>().ok() == Some(s))
    }
}

fn status_of(e: &evidence::Model) -> Option<EvidenceStatus> { e.status.parse().ok() }

fn mean(scores: impl Iterator<Item = i32>) -> Option<f64> {
    let (sum, n) = scores.fold((0i64, 0u32), |(s, n), v| (s + i64::from(v), n + 1));
    (n > 0).then(|| sum as f64 / f64::from(n))
}

fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceStatus {
    NotStarted,
    InProgress,
    Compliant,
    PartiallyCompliant,
    NonCompliant,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ControlCompliance {
    pub control_id: Uuid,
    pub status: ComplianceStatus,
    pub evidence_count: u64,
    pub approved_count: u64,
    pub average_score: f64,
}

/// Derive a control's compliance from its evidence and their final scores.
pub fn control_compliance(
    control_id: Uuid,
    evidence: &[evidence::Model],
    final_scores: &[evidence_score::Model],
) -> ControlCompliance {
    let approved: Vec<Uuid> = evidence
        .iter()
        .filter(|e| status_of(e) == Some(EvidenceStatus::Approved))
        .map(|e| e.id)
        .collect();
    let avg = mean(
        final_scores
            .iter()
            .filter(|s| s.is_final && approved.contains(&s.evidence_id))
            .map(|s| s.score),
    )
    .unwrap_or(0.0);

    let status = if evidence.is_empty() {
        ComplianceStatus::NotStarted
    } else if approved.is_empty() {
        ComplianceStatus::InProgress
    } else if avg >= COMPLIANT_MIN {
        ComplianceStatus::Compliant
    } else if avg >= PARTIAL_MIN {
        ComplianceStatus::PartiallyCompliant
    } else {
        ComplianceStatus::NonCompliant
    };
    ControlCompliance {
        control_id,
        status,
        evidence_count: evidence.len() as u64,
        approved_count: approved.len() as u64,
        average_score: round2(avg),
    }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct EvidenceStatistics {
    pub total: u64,
    pub draft: u64,
    pub submitted: u64,
    pub in_review: u64,
    pub changes_requested: u64,
    pub approved: u64,
    pub rejected: u64,
    pub archived: u64,
    pub average_score: f64,
    pub pending_review: u64,
    pub overdue_review: u64,
}

impl EvidenceStatistics {
    /// Review is overdue once evidence has waited more than `sla_days` since collection.
    pub fn compute(
        evidence: &[evidence::Model],
        final_scores: &[evidence_score::Model],
        now: DateTime<Utc>,
        sla_days: i64,
    ) -> Self {
        let mut s = EvidenceStatistics { total: evidence.len() as u64, ..Default::default() };
        for e in evidence {
            let Some(status) = status_of(e) else { continue };
            match status {
                EvidenceStatus::Draft => s.draft += 1,
                EvidenceStatus::Submitted => s.submitted += 1,
                EvidenceStatus::InReview => s.in_review += 1,
                EvidenceStatus::ChangesRequested => s.changes_requested += 1,
                EvidenceStatus::Approved => s.approved += 1,
                EvidenceStatus::Rejected => s.rejected += 1,
                EvidenceStatus::Archived => s.archived += 1,
            }
            if status.is_pending_review() {
                s.pending_review += 1;
                if (now - e.collected_at.with_timezone(&Utc)).num_seconds() > sla_days * 86_400 {
                    s.overdue_review += 1;
                }
            }
        }
        s.average_score = mean(final_scores.iter().filter(|x| x.is_final).map(|x| x.score)).map(round2).unwrap_or(0.0);
        s
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn evidence(status: EvidenceStatus, control_id: Option<Uuid>, age_days: i64) -> evidence::Model {
        let now = Utc::now();
        evidence::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            control_id,
            evidence_number: evidence_number(now),
            title: "Access review".into(),
            description: "Quarterly user access review".into(),
            evidence_type: "Document".into(),
            file_url: None,
            status: status.as_str().into(),
            submitted_by: "auditor".into(),
            reviewer: None,
            review_comments: None,
            collected_at: (now - chrono::Duration::days(age_days)).into(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    pub fn score(evidence_id: Uuid, score: i32, is_final: bool) -> evidence_score::Model {
        evidence_score::Model {
            id: Uuid::new_v4(),
            evidence_id,
            score,
            is_final,
            comments: None,
            scored_by: "reviewer".into(),
            scored_at: Utc::now().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{evidence, score};
    use super::*;

    #[test]
    fn number_format() {
        let n = evidence_number("2026-03-09T10:00:00Z".parse().unwrap());
        assert!(n.starts_with("EV-20260309-"));
        let suffix = &n[12..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn transition_table() {
        use EvidenceStatus::*;
        assert!(Draft.can_transition(Submitted));
        assert!(!Draft.can_transition(Approved));
        assert!(Submitted.can_transition(Approved));
        assert!(ChangesRequested.can_transition(InReview));
        assert!(Rejected.can_transition(Submitted));
        assert!(Archived.is_terminal());
        assert!(!Archived.can_transition(Draft));
        assert_eq!("in review".parse::<EvidenceStatus>().unwrap(), InReview);
    }

    #[test]
    fn compliance_levels() {
        let control = Uuid::new_v4();
        assert_eq!(control_compliance(control, &[], &[]).status, ComplianceStatus::NotStarted);

        let pending = evidence(EvidenceStatus::Submitted, Some(control), 0);
        assert_eq!(control_compliance(control, &[pending.clone()], &[]).status, ComplianceStatus::InProgress);

        let a = evidence(EvidenceStatus::Approved, Some(control), 0);
        let b = evidence(EvidenceStatus::Approved, Some(control), 0);
        let all = vec![pending, a.clone(), b.clone()];
        let c = control_compliance(control, &all, &[score(a.id, 95, true), score(b.id, 85, true), score(b.id, 10, false)]);
        assert_eq!(c.status, ComplianceStatus::Compliant);
        assert_eq!(c.average_score, 90.0);
        assert_eq!(c.approved_count, 2);

        let c = control_compliance(control, &all, &[score(a.id, 80, true), score(b.id, 70, true)]);
        assert_eq!(c.status, ComplianceStatus::PartiallyCompliant);
        let c = control_compliance(control, &all, &[score(a.id, 50, true)]);
        assert_eq!(c.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn thresholds_use_unrounded_mean() {
        let control = Uuid::new_v4();
        let a = evidence(EvidenceStatus::Approved, Some(control), 0);
        // 249 x 90 + 89 over 250 scores is 89.996
        let mut scores: Vec<_> = (0..249).map(|_| score(a.id, 90, true)).collect();
        scores.push(score(a.id, 89, true));
        let c = control_compliance(control, &[a], &scores);
        assert_eq!(c.status, ComplianceStatus::PartiallyCompliant);
        assert_eq!(c.average_score, 90.0);
    }

    #[test]
    fn statistics_count_overdue_reviews() {
        let items = vec![
            evidence(EvidenceStatus::Submitted, None, 6),
            evidence(EvidenceStatus::InReview, None, 2),
            evidence(EvidenceStatus::Approved, None, 30),
            evidence(EvidenceStatus::Draft, None, 30),
        ];
        let scores = vec![score(items[2].id, 80, true), score(items[2].id, 40, false)];
        let s = EvidenceStatistics::compute(&items, &scores, Utc::now(), 5);
        assert_eq!(s.total, 4);
        assert_eq!(s.pending_review, 2);
        assert_eq!(s.overdue_review, 1);
        assert_eq!(s.average_score, 80.0);
        assert_eq!((s.draft, s.submitted, s.in_review, s.approved), (1, 1, 1, 1));
    }
}

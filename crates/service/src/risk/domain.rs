use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::types::LabelCount;
use configs::RiskScoringConfig;
use models::{risk, validate};

use crate::errors::ServiceError;
use crate::lifecycle::{fold_status, Lifecycle};

/// Category assumed for risks recorded without one.
pub const DEFAULT_CATEGORY: &str = "Operational";
const MAX_SCORE: i32 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskStatus {
    Identified,
    UnderAssessment,
    PendingDecision,
    Accepted,
    RequiresMitigation,
    Mitigated,
    Monitoring,
    Closed,
}

impl RiskStatus {
    pub const ALL: [RiskStatus; 8] = [
        RiskStatus::Identified,
        RiskStatus::UnderAssessment,
        RiskStatus::PendingDecision,
        RiskStatus::Accepted,
        RiskStatus::RequiresMitigation,
        RiskStatus::Mitigated,
        RiskStatus::Monitoring,
        RiskStatus::Closed,
    ];

    /// Stored/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskStatus::Identified => "Identified",
            RiskStatus::UnderAssessment => "Under Assessment",
            RiskStatus::PendingDecision => "Pending Decision",
            RiskStatus::Accepted => "Accepted",
            RiskStatus::RequiresMitigation => "Requires Mitigation",
            RiskStatus::Mitigated => "Mitigated",
            RiskStatus::Monitoring => "Monitoring",
            RiskStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for RiskStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match fold_status(s).as_str() {
            "identified" | "new" | "open" => RiskStatus::Identified,
            "underassessment" | "assessing" => RiskStatus::UnderAssessment,
            "pendingdecision" | "pending" => RiskStatus::PendingDecision,
            "accepted" => RiskStatus::Accepted,
            "requiresmitigation" | "mitigation" | "mitigationrequired" => RiskStatus::RequiresMitigation,
            "mitigated" => RiskStatus::Mitigated,
            "monitoring" | "monitored" => RiskStatus::Monitoring,
            "closed" => RiskStatus::Closed,
            _ => return Err(ServiceError::Validation(format!("unknown risk status '{s}'"))),
        };
        Ok(status)
    }
}

impl TryFrom<String> for RiskStatus {
    type Error = ServiceError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<RiskStatus> for String {
    fn from(s: RiskStatus) -> Self { s.as_str().to_string() }
}

impl Lifecycle for RiskStatus {
    const ENTITY: &'static str = "risk";

    fn targets(self) -> &'static [Self] {
        use RiskStatus::*;
        match self {
            Identified => &[UnderAssessment],
            UnderAssessment => &[PendingDecision],
            PendingDecision => &[Accepted, RequiresMitigation],
            Accepted => &[Monitoring, Closed],
            RequiresMitigation => &[Mitigated],
            Mitigated => &[Monitoring, Closed],
            Monitoring => &[Closed, RequiresMitigation],
            Closed => &[Identified],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: i32, cfg: &RiskScoringConfig) -> Self {
        if score >= cfg.critical_min {
            RiskLevel::Critical
        } else if score >= cfg.high_min {
            RiskLevel::High
        } else if score >= cfg.medium_min {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(ServiceError::Validation(format!("unknown risk level '{s}'"))),
        }
    }
}

pub fn inherent_score(likelihood: i32, impact: i32) -> i32 { likelihood * impact }

/// Map a 1..=25 score onto the 0..=100 appetite scale.
pub fn appetite_score(score: i32) -> i32 {
    (f64::from(score) * 100.0 / f64::from(MAX_SCORE)).round() as i32
}

#[derive(Clone, Debug, Deserialize)]
pub struct RiskInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub likelihood: i32,
    pub impact: i32,
    pub owner: String,
    pub mitigation_strategy: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl RiskInput {
    pub fn validate(&self, cfg: &RiskScoringConfig) -> Result<(), ServiceError> {
        validate::required_text("title", &self.title, 200)?;
        validate::required_text("description", &self.description, 2000)?;
        validate::required_text("category", &self.category, 100)?;
        validate::required_text("owner", &self.owner, 100)?;
        validate::in_range("likelihood", self.likelihood, 1, 5)?;
        validate::in_range("impact", self.impact, 1, 5)?;
        let score = inherent_score(self.likelihood, self.impact);
        let has_plan = self.mitigation_strategy.as_deref().is_some_and(|m| !m.trim().is_empty());
        if score >= cfg.mitigation_required_min && !has_plan {
            return Err(ServiceError::Validation(format!(
                "risks scoring {} or more require a mitigation strategy",
                cfg.mitigation_required_min
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RiskFilter {
    pub category: Option<String>,
    pub status: Option<RiskStatus>,
    pub level: Option<RiskLevel>,
}

/// A stored risk plus its derived level and appetite score.
#[derive(Clone, Debug, Serialize)]
pub struct RiskView {
    #[serde(flatten)]
    pub risk: risk::Model,
    pub level: RiskLevel,
    pub appetite_score: i32,
}

impl RiskView {
    pub fn new(risk: risk::Model, cfg: &RiskScoringConfig) -> Self {
        let level = RiskLevel::from_score(risk.inherent_score, cfg);
        let appetite_score = appetite_score(risk.inherent_score);
        Self { risk, level, appetite_score }
    }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RiskStatistics {
    pub total: u64,
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub mitigated: u64,
    pub open: u64,
    pub by_status: Vec<LabelCount>,
}

impl RiskStatistics {
    pub fn from_risks(risks: &[risk::Model], cfg: &RiskScoringConfig) -> Self {
        let mut s = RiskStatistics { total: risks.len() as u64, ..Default::default() };
        for r in risks {
            match RiskLevel::from_score(r.inherent_score, cfg) {
                RiskLevel::Critical => s.critical += 1,
                RiskLevel::High => s.high += 1,
                RiskLevel::Medium => s.medium += 1,
                RiskLevel::Low => s.low += 1,
            }
            match r.status.parse::<RiskStatus>() {
                Ok(RiskStatus::Mitigated) => s.mitigated += 1,
                Ok(RiskStatus::Closed) => {}
                _ => s.open += 1,
            }
        }
        s.by_status = RiskStatus::ALL
            .iter()
            .map(|st| {
                let n = risks.iter().filter(|r| r.status.parse::<RiskStatus>().ok() == Some(*st)).count();
                LabelCount::new(st.as_str(), n as u64)
            })
            .filter(|c| c.count > 0)
            .collect();
        s
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct HeatCell {
    pub likelihood: i32,
    pub impact: i32,
    pub count: u64,
}

/// 5x5 likelihood x impact counts, row-major by likelihood.
pub fn heatmap(risks: &[risk::Model]) -> Vec<HeatCell> {
    let mut grid = [[0u64; 5]; 5];
    for r in risks {
        if (1..=5).contains(&r.likelihood) && (1..=5).contains(&r.impact) {
            grid[(r.likelihood - 1) as usize][(r.impact - 1) as usize] += 1;
        }
    }
    let mut cells = Vec::with_capacity(25);
    for (l, row) in grid.iter().enumerate() {
        for (i, count) in row.iter().enumerate() {
            cells.push(HeatCell { likelihood: l as i32 + 1, impact: i as i32 + 1, count: *count });
        }
    }
    cells
}

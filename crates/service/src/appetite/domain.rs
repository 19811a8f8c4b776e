use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{risk, risk_appetite_setting as setting, validate};

use crate::errors::ServiceError;
use crate::risk::domain::{appetite_score, DEFAULT_CATEGORY};

/// Categories offered to users when defining appetite.
pub const CATEGORIES: [&str; 10] = [
    "Strategic", "Operational", "Financial", "Compliance", "Reputational",
    "Technology", "Legal", "Market", "Credit", "Liquidity",
];

const UNSET_TARGET: i32 = 50;
const DEFAULT_REMINDER_DAYS: i32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppetiteStatus {
    UnderControlled,
    WithinAppetite,
    OnTarget,
    AtTolerance,
    Exceeded,
}

impl AppetiteStatus {
    pub fn description(self) -> &'static str {
        match self {
            AppetiteStatus::UnderControlled => "Under-controlled (below minimum threshold)",
            AppetiteStatus::OnTarget => "On target",
            AppetiteStatus::WithinAppetite => "Within acceptable range",
            AppetiteStatus::AtTolerance => "Approaching tolerance limits",
            AppetiteStatus::Exceeded => "Exceeds maximum acceptable level",
        }
    }

    pub fn recommended_action(self) -> Option<&'static str> {
        match self {
            AppetiteStatus::UnderControlled => Some("Review if controls are cost-effective; consider reducing controls"),
            AppetiteStatus::AtTolerance => Some("Monitor closely; prepare mitigation plan"),
            AppetiteStatus::Exceeded => Some("Immediate action required; implement additional controls"),
            AppetiteStatus::WithinAppetite | AppetiteStatus::OnTarget => None,
        }
    }

    pub fn requires_action(self) -> bool {
        matches!(self, AppetiteStatus::Exceeded | AppetiteStatus::AtTolerance)
    }
}

/// Place a normalized 0..=100 score within a setting's band.
///
/// The tolerance zone is the top `tolerance_percentage` of the maximum.
pub fn evaluate(s: &setting::Model, score: i32) -> AppetiteStatus {
    let max = s.maximum_risk_score;
    if score < s.minimum_risk_score {
        AppetiteStatus::UnderControlled
    } else if score > max {
        AppetiteStatus::Exceeded
    } else if score == s.target_risk_score {
        AppetiteStatus::OnTarget
    } else if f64::from(score) >= f64::from(max) - f64::from(max) * f64::from(s.tolerance_percentage) / 100.0 {
        AppetiteStatus::AtTolerance
    } else {
        AppetiteStatus::WithinAppetite
    }
}

fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }

/// Risk category with blanks folded into the default one.
pub(crate) fn category_of(r: &risk::Model) -> &str {
    let c = r.category.trim();
    if c.is_empty() { DEFAULT_CATEGORY } else { c }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SettingInput {
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub minimum_risk_score: i32,
    pub maximum_risk_score: i32,
    pub target_risk_score: i32,
    pub tolerance_percentage: i32,
    pub impact_threshold: i32,
    pub likelihood_threshold: i32,
    pub expiry_date: Option<DateTime<Utc>>,
    pub review_reminder_days: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl SettingInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate::required_text("category", &self.category, 100)?;
        validate::required_text("name", &self.name, 200)?;
        validate::in_range("minimum_risk_score", self.minimum_risk_score, 0, 100)?;
        validate::in_range("maximum_risk_score", self.maximum_risk_score, 0, 100)?;
        validate::in_range("target_risk_score", self.target_risk_score, 0, 100)?;
        validate::in_range("tolerance_percentage", self.tolerance_percentage, 0, 100)?;
        validate::in_range("impact_threshold", self.impact_threshold, 1, 5)?;
        validate::in_range("likelihood_threshold", self.likelihood_threshold, 1, 5)?;
        if self.minimum_risk_score > self.maximum_risk_score {
            return Err(ServiceError::Validation("minimum risk score cannot be greater than maximum".into()));
        }
        if !(self.minimum_risk_score..=self.maximum_risk_score).contains(&self.target_risk_score) {
            return Err(ServiceError::Validation("target risk score must be between minimum and maximum".into()));
        }
        if let Some(days) = self.review_reminder_days {
            validate::in_range("review_reminder_days", days, 0, 365)?;
        }
        Ok(())
    }

    pub fn reminder_days(&self) -> i32 { self.review_reminder_days.unwrap_or(DEFAULT_REMINDER_DAYS) }
}

#[derive(Clone, Debug, Serialize)]
pub struct SettingView {
    #[serde(flatten)]
    pub setting: setting::Model,
    pub days_until_expiry: Option<i64>,
    pub is_expiring_soon: bool,
}

impl SettingView {
    pub fn new(setting: setting::Model, now: DateTime<Utc>) -> Self {
        let days_until_expiry = setting.expiry_date.map(|e| (e.with_timezone(&Utc) - now).num_days());
        let is_expiring_soon = days_until_expiry.is_some_and(|d| d <= i64::from(setting.review_reminder_days));
        Self { setting, days_until_expiry, is_expiring_soon }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Comparison {
    pub risk_id: Uuid,
    pub risk_title: String,
    pub category: String,
    pub current_risk_score: i32,
    pub target_risk_score: i32,
    pub minimum_risk_score: i32,
    pub maximum_risk_score: i32,
    pub status: AppetiteStatus,
    pub status_description: String,
    pub deviation_from_target: i32,
    pub deviation_percentage: f64,
    pub requires_action: bool,
    pub recommended_action: Option<String>,
}

/// Compare every risk against the active setting of its category, largest deviation first.
pub fn compare(risks: &[risk::Model], settings: &HashMap<String, setting::Model>) -> Vec<Comparison> {
    let mut out: Vec<Comparison> = risks
        .iter()
        .map(|r| {
            let category = category_of(r).to_string();
            let score = appetite_score(r.inherent_score);
            match settings.get(&category) {
                Some(s) => {
                    let status = evaluate(s, score);
                    let deviation = score - s.target_risk_score;
                    let pct = if s.target_risk_score > 0 {
                        round2(f64::from(deviation) * 100.0 / f64::from(s.target_risk_score))
                    } else {
                        0.0
                    };
                    Comparison {
                        risk_id: r.id,
                        risk_title: r.title.clone(),
                        category,
                        current_risk_score: score,
                        target_risk_score: s.target_risk_score,
                        minimum_risk_score: s.minimum_risk_score,
                        maximum_risk_score: s.maximum_risk_score,
                        status,
                        status_description: status.description().to_string(),
                        deviation_from_target: deviation,
                        deviation_percentage: pct,
                        requires_action: status.requires_action(),
                        recommended_action: status.recommended_action().map(str::to_string),
                    }
                }
                None => Comparison {
                    risk_id: r.id,
                    risk_title: r.title.clone(),
                    category,
                    current_risk_score: score,
                    target_risk_score: UNSET_TARGET,
                    minimum_risk_score: 0,
                    maximum_risk_score: 100,
                    status: AppetiteStatus::WithinAppetite,
                    status_description: "No appetite defined for category".into(),
                    deviation_from_target: score - UNSET_TARGET,
                    deviation_percentage: f64::from((score - UNSET_TARGET) * 2),
                    requires_action: false,
                    recommended_action: Some("Define risk appetite for this category".into()),
                },
            }
        })
        .collect();
    out.sort_by_key(|c| std::cmp::Reverse(c.deviation_from_target.abs()));
    out
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub total_risks: u64,
    pub within_appetite: u64,
    pub exceeding_appetite: u64,
    pub average_risk_score: f64,
    pub target_risk_score: i32,
    pub compliance_percentage: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AppetiteSummary {
    pub tenant_id: Uuid,
    pub total_risks: u64,
    pub risks_within_appetite: u64,
    pub risks_at_tolerance: u64,
    pub risks_exceeding_appetite: u64,
    pub risks_under_controlled: u64,
    pub overall_compliance_percentage: f64,
    pub by_category: Vec<CategorySummary>,
}

#[derive(Default)]
struct CategoryTally {
    total: u64,
    within: u64,
    exceeding: u64,
    score_sum: f64,
}

pub fn summarize(tenant_id: Uuid, risks: &[risk::Model], settings: &HashMap<String, setting::Model>) -> AppetiteSummary {
    let mut summary = AppetiteSummary {
        tenant_id,
        total_risks: risks.len() as u64,
        risks_within_appetite: 0,
        risks_at_tolerance: 0,
        risks_exceeding_appetite: 0,
        risks_under_controlled: 0,
        overall_compliance_percentage: 100.0,
        by_category: Vec::new(),
    };
    let mut tallies: BTreeMap<String, CategoryTally> = BTreeMap::new();

    for r in risks {
        let category = category_of(r);
        let score = appetite_score(r.inherent_score);
        let t = tallies.entry(category.to_string()).or_default();
        t.total += 1;
        t.score_sum += f64::from(score);

        match settings.get(category).map(|s| evaluate(s, score)) {
            Some(AppetiteStatus::Exceeded) => {
                summary.risks_exceeding_appetite += 1;
                t.exceeding += 1;
            }
            Some(AppetiteStatus::AtTolerance) => {
                summary.risks_at_tolerance += 1;
                t.within += 1;
            }
            Some(AppetiteStatus::UnderControlled) => {
                summary.risks_under_controlled += 1;
                t.within += 1;
            }
            _ => {
                summary.risks_within_appetite += 1;
                t.within += 1;
            }
        }
    }

    summary.by_category = tallies
        .into_iter()
        .map(|(category, t)| {
            let target = settings.get(&category).map_or(UNSET_TARGET, |s| s.target_risk_score);
            CategorySummary {
                total_risks: t.total,
                within_appetite: t.within,
                exceeding_appetite: t.exceeding,
                average_risk_score: if t.total > 0 { round2(t.score_sum / t.total as f64) } else { 0.0 },
                target_risk_score: target,
                compliance_percentage: if t.total > 0 { round2(t.within as f64 * 100.0 / t.total as f64) } else { 100.0 },
                category,
            }
        })
        .collect();

    if summary.total_risks > 0 {
        summary.overall_compliance_percentage = round2(
            (summary.risks_within_appetite + summary.risks_at_tolerance) as f64 * 100.0 / summary.total_risks as f64,
        );
    }
    summary
}


#[cfg(test)]
mod tests {
    use super::fixtures::{risk, setting};
    use super::*;

    #[test]
    fn evaluate_bands() {
        let s = setting("Operational", 20, 60, 40, 10);
        assert_eq!(evaluate(&s, 19), AppetiteStatus::UnderControlled);
        assert_eq!(evaluate(&s, 61), AppetiteStatus::Exceeded);
        assert_eq!(evaluate(&s, 40), AppetiteStatus::OnTarget);
        assert_eq!(evaluate(&s, 54), AppetiteStatus::AtTolerance);
        assert_eq!(evaluate(&s, 60), AppetiteStatus::AtTolerance);
        assert_eq!(evaluate(&s, 53), AppetiteStatus::WithinAppetite);
        assert_eq!(evaluate(&s, 20), AppetiteStatus::WithinAppetite);
    }

    #[test]
    fn input_validation() {
        let mut input = SettingInput {
            category: "Financial".into(),
            name: "FY".into(),
            description: None,
            minimum_risk_score: 10,
            maximum_risk_score: 60,
            target_risk_score: 30,
            tolerance_percentage: 10,
            impact_threshold: 3,
            likelihood_threshold: 3,
            expiry_date: None,
            review_reminder_days: None,
            is_active: true,
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.reminder_days(), 30);
        input.target_risk_score = 70;
        assert!(input.validate().is_err());
        input.target_risk_score = 30;
        input.minimum_risk_score = 61;
        assert!(input.validate().is_err());
        input.minimum_risk_score = 10;
        input.maximum_risk_score = 101;
        assert!(input.validate().is_err());
    }

    #[test]
    fn compare_uses_default_band_for_unset_category() {
        // Financial 5x5 -> 100; Legal 2x2 -> 16
        let settings = HashMap::from([("Financial".to_string(), setting("Financial", 0, 80, 40, 10))]);
        let risks = vec![risk("Legal", 2, 2), risk("Financial", 5, 5)];
        let out = compare(&risks, &settings);
        assert_eq!(out[0].category, "Financial");
        assert_eq!(out[0].status, AppetiteStatus::Exceeded);
        assert_eq!(out[0].deviation_from_target, 60);
        assert_eq!(out[0].deviation_percentage, 150.0);
        assert!(out[0].requires_action);

        let legal = &out[1];
        assert_eq!(legal.status, AppetiteStatus::WithinAppetite);
        assert_eq!(legal.target_risk_score, 50);
        assert_eq!(legal.deviation_percentage, -68.0);
        assert!(!legal.requires_action);
        assert_eq!(legal.recommended_action.as_deref(), Some("Define risk appetite for this category"));
    }

    #[test]
    fn zero_target_gives_zero_percentage() {
        let settings = HashMap::from([("Market".to_string(), setting("Market", 0, 100, 0, 0))]);
        let out = compare(&[risk("Market", 1, 1)], &settings);
        assert_eq!(out[0].deviation_percentage, 0.0);
    }

    #[test]
    fn blank_category_counts_as_operational() {
        let out = compare(&[risk(" ", 1, 1)], &HashMap::new());
        assert_eq!(out[0].category, "Operational");
    }

    #[test]
    fn summary_rolls_up_categories() {
        // 5x5 -> 100 exceeded, 3x3 -> 36 within, 1x1 -> 4 under-controlled
        let settings = HashMap::from([("Operational".to_string(), setting("Operational", 10, 60, 30, 10))]);
        let risks = vec![risk("Operational", 5, 5), risk("Operational", 3, 3), risk("Operational", 1, 1), risk("Legal", 2, 2)];
        let s = summarize(Uuid::nil(), &risks, &settings);
        assert_eq!(s.total_risks, 4);
        assert_eq!(s.risks_exceeding_appetite, 1);
        assert_eq!(s.risks_under_controlled, 1);
        assert_eq!(s.risks_within_appetite, 2);
        assert_eq!(s.overall_compliance_percentage, 50.0);

        let op = s.by_category.iter().find(|c| c.category == "Operational").unwrap();
        assert_eq!(op.total_risks, 3);
        assert_eq!(op.within_appetite, 2);
        assert_eq!(op.exceeding_appetite, 1);
        assert_eq!(op.average_risk_score, 46.67);
        assert_eq!(op.compliance_percentage, 66.67);
        let legal = s.by_category.iter().find(|c| c.category == "Legal").unwrap();
        assert_eq!(legal.target_risk_score, 50);
    }

    #[test]
    fn empty_summary_is_fully_compliant() {
        let s = summarize(Uuid::nil(), &[], &HashMap::new());
        assert_eq!(s.overall_compliance_percentage, 100.0);
        assert!(s.by_category.is_empty());
    }

    #[test]
    fn expiry_view() {
        let now = Utc::now();
        let mut s = setting("Credit", 0, 50, 25, 10);
        s.expiry_date = Some((now + chrono::Duration::days(10) + chrono::Duration::hours(1)).into());
        let v = SettingView::new(s.clone(), now);
        assert_eq!(v.days_until_expiry, Some(10));
        assert!(v.is_expiring_soon);
        s.expiry_date = None;
        let v = SettingView::new(s, now);
        assert!(!v.is_expiring_soon);
    }
}

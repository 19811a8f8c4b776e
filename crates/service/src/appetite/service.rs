use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use models::risk_appetite_setting as setting;

use super::domain::{category_of, compare, summarize, AppetiteSummary, Comparison, SettingInput, SettingView};
use super::repository::AppetiteRepository;
use crate::errors::ServiceError;
use crate::risk::repository::RiskRepository;

pub struct AppetiteService<A: AppetiteRepository + ?Sized, R: RiskRepository + ?Sized> {
    settings: Arc<A>,
    risks: Arc<R>,
}

impl<A: AppetiteRepository + ?Sized, R: RiskRepository + ?Sized> AppetiteService<A, R> {
    pub fn new(settings: Arc<A>, risks: Arc<R>) -> Self { Self { settings, risks } }

    fn view(s: setting::Model) -> SettingView { SettingView::new(s, Utc::now()) }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<setting::Model, ServiceError> {
        self.settings
            .find(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("risk appetite setting"))
    }

    /// Rejects a duplicate (category, name) pair and a second active setting for a category.
    async fn ensure_unique(
        &self,
        tenant_id: Uuid,
        skip: Option<Uuid>,
        category: &str,
        name: &str,
        active: bool,
    ) -> Result<(), ServiceError> {
        let others: Vec<setting::Model> = self
            .settings
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|s| Some(s.id) != skip && s.category.eq_ignore_ascii_case(category))
            .collect();
        if others.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(ServiceError::Conflict(format!("a setting named '{name}' already exists for {category}")));
        }
        if active && others.iter().any(|s| s.is_active) {
            return Err(ServiceError::Conflict(format!("an active risk appetite setting already exists for {category}")));
        }
        Ok(())
    }

    async fn active_by_category(&self, tenant_id: Uuid) -> Result<HashMap<String, setting::Model>, ServiceError> {
        Ok(self
            .settings
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .map(|s| (s.category.clone(), s))
            .collect())
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, category = %input.category))]
    pub async fn create(&self, tenant_id: Uuid, by: &str, input: SettingInput) -> Result<SettingView, ServiceError> {
        input.validate()?;
        let category = input.category.trim().to_string();
        let name = input.name.trim().to_string();
        self.ensure_unique(tenant_id, None, &category, &name, input.is_active).await?;
        let now = Utc::now().into();
        let row = setting::Model {
            id: Uuid::new_v4(),
            tenant_id,
            category,
            name,
            description: input.description.clone(),
            minimum_risk_score: input.minimum_risk_score,
            maximum_risk_score: input.maximum_risk_score,
            target_risk_score: input.target_risk_score,
            tolerance_percentage: input.tolerance_percentage,
            impact_threshold: input.impact_threshold,
            likelihood_threshold: input.likelihood_threshold,
            is_active: input.is_active,
            approved_by: None,
            approved_at: None,
            expiry_date: input.expiry_date.map(Into::into),
            review_reminder_days: input.reminder_days(),
            created_by: by.to_string(),
            created_at: now,
            updated_at: now,
        };
        let saved = self.settings.insert(row).await?;
        info!(setting_id = %saved.id, "risk_appetite_created");
        Ok(Self::view(saved))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<SettingView, ServiceError> {
        Ok(Self::view(self.find(tenant_id, id).await?))
    }

    pub async fn list(&self, tenant_id: Uuid, active_only: bool, category: Option<&str>) -> Result<Vec<SettingView>, ServiceError> {
        Ok(self
            .settings
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|s| !active_only || s.is_active)
            .filter(|s| category.map_or(true, |c| s.category.eq_ignore_ascii_case(c)))
            .map(Self::view)
            .collect())
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, setting_id = %id))]
    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: SettingInput) -> Result<SettingView, ServiceError> {
        input.validate()?;
        let mut row = self.find(tenant_id, id).await?;
        let category = input.category.trim().to_string();
        let name = input.name.trim().to_string();
        self.ensure_unique(tenant_id, Some(id), &category, &name, input.is_active).await?;
        row.category = category;
        row.name = name;
        row.description = input.description.clone();
        row.minimum_risk_score = input.minimum_risk_score;
        row.maximum_risk_score = input.maximum_risk_score;
        row.target_risk_score = input.target_risk_score;
        row.tolerance_percentage = input.tolerance_percentage;
        row.impact_threshold = input.impact_threshold;
        row.likelihood_threshold = input.likelihood_threshold;
        row.is_active = input.is_active;
        row.expiry_date = input.expiry_date.map(Into::into);
        row.review_reminder_days = input.reminder_days();
        row.updated_at = Utc::now().into();
        let saved = self.settings.update(row).await?;
        info!("risk_appetite_updated");
        Ok(Self::view(saved))
    }

    /// Record approval and activate the setting.
    #[instrument(skip(self))]
    pub async fn approve(&self, tenant_id: Uuid, id: Uuid, by: &str) -> Result<SettingView, ServiceError> {
        let mut row = self.find(tenant_id, id).await?;
        if !row.is_active {
            let clash = self
                .settings
                .list(tenant_id)
                .await?
                .into_iter()
                .any(|s| s.id != id && s.is_active && s.category.eq_ignore_ascii_case(&row.category));
            if clash {
                return Err(ServiceError::Conflict(format!(
                    "an active risk appetite setting already exists for {}",
                    row.category
                )));
            }
        }
        let now = Utc::now().into();
        row.approved_by = Some(by.to_string());
        row.approved_at = Some(now);
        row.is_active = true;
        row.updated_at = now;
        let saved = self.settings.update(row).await?;
        info!(setting_id = %id, approved_by = %by, "risk_appetite_approved");
        Ok(Self::view(saved))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !self.settings.delete(tenant_id, id).await? {
            return Err(ServiceError::not_found("risk appetite setting"));
        }
        info!(setting_id = %id, "risk_appetite_deleted");
        Ok(())
    }

    pub async fn compare(&self, tenant_id: Uuid, category: Option<&str>) -> Result<Vec<Comparison>, ServiceError> {
        let settings = self.active_by_category(tenant_id).await?;
        let risks: Vec<_> = self
            .risks
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|r| category.map_or(true, |c| category_of(r).eq_ignore_ascii_case(c.trim())))
            .collect();
        Ok(compare(&risks, &settings))
    }

    pub async fn summary(&self, tenant_id: Uuid) -> Result<AppetiteSummary, ServiceError> {
        let settings = self.active_by_category(tenant_id).await?;
        let risks = self.risks.list(tenant_id).await?;
        Ok(summarize(tenant_id, &risks, &settings))
    }
}

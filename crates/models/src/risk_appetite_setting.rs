use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tenant;

/// Tolerance band for one risk category; scores use the normalized 0..=100 scale.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "risk_appetite_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub minimum_risk_score: i32,
    pub maximum_risk_score: i32,
    pub target_risk_score: i32,
    pub tolerance_percentage: i32,
    pub impact_threshold: i32,
    pub likelihood_threshold: i32,
    pub is_active: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub expiry_date: Option<DateTimeWithTimeZone>,
    pub review_reminder_days: i32,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Tenant }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

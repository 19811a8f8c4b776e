use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{control, evidence_score, tenant};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evidence")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub control_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub evidence_number: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub evidence_type: String,
    pub file_url: Option<String>,
    pub status: String,
    pub submitted_by: String,
    pub reviewer: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_comments: Option<String>,
    pub collected_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Tenant, Control, Score }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into(),
            Relation::Control => Entity::belongs_to(control::Entity).from(Column::ControlId).to(control::Column::Id).into(),
            Relation::Score => Entity::has_many(evidence_score::Entity).into(),
        }
    }
}

impl Related<evidence_score::Entity> for Entity {
    fn to() -> RelationDef { Relation::Score.def() }
}

impl ActiveModelBehavior for ActiveModel {}

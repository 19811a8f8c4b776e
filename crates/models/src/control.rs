use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::framework;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "control")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub framework_id: Uuid,
    pub control_number: String,
    pub domain: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub requirement: String,
    pub control_type: String,
    pub maturity_level: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub evidence_requirements: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Framework }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Framework => Entity::belongs_to(framework::Entity).from(Column::FrameworkId).to(framework::Column::Id).into(),
        }
    }
}

impl Related<framework::Entity> for Entity {
    fn to() -> RelationDef { Relation::Framework.def() }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{control, regulator};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "framework")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub regulator_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub title: String,
    pub version: String,
    pub is_mandatory: bool,
    pub control_count: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Regulator, Control }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Regulator => Entity::belongs_to(regulator::Entity).from(Column::RegulatorId).to(regulator::Column::Id).into(),
            Relation::Control => Entity::has_many(control::Entity).into(),
        }
    }
}

impl Related<regulator::Entity> for Entity {
    fn to() -> RelationDef { Relation::Regulator.def() }
}

impl Related<control::Entity> for Entity {
    fn to() -> RelationDef { Relation::Control.def() }
}

impl ActiveModelBehavior for ActiveModel {}

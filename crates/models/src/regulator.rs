use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::framework;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "regulator")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub region_type: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Framework }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Framework => Entity::has_many(framework::Entity).into() }
    }
}

impl Related<framework::Entity> for Entity {
    fn to() -> RelationDef { Relation::Framework.def() }
}

impl ActiveModelBehavior for ActiveModel {}

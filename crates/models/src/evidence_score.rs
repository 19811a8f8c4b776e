use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::evidence;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evidence_score")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub evidence_id: Uuid,
    pub score: i32,
    pub is_final: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
    pub scored_by: String,
    pub scored_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Evidence }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Evidence => Entity::belongs_to(evidence::Entity).from(Column::EvidenceId).to(evidence::Column::Id).into(),
        }
    }
}

impl Related<evidence::Entity> for Entity {
    fn to() -> RelationDef { Relation::Evidence.def() }
}

impl ActiveModelBehavior for ActiveModel {}

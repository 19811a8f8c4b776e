use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::workflow_instance;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workflow_task")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub instance_id: Uuid,
    pub name: String,
    pub sequence: i32,
    pub assignee: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
    pub completed_by: Option<String>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub due_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Instance }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Instance => Entity::belongs_to(workflow_instance::Entity)
                .from(Column::InstanceId)
                .to(workflow_instance::Column::Id)
                .into(),
        }
    }
}

impl Related<workflow_instance::Entity> for Entity {
    fn to() -> RelationDef { Relation::Instance.def() }
}

impl ActiveModelBehavior for ActiveModel {}

//! Create `workflow_task` table with FK to `workflow_instance`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkflowTask::Table)
                    .if_not_exists()
                    .col(uuid(WorkflowTask::Id).primary_key())
                    .col(uuid(WorkflowTask::InstanceId))
                    .col(string_len(WorkflowTask::Name, 200))
                    .col(integer(WorkflowTask::Sequence))
                    .col(string_len_null(WorkflowTask::Assignee, 128))
                    .col(string_len(WorkflowTask::Status, 32))
                    .col(text_null(WorkflowTask::Comments))
                    .col(string_len_null(WorkflowTask::CompletedBy, 128))
                    .col(timestamp_with_time_zone_null(WorkflowTask::CompletedAt))
                    .col(timestamp_with_time_zone_null(WorkflowTask::DueAt))
                    .col(timestamp_with_time_zone(WorkflowTask::CreatedAt))
                    .col(timestamp_with_time_zone(WorkflowTask::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_task_instance")
                            .from(WorkflowTask::Table, WorkflowTask::InstanceId)
                            .to(WorkflowInstance::Table, WorkflowInstance::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WorkflowTask::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WorkflowTask {
    Table, Id, InstanceId, Name, Sequence, Assignee, Status, Comments, CompletedBy,
    CompletedAt, DueAt, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum WorkflowInstance { Table, Id }

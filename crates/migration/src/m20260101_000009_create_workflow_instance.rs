//! Create `workflow_instance` table with FK to `tenant`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkflowInstance::Table)
                    .if_not_exists()
                    .col(uuid(WorkflowInstance::Id).primary_key())
                    .col(uuid(WorkflowInstance::TenantId))
                    .col(string_len(WorkflowInstance::DefinitionKey, 128))
                    .col(string_len(WorkflowInstance::EntityType, 64))
                    .col(uuid_null(WorkflowInstance::EntityId))
                    .col(string_len(WorkflowInstance::Status, 32))
                    .col(string_len(WorkflowInstance::InitiatedBy, 128))
                    .col(timestamp_with_time_zone_null(WorkflowInstance::StartedAt))
                    .col(timestamp_with_time_zone_null(WorkflowInstance::CompletedAt))
                    .col(timestamp_with_time_zone(WorkflowInstance::CreatedAt))
                    .col(timestamp_with_time_zone(WorkflowInstance::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_instance_tenant")
                            .from(WorkflowInstance::Table, WorkflowInstance::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WorkflowInstance::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WorkflowInstance {
    Table, Id, TenantId, DefinitionKey, EntityType, EntityId, Status, InitiatedBy,
    StartedAt, CompletedAt, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

//! Create `framework` table with FK to `regulator`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Framework::Table)
                    .if_not_exists()
                    .col(uuid(Framework::Id).primary_key())
                    .col(uuid(Framework::RegulatorId))
                    .col(string_len(Framework::Code, 64).unique_key())
                    .col(string_len(Framework::Title, 255))
                    .col(string_len(Framework::Version, 32))
                    .col(boolean(Framework::IsMandatory).default(false))
                    .col(integer(Framework::ControlCount).default(0))
                    .col(boolean(Framework::IsActive).default(true))
                    .col(timestamp_with_time_zone(Framework::CreatedAt))
                    .col(timestamp_with_time_zone(Framework::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_framework_regulator")
                            .from(Framework::Table, Framework::RegulatorId)
                            .to(Regulator::Table, Regulator::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Framework::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Framework { Table, Id, RegulatorId, Code, Title, Version, IsMandatory, ControlCount, IsActive, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Regulator { Table, Id }

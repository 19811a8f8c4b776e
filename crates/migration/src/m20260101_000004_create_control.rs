//! Create `control` table with FK to `framework`.
//!
//! Control numbers are unique per framework (see the index migration).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Control::Table)
                    .if_not_exists()
                    .col(uuid(Control::Id).primary_key())
                    .col(uuid(Control::FrameworkId))
                    .col(string_len(Control::ControlNumber, 64))
                    .col(string_len(Control::Domain, 255))
                    .col(string_len(Control::Title, 500))
                    .col(text(Control::Requirement))
                    .col(string_len(Control::ControlType, 64))
                    .col(integer(Control::MaturityLevel))
                    .col(text_null(Control::EvidenceRequirements))
                    .col(integer(Control::DisplayOrder).default(0))
                    .col(boolean(Control::IsActive).default(true))
                    .col(timestamp_with_time_zone(Control::CreatedAt))
                    .col(timestamp_with_time_zone(Control::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_control_framework")
                            .from(Control::Table, Control::FrameworkId)
                            .to(Framework::Table, Framework::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Control::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Control {
    Table, Id, FrameworkId, ControlNumber, Domain, Title, Requirement, ControlType,
    MaturityLevel, EvidenceRequirements, DisplayOrder, IsActive, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Framework { Table, Id }

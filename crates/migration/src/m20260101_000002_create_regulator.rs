//! Create `regulator` table (top of the catalog hierarchy).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Regulator::Table)
                    .if_not_exists()
                    .col(uuid(Regulator::Id).primary_key())
                    .col(string_len(Regulator::Code, 64).unique_key())
                    .col(string_len(Regulator::Name, 255))
                    .col(string_len(Regulator::RegionType, 32))
                    .col(text_null(Regulator::Description))
                    .col(string_len_null(Regulator::Website, 512))
                    .col(boolean(Regulator::IsActive).default(true))
                    .col(timestamp_with_time_zone(Regulator::CreatedAt))
                    .col(timestamp_with_time_zone(Regulator::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Regulator::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Regulator { Table, Id, Code, Name, RegionType, Description, Website, IsActive, CreatedAt, UpdatedAt }

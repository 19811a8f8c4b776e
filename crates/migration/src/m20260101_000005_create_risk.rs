//! Create `risk` table (risk register) with FK to `tenant`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Risk::Table)
                    .if_not_exists()
                    .col(uuid(Risk::Id).primary_key())
                    .col(uuid(Risk::TenantId))
                    .col(string_len(Risk::Title, 200))
                    .col(text(Risk::Description))
                    .col(string_len(Risk::Category, 100))
                    .col(integer(Risk::Likelihood))
                    .col(integer(Risk::Impact))
                    .col(integer(Risk::InherentScore))
                    .col(string_len(Risk::Status, 32))
                    .col(string_len(Risk::Owner, 100))
                    .col(text_null(Risk::MitigationStrategy))
                    .col(timestamp_with_time_zone_null(Risk::DueDate))
                    .col(string_len(Risk::CreatedBy, 128))
                    .col(timestamp_with_time_zone(Risk::CreatedAt))
                    .col(timestamp_with_time_zone(Risk::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_risk_tenant")
                            .from(Risk::Table, Risk::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Risk::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Risk {
    Table, Id, TenantId, Title, Description, Category, Likelihood, Impact, InherentScore,
    Status, Owner, MitigationStrategy, DueDate, CreatedBy, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

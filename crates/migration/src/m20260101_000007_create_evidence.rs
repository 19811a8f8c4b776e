//! Create `evidence` table with FKs to `tenant` and (optionally) `control`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Evidence::Table)
                    .if_not_exists()
                    .col(uuid(Evidence::Id).primary_key())
                    .col(uuid(Evidence::TenantId))
                    .col(uuid_null(Evidence::ControlId))
                    .col(string_len(Evidence::EvidenceNumber, 32).unique_key())
                    .col(string_len(Evidence::Title, 255))
                    .col(text(Evidence::Description))
                    .col(string_len(Evidence::EvidenceType, 64))
                    .col(string_len_null(Evidence::FileUrl, 1024))
                    .col(string_len(Evidence::Status, 32))
                    .col(string_len(Evidence::SubmittedBy, 128))
                    .col(string_len_null(Evidence::Reviewer, 128))
                    .col(text_null(Evidence::ReviewComments))
                    .col(timestamp_with_time_zone(Evidence::CollectedAt))
                    .col(timestamp_with_time_zone(Evidence::CreatedAt))
                    .col(timestamp_with_time_zone(Evidence::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_tenant")
                            .from(Evidence::Table, Evidence::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_control")
                            .from(Evidence::Table, Evidence::ControlId)
                            .to(Control::Table, Control::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Evidence::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Evidence {
    Table, Id, TenantId, ControlId, EvidenceNumber, Title, Description, EvidenceType, FileUrl,
    Status, SubmittedBy, Reviewer, ReviewComments, CollectedAt, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

#[derive(DeriveIden)]
enum Control { Table, Id }

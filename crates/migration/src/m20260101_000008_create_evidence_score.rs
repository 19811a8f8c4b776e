//! Create `evidence_score` table with FK to `evidence`.
//!
//! Keeps every score ever given; only the latest is flagged `is_final`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EvidenceScore::Table)
                    .if_not_exists()
                    .col(uuid(EvidenceScore::Id).primary_key())
                    .col(uuid(EvidenceScore::EvidenceId))
                    .col(integer(EvidenceScore::Score))
                    .col(boolean(EvidenceScore::IsFinal).default(true))
                    .col(text_null(EvidenceScore::Comments))
                    .col(string_len(EvidenceScore::ScoredBy, 128))
                    .col(timestamp_with_time_zone(EvidenceScore::ScoredAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evidence_score_evidence")
                            .from(EvidenceScore::Table, EvidenceScore::EvidenceId)
                            .to(Evidence::Table, Evidence::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EvidenceScore::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum EvidenceScore { Table, Id, EvidenceId, Score, IsFinal, Comments, ScoredBy, ScoredAt }

#[derive(DeriveIden)]
enum Evidence { Table, Id }

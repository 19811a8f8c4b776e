//! Create `risk_appetite_setting` table with FK to `tenant`.
//!
//! Scores are on the normalized 0..=100 scale.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RiskAppetiteSetting::Table)
                    .if_not_exists()
                    .col(uuid(RiskAppetiteSetting::Id).primary_key())
                    .col(uuid(RiskAppetiteSetting::TenantId))
                    .col(string_len(RiskAppetiteSetting::Category, 100))
                    .col(string_len(RiskAppetiteSetting::Name, 200))
                    .col(text_null(RiskAppetiteSetting::Description))
                    .col(integer(RiskAppetiteSetting::MinimumRiskScore))
                    .col(integer(RiskAppetiteSetting::MaximumRiskScore))
                    .col(integer(RiskAppetiteSetting::TargetRiskScore))
                    .col(integer(RiskAppetiteSetting::TolerancePercentage))
                    .col(integer(RiskAppetiteSetting::ImpactThreshold))
                    .col(integer(RiskAppetiteSetting::LikelihoodThreshold))
                    .col(boolean(RiskAppetiteSetting::IsActive).default(true))
                    .col(string_len_null(RiskAppetiteSetting::ApprovedBy, 128))
                    .col(timestamp_with_time_zone_null(RiskAppetiteSetting::ApprovedAt))
                    .col(timestamp_with_time_zone_null(RiskAppetiteSetting::ExpiryDate))
                    .col(integer(RiskAppetiteSetting::ReviewReminderDays).default(30))
                    .col(string_len(RiskAppetiteSetting::CreatedBy, 128))
                    .col(timestamp_with_time_zone(RiskAppetiteSetting::CreatedAt))
                    .col(timestamp_with_time_zone(RiskAppetiteSetting::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_risk_appetite_tenant")
                            .from(RiskAppetiteSetting::Table, RiskAppetiteSetting::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RiskAppetiteSetting::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum RiskAppetiteSetting {
    Table, Id, TenantId, Category, Name, Description, MinimumRiskScore, MaximumRiskScore,
    TargetRiskScore, TolerancePercentage, ImpactThreshold, LikelihoodThreshold, IsActive,
    ApprovedBy, ApprovedAt, ExpiryDate, ReviewReminderDays, CreatedBy, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

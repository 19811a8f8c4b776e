use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[&str] = &[
    "uniq_control_framework_number",
    "idx_risk_tenant_status",
    "idx_risk_tenant_category",
    "uniq_appetite_tenant_category_name",
    "idx_evidence_tenant_status",
    "idx_evidence_control",
    "idx_evidence_score_evidence",
    "idx_workflow_instance_tenant_status",
    "idx_workflow_task_instance",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Control: composite unique (framework_id, control_number)
        manager
            .create_index(
                Index::create()
                    .name("uniq_control_framework_number")
                    .table(Control::Table)
                    .col(Control::FrameworkId)
                    .col(Control::ControlNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Risk: register filters by tenant + status / category
        manager
            .create_index(
                Index::create()
                    .name("idx_risk_tenant_status")
                    .table(Risk::Table)
                    .col(Risk::TenantId)
                    .col(Risk::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_risk_tenant_category")
                    .table(Risk::Table)
                    .col(Risk::TenantId)
                    .col(Risk::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_appetite_tenant_category_name")
                    .table(RiskAppetiteSetting::Table)
                    .col(RiskAppetiteSetting::TenantId)
                    .col(RiskAppetiteSetting::Category)
                    .col(RiskAppetiteSetting::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_evidence_tenant_status")
                    .table(Evidence::Table)
                    .col(Evidence::TenantId)
                    .col(Evidence::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_evidence_control")
                    .table(Evidence::Table)
                    .col(Evidence::ControlId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_evidence_score_evidence")
                    .table(EvidenceScore::Table)
                    .col(EvidenceScore::EvidenceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_instance_tenant_status")
                    .table(WorkflowInstance::Table)
                    .col(WorkflowInstance::TenantId)
                    .col(WorkflowInstance::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_task_instance")
                    .table(WorkflowTask::Table)
                    .col(WorkflowTask::InstanceId)
                    .col(WorkflowTask::Sequence)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in INDEXES {
            manager
                .get_connection()
                .execute_unprepared(&format!("DROP INDEX IF EXISTS {name}"))
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Control { Table, FrameworkId, ControlNumber }

#[derive(DeriveIden)]
enum Risk { Table, TenantId, Status, Category }

#[derive(DeriveIden)]
enum RiskAppetiteSetting { Table, TenantId, Category, Name }

#[derive(DeriveIden)]
enum Evidence { Table, TenantId, Status, ControlId }

#[derive(DeriveIden)]
enum EvidenceScore { Table, EvidenceId }

#[derive(DeriveIden)]
enum WorkflowInstance { Table, TenantId, Status }

#[derive(DeriveIden)]
enum WorkflowTask { Table, InstanceId, Sequence }

//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_tenant;
mod m20260101_000002_create_regulator;
mod m20260101_000003_create_framework;
mod m20260101_000004_create_control;
mod m20260101_000005_create_risk;
mod m20260101_000006_create_risk_appetite_setting;
mod m20260101_000007_create_evidence;
mod m20260101_000008_create_evidence_score;
mod m20260101_000009_create_workflow_instance;
mod m20260101_000010_create_workflow_task;
mod m20260101_000020_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_tenant::Migration),
            // Catalog: regulator -> framework -> control
            Box::new(m20260101_000002_create_regulator::Migration),
            Box::new(m20260101_000003_create_framework::Migration),
            Box::new(m20260101_000004_create_control::Migration),
            Box::new(m20260101_000005_create_risk::Migration),
            Box::new(m20260101_000006_create_risk_appetite_setting::Migration),
            Box::new(m20260101_000007_create_evidence::Migration),
            Box::new(m20260101_000008_create_evidence_score::Migration),
            Box::new(m20260101_000009_create_workflow_instance::Migration),
            Box::new(m20260101_000010_create_workflow_task::Migration),
            // Indexes should always be applied last
            Box::new(m20260101_000020_add_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_registered_in_order() {
        let names: Vec<String> = Migrator::migrations().iter().map(|m| m.name().to_string()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.last().map(String::as_str), Some("m20260101_000020_add_indexes"));
    }
}

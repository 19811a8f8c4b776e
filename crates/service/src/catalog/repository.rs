use async_trait::async_trait;
use uuid::Uuid;

use models::{control, framework, regulator};

use crate::errors::ServiceError;

/// Resolved control filter; the framework is already looked up by code.
#[derive(Clone, Debug, Default)]
pub struct ControlCriteria {
    pub framework_id: Option<Uuid>,
    pub domain: Option<String>,
    pub control_type: Option<String>,
    pub maturity_level: Option<i32>,
}

/// Persistence for the shared regulator / framework / control catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn regulator_by_code(&self, code: &str) -> Result<Option<regulator::Model>, ServiceError>;
    async fn insert_regulator(&self, row: regulator::Model) -> Result<regulator::Model, ServiceError>;
    async fn update_regulator(&self, row: regulator::Model) -> Result<regulator::Model, ServiceError>;
    /// Active regulators ordered by code.
    async fn active_regulators(&self, region_type: Option<&str>) -> Result<Vec<regulator::Model>, ServiceError>;

    async fn framework_by_code(&self, code: &str) -> Result<Option<framework::Model>, ServiceError>;
    async fn insert_framework(&self, row: framework::Model) -> Result<framework::Model, ServiceError>;
    /// Active frameworks ordered by code.
    async fn active_frameworks(
        &self,
        regulator_id: Option<Uuid>,
        mandatory: Option<bool>,
    ) -> Result<Vec<framework::Model>, ServiceError>;

    async fn control_number_taken(&self, framework_id: Uuid, number: &str) -> Result<bool, ServiceError>;
    /// Insert a control and bump its framework's `control_count` atomically.
    async fn insert_control(&self, row: control::Model) -> Result<control::Model, ServiceError>;
    /// Active controls by `display_order`, then number. Returns one page and the unpaged total.
    async fn control_page(
        &self,
        criteria: &ControlCriteria,
        page_idx: u64,
        per_page: u64,
    ) -> Result<(Vec<control::Model>, u64), ServiceError>;
    async fn active_control(&self, id: Uuid) -> Result<Option<control::Model>, ServiceError>;
    /// Literal, case-insensitive substring over number, title, domain and requirement.
    async fn search_controls(&self, term: &str, limit: u64) -> Result<Vec<control::Model>, ServiceError>;
    async fn count_active_controls(&self) -> Result<u64, ServiceError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Tables {
        regulators: HashMap<Uuid, regulator::Model>,
        frameworks: HashMap<Uuid, framework::Model>,
        controls: HashMap<Uuid, control::Model>,
    }

    #[derive(Default)]
    pub struct MockCatalogRepository {
        tables: Mutex<Tables>,
    }

    fn contains_ci(haystack: &str, needle: &str) -> bool { haystack.to_lowercase().contains(&needle.to_lowercase()) }

    fn sorted_controls(mut rows: Vec<control::Model>) -> Vec<control::Model> {
        rows.sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.control_number.cmp(&b.control_number)));
        rows
    }

    #[async_trait]
    impl CatalogRepository for MockCatalogRepository {
        async fn regulator_by_code(&self, code: &str) -> Result<Option<regulator::Model>, ServiceError> {
            Ok(self.tables.lock().regulators.values().find(|r| r.code == code).cloned())
        }

        async fn insert_regulator(&self, row: regulator::Model) -> Result<regulator::Model, ServiceError> {
            let mut t = self.tables.lock();
            if t.regulators.values().any(|r| r.code == row.code) {
                return Err(ServiceError::Conflict(format!("regulator '{}' already exists", row.code)));
            }
            t.regulators.insert(row.id, row.clone());
            Ok(row)
        }

        async fn update_regulator(&self, row: regulator::Model) -> Result<regulator::Model, ServiceError> {
            let mut t = self.tables.lock();
            match t.regulators.get_mut(&row.id) {
                Some(slot) => {
                    *slot = row.clone();
                    Ok(row)
                }
                None => Err(ServiceError::not_found("regulator")),
            }
        }

        async fn active_regulators(&self, region_type: Option<&str>) -> Result<Vec<regulator::Model>, ServiceError> {
            let mut out: Vec<regulator::Model> = self
                .tables
                .lock()
                .regulators
                .values()
                .filter(|r| r.is_active && region_type.map_or(true, |rt| r.region_type == rt))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.code.cmp(&b.code));
            Ok(out)
        }

        async fn framework_by_code(&self, code: &str) -> Result<Option<framework::Model>, ServiceError> {
            Ok(self.tables.lock().frameworks.values().find(|f| f.code == code).cloned())
        }

        async fn insert_framework(&self, row: framework::Model) -> Result<framework::Model, ServiceError> {
            let mut t = self.tables.lock();
            if t.frameworks.values().any(|f| f.code == row.code) {
                return Err(ServiceError::Conflict(format!("framework '{}' already exists", row.code)));
            }
            t.frameworks.insert(row.id, row.clone());
            Ok(row)
        }

        async fn active_frameworks(
            &self,
            regulator_id: Option<Uuid>,
            mandatory: Option<bool>,
        ) -> Result<Vec<framework::Model>, ServiceError> {
            let mut out: Vec<framework::Model> = self
                .tables
                .lock()
                .frameworks
                .values()
                .filter(|f| f.is_active)
                .filter(|f| regulator_id.map_or(true, |id| f.regulator_id == id))
                .filter(|f| mandatory.map_or(true, |m| f.is_mandatory == m))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.code.cmp(&b.code));
            Ok(out)
        }

        async fn control_number_taken(&self, framework_id: Uuid, number: &str) -> Result<bool, ServiceError> {
            Ok(self
                .tables
                .lock()
                .controls
                .values()
                .any(|c| c.framework_id == framework_id && c.control_number == number))
        }

        async fn insert_control(&self, row: control::Model) -> Result<control::Model, ServiceError> {
            let mut t = self.tables.lock();
            let fw = t.frameworks.get_mut(&row.framework_id).ok_or_else(|| ServiceError::not_found("framework"))?;
            fw.control_count += 1;
            fw.updated_at = row.created_at;
            t.controls.insert(row.id, row.clone());
            Ok(row)
        }

        async fn control_page(
            &self,
            criteria: &ControlCriteria,
            page_idx: u64,
            per_page: u64,
        ) -> Result<(Vec<control::Model>, u64), ServiceError> {
            let rows: Vec<control::Model> = self
                .tables
                .lock()
                .controls
                .values()
                .filter(|c| c.is_active)
                .filter(|c| criteria.framework_id.map_or(true, |id| c.framework_id == id))
                .filter(|c| criteria.domain.as_deref().map_or(true, |d| contains_ci(&c.domain, d)))
                .filter(|c| criteria.control_type.as_deref().map_or(true, |t| c.control_type == t))
                .filter(|c| criteria.maturity_level.map_or(true, |m| c.maturity_level == m))
                .cloned()
                .collect();
            let total = rows.len() as u64;
            let items = sorted_controls(rows).into_iter().skip((page_idx * per_page) as usize).take(per_page as usize).collect();
            Ok((items, total))
        }

        async fn active_control(&self, id: Uuid) -> Result<Option<control::Model>, ServiceError> {
            Ok(self.tables.lock().controls.get(&id).filter(|c| c.is_active).cloned())
        }

        async fn search_controls(&self, term: &str, limit: u64) -> Result<Vec<control::Model>, ServiceError> {
            let rows: Vec<control::Model> = self
                .tables
                .lock()
                .controls
                .values()
                .filter(|c| c.is_active)
                .filter(|c| {
                    contains_ci(&c.control_number, term)
                        || contains_ci(&c.title, term)
                        || contains_ci(&c.domain, term)
                        || contains_ci(&c.requirement, term)
                })
                .cloned()
                .collect();
            Ok(sorted_controls(rows).into_iter().take(limit as usize).collect())
        }

        async fn count_active_controls(&self) -> Result<u64, ServiceError> {
            Ok(self.tables.lock().controls.values().filter(|c| c.is_active).count() as u64)
        }
    }
}

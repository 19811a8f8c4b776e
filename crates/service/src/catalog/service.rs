use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::{control, framework, regulator, validate};

use super::region::RegionType;
use super::repository::{CatalogRepository, ControlCriteria};
use crate::errors::ServiceError;

#[derive(Clone, Debug, Deserialize)]
pub struct NewRegulator {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewFramework {
    pub regulator_code: String,
    pub code: String,
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub is_mandatory: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewControl {
    pub framework_code: String,
    pub control_number: String,
    pub domain: String,
    pub title: String,
    pub requirement: String,
    pub control_type: String,
    pub maturity_level: i32,
    pub evidence_requirements: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ControlFilter {
    pub framework_code: Option<String>,
    pub domain: Option<String>,
    pub control_type: Option<String>,
    pub maturity_level: Option<i32>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct CatalogStatistics {
    pub regulators_total: u64,
    pub regulators_saudi: u64,
    pub regulators_regional: u64,
    pub regulators_international: u64,
    pub frameworks_total: u64,
    pub frameworks_mandatory: u64,
    pub frameworks_voluntary: u64,
    pub framework_controls_total: u64,
    pub controls_active: u64,
}

fn normalize_code(code: &str) -> Result<String, ServiceError> {
    validate::required_text("code", code, 64)?;
    Ok(code.trim().to_uppercase())
}

/// Catalog operations shared by every tenant.
pub struct CatalogService<R: CatalogRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: CatalogRepository + ?Sized> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_regulator(&self, input: NewRegulator) -> Result<regulator::Model, ServiceError> {
        let code = normalize_code(&input.code)?;
        validate::required_text("name", &input.name, 255)?;
        if self.repo.regulator_by_code(&code).await?.is_some() {
            return Err(ServiceError::Conflict(format!("regulator '{code}' already exists")));
        }
        let region = RegionType::from_code(&code);
        let now = Utc::now().into();
        let created = self
            .repo
            .insert_regulator(regulator::Model {
                id: Uuid::new_v4(),
                code,
                name: input.name.trim().to_string(),
                region_type: region.as_str().to_string(),
                description: input.description,
                website: input.website,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(regulator_id = %created.id, code = %created.code, region = %created.region_type, "regulator_created");
        Ok(created)
    }

    /// Active regulators, optionally limited to one region, ordered by code.
    pub async fn list_regulators(&self, region: Option<RegionType>) -> Result<Vec<regulator::Model>, ServiceError> {
        self.repo.active_regulators(region.map(RegionType::as_str)).await
    }

    pub async fn get_regulator_by_code(&self, code: &str) -> Result<regulator::Model, ServiceError> {
        self.repo
            .regulator_by_code(&code.trim().to_uppercase())
            .await?
            .ok_or_else(|| ServiceError::not_found("regulator"))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_regulator(&self, code: &str) -> Result<regulator::Model, ServiceError> {
        let mut row = self.get_regulator_by_code(code).await?;
        row.is_active = false;
        row.updated_at = Utc::now().into();
        let updated = self.repo.update_regulator(row).await?;
        info!(regulator_id = %updated.id, code = %updated.code, "regulator_deactivated");
        Ok(updated)
    }

    #[instrument(skip(self, input), fields(code = %input.code, regulator = %input.regulator_code))]
    pub async fn create_framework(&self, input: NewFramework) -> Result<framework::Model, ServiceError> {
        let code = normalize_code(&input.code)?;
        validate::required_text("title", &input.title, 255)?;
        validate::required_text("version", &input.version, 32)?;
        let reg = self.get_regulator_by_code(&input.regulator_code).await?;
        if self.repo.framework_by_code(&code).await?.is_some() {
            return Err(ServiceError::Conflict(format!("framework '{code}' already exists")));
        }
        let now = Utc::now().into();
        let created = self
            .repo
            .insert_framework(framework::Model {
                id: Uuid::new_v4(),
                regulator_id: reg.id,
                code,
                title: input.title.trim().to_string(),
                version: input.version.trim().to_string(),
                is_mandatory: input.is_mandatory,
                control_count: 0,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(framework_id = %created.id, code = %created.code, "framework_created");
        Ok(created)
    }

    pub async fn list_frameworks(
        &self,
        regulator_code: Option<&str>,
        mandatory: Option<bool>,
    ) -> Result<Vec<framework::Model>, ServiceError> {
        let regulator_id = match regulator_code {
            Some(code) => Some(self.get_regulator_by_code(code).await?.id),
            None => None,
        };
        self.repo.active_frameworks(regulator_id, mandatory).await
    }

    pub async fn get_framework_by_code(&self, code: &str) -> Result<framework::Model, ServiceError> {
        self.repo
            .framework_by_code(&code.trim().to_uppercase())
            .await?
            .ok_or_else(|| ServiceError::not_found("framework"))
    }

    /// Insert a control; the framework's `control_count` moves with it.
    #[instrument(skip(self, input), fields(framework = %input.framework_code, number = %input.control_number))]
    pub async fn create_control(&self, input: NewControl) -> Result<control::Model, ServiceError> {
        validate::required_text("control_number", &input.control_number, 64)?;
        validate::required_text("domain", &input.domain, 255)?;
        validate::required_text("title", &input.title, 500)?;
        validate::required_text("requirement", &input.requirement, 10_000)?;
        validate::required_text("control_type", &input.control_type, 64)?;
        validate::in_range("maturity_level", input.maturity_level, 1, 5)?;

        let fw = self.get_framework_by_code(&input.framework_code).await?;
        let number = input.control_number.trim().to_string();
        if self.repo.control_number_taken(fw.id, &number).await? {
            return Err(ServiceError::Conflict(format!("control '{number}' already exists in {}", fw.code)));
        }

        let now = Utc::now().into();
        let created = self
            .repo
            .insert_control(control::Model {
                id: Uuid::new_v4(),
                framework_id: fw.id,
                control_number: number,
                domain: input.domain.trim().to_string(),
                title: input.title.trim().to_string(),
                requirement: input.requirement,
                control_type: input.control_type.trim().to_string(),
                maturity_level: input.maturity_level,
                evidence_requirements: input.evidence_requirements,
                display_order: input.display_order,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(control_id = %created.id, framework = %fw.code, "control_created");
        Ok(created)
    }

    /// Active controls ordered by `display_order`.
    pub async fn list_controls(&self, filter: &ControlFilter, opts: Pagination) -> Result<Page<control::Model>, ServiceError> {
        let framework_id = match filter.framework_code.as_deref() {
            Some(code) => Some(self.get_framework_by_code(code).await?.id),
            None => None,
        };
        let criteria = ControlCriteria {
            framework_id,
            domain: filter.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
            control_type: filter.control_type.clone(),
            maturity_level: filter.maturity_level,
        };
        let (idx, per_page) = opts.normalize();
        let (items, total) = self.repo.control_page(&criteria, idx, per_page).await?;
        Ok(Page::new(items, total, opts))
    }

    pub async fn get_control(&self, id: Uuid) -> Result<control::Model, ServiceError> {
        self.repo.active_control(id).await?.ok_or_else(|| ServiceError::not_found("control"))
    }

    /// Case-insensitive substring match over number, title, domain and requirement.
    pub async fn search_controls(&self, q: &str, limit: u64) -> Result<Vec<control::Model>, ServiceError> {
        let q = q.trim();
        if q.is_empty() {
            return Err(ServiceError::Validation("search query is required".into()));
        }
        self.repo.search_controls(q, limit.clamp(1, 100)).await
    }

    /// Counts only active regulators and frameworks, matching the list endpoints.
    pub async fn statistics(&self) -> Result<CatalogStatistics, ServiceError> {
        let regulators = self.repo.active_regulators(None).await?;
        let frameworks = self.repo.active_frameworks(None, None).await?;
        let controls_active = self.repo.count_active_controls().await?;
        Ok(tally(&regulators, &frameworks, controls_active))
    }
}

fn tally(regulators: &[regulator::Model], frameworks: &[framework::Model], controls_active: u64) -> CatalogStatistics {
    let mut s = CatalogStatistics { controls_active, ..Default::default() };
    for r in regulators {
        s.regulators_total += 1;
        match RegionType::parse(&r.region_type) {
            Some(RegionType::International) => s.regulators_international += 1,
            Some(RegionType::Regional) => s.regulators_regional += 1,
            _ => s.regulators_saudi += 1,
        }
    }
    for f in frameworks {
        s.frameworks_total += 1;
        if f.is_mandatory {
            s.frameworks_mandatory += 1;
        } else {
            s.frameworks_voluntary += 1;
        }
        s.framework_controls_total += f.control_count.max(0) as u64;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::mock::MockCatalogRepository;

    fn reg(code: &str, region: &str) -> regulator::Model {
        let now = Utc::now().into();
        regulator::Model {
            id: Uuid::new_v4(),
            code: code.into(),
            name: code.into(),
            region_type: region.into(),
            description: None,
            website: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn fw(mandatory: bool, controls: i32) -> framework::Model {
        let now = Utc::now().into();
        framework::Model {
            id: Uuid::new_v4(),
            regulator_id: Uuid::new_v4(),
            code: "F".into(),
            title: "F".into(),
            version: "1".into(),
            is_mandatory: mandatory,
            control_count: controls,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn svc() -> CatalogService<MockCatalogRepository> { CatalogService::new(Arc::new(MockCatalogRepository::default())) }

    fn new_regulator(code: &str) -> NewRegulator {
        NewRegulator { code: code.into(), name: format!("{code} authority"), description: None, website: None }
    }

    fn new_framework(regulator: &str, code: &str, mandatory: bool) -> NewFramework {
        NewFramework {
            regulator_code: regulator.into(),
            code: code.into(),
            title: "Essential Controls".into(),
            version: "2.0".into(),
            is_mandatory: mandatory,
        }
    }

    fn new_control(framework: &str, number: &str) -> NewControl {
        NewControl {
            framework_code: framework.into(),
            control_number: number.into(),
            domain: "Cybersecurity Governance".into(),
            title: format!("Control {number}"),
            requirement: "Define and approve a policy".into(),
            control_type: "Preventive".into(),
            maturity_level: 2,
            evidence_requirements: None,
            display_order: 1,
        }
    }

    #[test]
    fn tally_counts_regions_and_frameworks() {
        let s = tally(
            &[reg("NCA", "saudi"), reg("SAMA", "saudi"), reg("CBUAE", "regional"), reg("ISO", "international")],
            &[fw(true, 114), fw(false, 20)],
            130,
        );
        assert_eq!(s.regulators_total, 4);
        assert_eq!(s.regulators_saudi, 2);
        assert_eq!(s.regulators_regional, 1);
        assert_eq!(s.regulators_international, 1);
        assert_eq!(s.frameworks_mandatory, 1);
        assert_eq!(s.frameworks_voluntary, 1);
        assert_eq!(s.framework_controls_total, 134);
        assert_eq!(s.controls_active, 130);
    }

    #[tokio::test]
    async fn search_requires_query() {
        let err = svc().search_controls("   ", 10).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn maturity_out_of_range_is_rejected() {
        let mut input = new_control("ECC", "1-1");
        input.maturity_level = 6;
        assert_eq!(svc().create_control(input).await.unwrap_err().code(), "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn regulator_codes_are_unique_and_upper_cased() {
        let svc = svc();
        let r = svc.create_regulator(new_regulator("nca")).await.unwrap();
        assert_eq!(r.code, "NCA");
        assert_eq!(r.region_type, "saudi");
        let err = svc.create_regulator(new_regulator("NCA")).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(svc.create_regulator(new_regulator("ISO")).await.unwrap().region_type, "international");
    }

    #[tokio::test]
    async fn control_creation_bumps_framework_count() {
        let svc = svc();
        svc.create_regulator(new_regulator("NCA")).await.unwrap();
        assert_eq!(svc.create_framework(new_framework("NOPE", "ECC", true)).await.unwrap_err().code(), "NOT_FOUND");
        svc.create_framework(new_framework("NCA", "ECC", true)).await.unwrap();
        assert_eq!(svc.create_framework(new_framework("NCA", "ecc", true)).await.unwrap_err().code(), "CONFLICT");

        let c = svc.create_control(new_control("ECC", "1-1-1")).await.unwrap();
        svc.create_control(new_control("ECC", "1-1-2")).await.unwrap();
        assert_eq!(svc.create_control(new_control("ECC", "1-1-1")).await.unwrap_err().code(), "CONFLICT");
        assert_eq!(svc.get_framework_by_code("ecc").await.unwrap().control_count, 2);
        assert_eq!(svc.get_control(c.id).await.unwrap().id, c.id);

        let filter = ControlFilter { framework_code: Some("ECC".into()), domain: Some("governance".into()), ..Default::default() };
        let page = svc.list_controls(&filter, Pagination { page: 1, per_page: 1 }).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn search_matches_literally() {
        let svc = svc();
        svc.create_regulator(new_regulator("NCA")).await.unwrap();
        svc.create_framework(new_framework("NCA", "ECC", true)).await.unwrap();
        svc.create_control(new_control("ECC", "2-1-1")).await.unwrap();

        assert_eq!(svc.search_controls("POLICY", 10).await.unwrap().len(), 1);
        assert!(svc.search_controls("%", 10).await.unwrap().is_empty());
        assert!(svc.search_controls("2_1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn statistics_skip_deactivated_regulators() {
        let svc = svc();
        svc.create_regulator(new_regulator("NCA")).await.unwrap();
        svc.create_regulator(new_regulator("CBUAE")).await.unwrap();
        svc.create_framework(new_framework("NCA", "ECC", true)).await.unwrap();
        svc.create_control(new_control("ECC", "1-1")).await.unwrap();
        svc.deactivate_regulator("cbuae").await.unwrap();

        let stats = svc.statistics().await.unwrap();
        assert_eq!(stats.regulators_total, svc.list_regulators(None).await.unwrap().len() as u64);
        assert_eq!(stats.regulators_total, 1);
        assert_eq!(stats.regulators_regional, 0);
        assert_eq!(stats.frameworks_mandatory, 1);
        assert_eq!(stats.framework_controls_total, 1);
        assert_eq!(stats.controls_active, 1);
    }
}

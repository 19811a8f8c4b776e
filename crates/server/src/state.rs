use std::sync::Arc;

use sea_orm::DatabaseConnection;

use configs::AppConfig;
use service::appetite::repository::{mock::MockAppetiteRepository, AppetiteRepository};
use service::appetite::seaorm::SeaOrmAppetiteRepository;
use service::appetite::AppetiteService;
use service::catalog::repository::{mock::MockCatalogRepository, CatalogRepository};
use service::catalog::seaorm::SeaOrmCatalogRepository;
use service::catalog::CatalogService;
use service::diagnostics::DiagnosticsLog;
use service::evidence::repository::{mock::MockEvidenceRepository, EvidenceRepository};
use service::evidence::seaorm::SeaOrmEvidenceRepository;
use service::evidence::EvidenceService;
use service::risk::repository::{mock::MockRiskRepository, RiskRepository};
use service::risk::seaorm::SeaOrmRiskRepository;
use service::risk::RiskService;
use service::tenant::repository::{mock::MockTenantRepository, TenantRepository};
use service::tenant::seaorm::SeaOrmTenantRepository;
use service::tenant::TenantService;
use service::workflow::repository::{mock::MockWorkflowRepository, WorkflowRepository};
use service::workflow::seaorm::SeaOrmWorkflowRepository;
use service::workflow::WorkflowService;

/// Shared handler state: one service per module over its repository.
#[derive(Clone)]
pub struct AppState {
    pub tenants: Arc<TenantService<dyn TenantRepository>>,
    pub catalog: Arc<CatalogService<dyn CatalogRepository>>,
    pub risks: Arc<RiskService<dyn RiskRepository>>,
    pub appetite: Arc<AppetiteService<dyn AppetiteRepository, dyn RiskRepository>>,
    pub evidence: Arc<EvidenceService<dyn EvidenceRepository>>,
    pub workflows: Arc<WorkflowService<dyn WorkflowRepository>>,
    pub diagnostics: Arc<DiagnosticsLog>,
}

struct Repos {
    tenants: Arc<dyn TenantRepository>,
    catalog: Arc<dyn CatalogRepository>,
    risks: Arc<dyn RiskRepository>,
    appetite: Arc<dyn AppetiteRepository>,
    evidence: Arc<dyn EvidenceRepository>,
    workflows: Arc<dyn WorkflowRepository>,
}

impl AppState {
    fn assemble(repos: Repos, cfg: &AppConfig) -> Self {
        Self {
            tenants: Arc::new(TenantService::new(repos.tenants)),
            catalog: Arc::new(CatalogService::new(repos.catalog)),
            risks: Arc::new(RiskService::new(repos.risks.clone(), cfg.risk)),
            appetite: Arc::new(AppetiteService::new(repos.appetite, repos.risks)),
            evidence: Arc::new(EvidenceService::new(repos.evidence, cfg.evidence)),
            workflows: Arc::new(WorkflowService::new(repos.workflows)),
            diagnostics: Arc::new(DiagnosticsLog::new(cfg.diagnostics.clone())),
        }
    }

    /// Services backed by PostgreSQL through sea-orm.
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        let repos = Repos {
            tenants: Arc::new(SeaOrmTenantRepository { db: db.clone() }),
            catalog: Arc::new(SeaOrmCatalogRepository { db: db.clone() }),
            risks: Arc::new(SeaOrmRiskRepository { db: db.clone() }),
            appetite: Arc::new(SeaOrmAppetiteRepository { db: db.clone() }),
            evidence: Arc::new(SeaOrmEvidenceRepository { db: db.clone() }),
            workflows: Arc::new(SeaOrmWorkflowRepository { db }),
        };
        Self::assemble(repos, cfg)
    }

    /// In-memory repositories for every module.
    pub fn in_memory(cfg: &AppConfig) -> Self {
        let repos = Repos {
            tenants: Arc::new(MockTenantRepository::default()),
            catalog: Arc::new(MockCatalogRepository::default()),
            risks: Arc::new(MockRiskRepository::default()),
            appetite: Arc::new(MockAppetiteRepository::default()),
            evidence: Arc::new(MockEvidenceRepository::default()),
            workflows: Arc::new(MockWorkflowRepository::default()),
        };
        Self::assemble(repos, cfg)
    }
}

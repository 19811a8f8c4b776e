//! Tenant onboarding and the tenant status machine.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use domain::TenantStatus;
pub use service::TenantService;

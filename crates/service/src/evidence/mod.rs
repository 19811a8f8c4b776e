//! Evidence lifecycle: submission, review, scoring and derived control compliance.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use domain::{ComplianceStatus, EvidenceStatus};
pub use service::EvidenceService;

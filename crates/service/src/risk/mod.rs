//! Risk register: scoring, validation and the guarded risk status machine.
//!
//! Three layers like the rest of the crate: `domain` (pure rules), `repository`
//! (persistence trait + in-memory mock), `service` (orchestration).

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use domain::{RiskLevel, RiskStatus};
pub use service::RiskService;

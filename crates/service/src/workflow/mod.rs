//! Approval workflows: an instance walks its tasks in sequence under two status machines.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use domain::{InstanceStatus, TaskStatus};
pub use service::WorkflowService;

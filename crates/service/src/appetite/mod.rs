//! Risk appetite: per-category tolerance bands and comparison of the register against them.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use domain::AppetiteStatus;
pub use service::AppetiteService;

//! Regulator / framework / control catalog shared by all tenants.

pub mod region;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use region::RegionType;
pub use service::*;

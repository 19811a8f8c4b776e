//! sea-orm entities for the GRC store plus connection and field validation helpers.

pub mod errors;
pub mod validate;
pub mod db;
pub mod tenant;
pub mod regulator;
pub mod framework;
pub mod control;
pub mod risk;
pub mod risk_appetite_setting;
pub mod evidence;
pub mod evidence_score;
pub mod workflow_instance;
pub mod workflow_task;

//! Service layer providing business operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in the `models` crate.
//! - Status changes go through the typed machines in [`lifecycle`].

pub mod errors;
pub mod lifecycle;
pub mod metrics;
pub mod diagnostics;
pub mod tenant;
pub mod catalog;
pub mod risk;
pub mod appetite;
pub mod evidence;
pub mod workflow;
#[cfg(test)]
pub mod test_support;

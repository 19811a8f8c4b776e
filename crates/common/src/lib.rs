//! Shared building blocks for the GRC workspace: logging setup, response
//! types and pagination helpers.

pub mod types;
pub mod utils;
pub mod pagination;

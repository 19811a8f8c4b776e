//! HTTP surface of the GRC platform: axum router, request context, error
//! mapping, OpenAPI document and startup.

pub mod context;
pub mod errors;
pub mod observability;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod startup;

pub use routes::build_router;
pub use startup::run;
pub use state::AppState;

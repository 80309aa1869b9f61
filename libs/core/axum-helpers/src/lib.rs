//! Shared axum plumbing for the users service.
//!
//! - [`errors`]: [`AppError`] and the JSON [`ErrorResponse`] body
//! - [`extractors`]: [`IdPath`], [`ValidatedJson`] and [`ValidatedQuery`]
//! - [`http`]: security headers and CORS
//! - [`server`]: router assembly, health endpoints, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{IdPath, ValidatedJson, ValidatedQuery};
pub use http::security_headers;
pub use server::{
    HealthCheckFuture, HealthResponse, ReadyResponse, ShutdownCoordinator,
    create_production_app, create_router, health_router, run_health_checks, shutdown_signal,
};

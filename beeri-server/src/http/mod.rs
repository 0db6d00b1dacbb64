//! HTTP server layer
//!
//! Axum server with:
//! - CORS (configured origins, credentials allowed)
//! - Request tracing
//! - Hebrew/Russian error bodies
//! - Graceful shutdown

pub mod envelope;
pub mod error;
pub mod extractors;
pub mod locale;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};

//! beeri-server: HTTP API for the BeeriManager parent committee app
//!
//! Postgres-backed JSON API. Every response body is an envelope:
//! `{"success": true, "data": ...}` or `{"success": false, "error": ..., "details": [...]}`.

pub mod auth;
pub mod db;
pub mod http;
pub mod models;
pub mod services;

pub use db::{create_pool, migrations, DbError};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};

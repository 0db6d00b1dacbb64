//! Route handlers organized by resource

use std::sync::Arc;

use axum::Router;

use super::server::AppState;

pub mod assistant;
pub mod auth;
pub mod community;
pub mod directory;
pub mod events;
pub mod grocery;
pub mod health;
pub mod notifications;
pub mod prom;
pub mod protocols;
pub mod tags;
pub mod tasks;
pub mod upload;

/// Everything mounted under `/api` except uploads, which carry their own
/// body limit.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth::router())
        .merge(events::router())
        .merge(tasks::router())
        .merge(tags::router())
        .merge(protocols::router())
        .merge(directory::router())
        .merge(community::router())
        .merge(prom::router())
        .merge(grocery::router())
        .merge(notifications::router())
        .merge(assistant::router())
}

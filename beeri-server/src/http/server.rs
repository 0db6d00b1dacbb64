//! Axum server setup
//!
//! Router assembly, CORS, request tracing, uploads served from disk and
//! graceful shutdown on SIGTERM/Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use beeri_core::{BeeriConfig, CoreError};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{locale, routes};
use crate::auth::AuthKeys;
use crate::services::uploads::PUBLIC_PREFIX;
use crate::services::{
    AssistantClient, AssistantError, NoopPushSender, PushError, PushSender, UploadStore,
    VapidPushSender,
};

/// JSON bodies above this size are rejected before parsing
const JSON_BODY_LIMIT: usize = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow any origin. Only for local development.
    pub cors_permissive: bool,

    /// Origins allowed when not permissive; localhost when empty
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
            allowed_origins: Vec::new(),
        }
    }
}

impl From<&BeeriConfig> for ServerConfig {
    fn from(config: &BeeriConfig) -> Self {
        Self {
            bind_addr: config.server.bind,
            cors_permissive: config.server.cors_permissive,
            allowed_origins: config.server.allowed_origins.clone(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthKeys,
    pub voter_salt: String,
    pub push: Arc<dyn PushSender>,
    /// `None` when no API key is configured
    pub assistant: Option<AssistantClient>,
    pub uploads: UploadStore,
    /// Add `Secure` to cookies (public URL is https)
    pub secure_cookies: bool,
}

impl AppState {
    /// Build state from config. Auth secrets are required; push and the
    /// assistant are switched off when their settings are missing.
    pub fn from_config(pool: PgPool, config: &BeeriConfig) -> Result<Self, ServerError> {
        let secrets = config.auth_secrets()?;

        let push: Arc<dyn PushSender> = match (
            config.push.vapid_public_key.as_deref(),
            config.push.vapid_private_key_pem.as_deref(),
        ) {
            (Some(public), Some(private)) if !public.is_empty() && !private.is_empty() => {
                Arc::new(VapidPushSender::new(public, private, &config.push.subject)?)
            }
            _ => {
                tracing::warn!("VAPID keys not set, push notifications disabled");
                Arc::new(NoopPushSender)
            }
        };

        let assistant = match config.assistant.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(AssistantClient::new(
                key,
                &config.assistant.model,
                &config.assistant.base_url,
            )?),
            _ => {
                tracing::warn!("OPENAI_API_KEY not set, assistant disabled");
                None
            }
        };

        Ok(Self {
            pool,
            auth: AuthKeys::new(&secrets, config.auth.session_ttl_hours),
            voter_salt: config.auth.voter_hash_salt.clone(),
            push,
            assistant,
            uploads: UploadStore::new(&config.uploads.dir, config.uploads.max_bytes),
            secure_cookies: config.server.public_base_url.starts_with("https://"),
        })
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_permissive {
        tracing::warn!("CORS: permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    let configured: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let origins = if configured.is_empty() {
        vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]
    } else {
        configured
    };

    // cookies are sent cross-origin, so no wildcards here
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT_LANGUAGE,
        ])
        .allow_credentials(true)
}

/// The full application router.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let upload_dir = state.uploads.dir().to_path_buf();
    let upload_limit = state.uploads.max_bytes();

    let api = routes::api_router().layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));
    let upload = routes::upload::router()
        // multipart framing on top of the file itself
        .layer(DefaultBodyLimit::max(upload_limit + 64 * 1024));

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api.merge(upload))
        .with_state(Arc::new(state))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir))
        .layer(middleware::from_fn(locale::localize))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("push setup failed: {0}")]
    Push(#[from] PushError),

    #[error("assistant setup failed: {0}")]
    Assistant(#[from] AssistantError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::create_lazy_pool;

    fn config() -> BeeriConfig {
        let mut config = BeeriConfig::default();
        config.auth.jwt_secret = Some("0123456789abcdef0123456789abcdef".into());
        config.auth.admin_password = Some("secret".into());
        config
    }

    fn lazy_pool() -> PgPool {
        create_lazy_pool("postgres://localhost/beeri_test", 1).unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert!(!config.cors_permissive);
    }

    #[tokio::test]
    async fn optional_integrations_are_disabled_without_settings() {
        let state = AppState::from_config(lazy_pool(), &config()).unwrap();
        assert!(state.assistant.is_none());
        assert!(state.push.public_key().is_none());
        assert!(!state.secure_cookies);
    }

    #[tokio::test]
    async fn missing_secrets_fail() {
        let err = AppState::from_config(lazy_pool(), &BeeriConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[tokio::test]
    async fn https_public_url_sets_secure_cookies() {
        let mut config = config();
        config.server.public_base_url = "https://vaad.example.org".into();
        config.assistant.api_key = Some("sk-test".into());
        let state = AppState::from_config(lazy_pool(), &config).unwrap();
        assert!(state.secure_cookies);
        assert!(state.assistant.is_some());
    }
}

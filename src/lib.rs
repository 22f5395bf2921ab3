//! Portfolio CMS - public blog/project views and the admin content dashboard

pub mod config;
pub mod contact;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod session;
pub mod store;

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    middleware, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::contact::{ContactSink, LocalContactSink};
use crate::content::dashboard::Dashboard;
use crate::session::SessionGate;
use crate::store::auth::AdminAuth;
use crate::store::memory::MemoryStore;
use crate::store::objects::{LocalObjectStorage, PUBLIC_PREFIX};
use crate::store::postgres::PgContentStore;
use crate::store::{ContentStore, ObjectStorage};

/// Request bodies above this are rejected before reaching a handler; it
/// leaves room for a 5 MB image plus multipart framing.
const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Shared by every handler.
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub objects: Arc<dyn ObjectStorage>,
    pub auth: Arc<AdminAuth>,
    pub session: SessionGate,
    pub dashboard: Mutex<Dashboard>,
    pub contact: Arc<dyn ContactSink>,
    /// "postgres" or "memory"
    pub backend: &'static str,
}

impl AppState {
    /// Builds the state and subscribes the session gate. Needs a runtime.
    pub fn new(
        store: Arc<dyn ContentStore>,
        objects: Arc<dyn ObjectStorage>,
        auth: Arc<AdminAuth>,
        contact: Arc<dyn ContactSink>,
        backend: &'static str,
    ) -> Self {
        let session = SessionGate::init(&auth);
        Self {
            store,
            objects,
            auth,
            session,
            dashboard: Mutex::new(Dashboard::default()),
            contact,
            backend,
        }
    }
}

/// CORS for the configured frontend origins.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

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
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: Arc<AppState>, config: &AppConfig) -> Router {
    let cors = configure_cors(config);
    tracing::info!(origins = ?config.allowed_origins, "CORS configured");

    routes::router(state)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&config.storage_dir))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

/// Connects to PostgreSQL when configured, otherwise (or on failure) falls
/// back to the in-memory store.
async fn open_store(config: &AppConfig) -> (Arc<dyn ContentStore>, &'static str) {
    let Some(db_config) = &config.database else {
        tracing::info!("DATABASE_URL not set. Running on the in-memory store.");
        return (Arc::new(MemoryStore::new()), "memory");
    };

    match db::init_pool(db_config).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
            }
            (Arc::new(PgContentStore::new(pool)), "postgres")
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Continuing on the in-memory store.",
                e
            );
            (Arc::new(MemoryStore::new()), "memory")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Held until the server exits so buffered log lines are flushed.
    let _log_guards = logging::init();

    routes::health::init_start_time();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let addr = config.socket_addr()?;

    let (store, backend) = open_store(&config).await;
    let objects = Arc::new(LocalObjectStorage::new(
        &config.storage_dir,
        &config.public_base_url,
    ));
    let auth = Arc::new(AdminAuth::new(config.auth.clone()));
    let state = Arc::new(AppState::new(
        store,
        objects,
        auth,
        Arc::new(LocalContactSink),
        backend,
    ));

    let app = create_app(state.clone(), &config);

    tracing::info!(backend = backend, "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    state.session.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::auth::AuthConfig;

    #[tokio::test]
    async fn test_create_app_returns_router() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_local(
            dir.path(),
            AuthConfig {
                admin_email: "admin@example.com".to_string(),
                password_hash: String::new(),
                jwt_secret: "test".to_string(),
            },
        );
        let (store, backend) = open_store(&config).await;
        assert_eq!(backend, "memory");

        let state = Arc::new(AppState::new(
            store,
            Arc::new(LocalObjectStorage::new(dir.path(), "")),
            Arc::new(AdminAuth::new(config.auth.clone())),
            Arc::new(LocalContactSink),
            backend,
        ));
        let _app = create_app(state, &config);
    }
}

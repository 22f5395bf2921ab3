//! Service configuration read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::db::DbConfig;
use crate::store::auth::AuthConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureJwtSecret,

    #[error("invalid HOST/PORT: {0}")]
    InvalidAddress(String),

    #[error("admin credentials: {0}")]
    Admin(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// `None` runs the service on the in-memory store.
    pub database: Option<DbConfig>,
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,
    pub auth: AuthConfig,
}

/// Comma-separated ALLOWED_ORIGINS, else FRONTEND_ORIGIN, else local dev.
fn allowed_origins_from_env() -> Vec<String> {
    let configured: Vec<String> = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| {
            s.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        })
        .unwrap_or_default();
    if !configured.is_empty() {
        return configured;
    }

    match std::env::var("FRONTEND_ORIGIN") {
        Ok(origin) if !origin.trim().is_empty() => vec![origin.trim().to_string()],
        _ => vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ],
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth = AuthConfig::from_env().map_err(|e| ConfigError::Admin(e.to_string()))?;
        let config = Self {
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            database: DbConfig::from_env(),
            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage")),
            public_base_url: std::env::var("PUBLIC_BASE_URL").unwrap_or_default(),
            allowed_origins: allowed_origins_from_env(),
            auth,
        };
        config.check()?;
        Ok(config)
    }

    /// Configuration for tests: development mode, in-memory store.
    pub fn for_local(storage_dir: impl Into<PathBuf>, auth: AuthConfig) -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            database: None,
            storage_dir: storage_dir.into(),
            public_base_url: String::new(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            auth,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuses the default JWT secret in production and warns about the
    /// default admin address.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.is_production() {
            return Ok(());
        }
        if self.auth.uses_default_secret() {
            return Err(ConfigError::InsecureJwtSecret);
        }
        if self.auth.admin_email == crate::store::auth::DEFAULT_ADMIN_EMAIL {
            tracing::warn!(
                "SECURITY: ADMIN_EMAIL is using an insecure default. \
                 Set ADMIN_EMAIL to a real address."
            );
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

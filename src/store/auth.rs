/**
 * Admin Authentication
 * Password sign-in for the single admin account, JWT access tokens,
 * rotating refresh tokens and session-change notifications.
 */
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::error::{ContentError, ContentResult};

/// Access token expiry in minutes
const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiry in days
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";

// ============================================================================
// Types
// ============================================================================

#[derive(Clone)]
pub struct AuthConfig {
    pub admin_email: String,
    pub password_hash: String,
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_email", &self.admin_email)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Builds a config from a plain password, hashing it with `cost`.
    pub fn with_password(
        admin_email: &str,
        password: &str,
        jwt_secret: &str,
        cost: u32,
    ) -> ContentResult<Self> {
        let password_hash = hash(password, cost)
            .map_err(|e| ContentError::Auth(format!("failed to hash password: {}", e)))?;
        Ok(Self {
            admin_email: admin_email.to_string(),
            password_hash,
            jwt_secret: jwt_secret.to_string(),
        })
    }

    /// Reads ADMIN_EMAIL, ADMIN_HASH_PASSWORD (or ADMIN_PASSWORD) and JWT_SECRET.
    pub fn from_env() -> ContentResult<Self> {
        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
        let jwt_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

        if let Ok(password_hash) = std::env::var("ADMIN_HASH_PASSWORD") {
            return Ok(Self {
                admin_email,
                password_hash,
                jwt_secret,
            });
        }

        let plain = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!(
                "SECURITY: Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
                 Falling back to the insecure default password 'admin123'."
            );
            "admin123".to_string()
        });
        Self::with_password(&admin_email, &plain, &jwt_secret, DEFAULT_COST)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    /// Session the token belongs to
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (unix seconds)
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
struct RefreshTokenData {
    session_id: String,
    expires_at: i64,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn generate_refresh_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// Refresh tokens are only ever held as SHA-256 digests.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// AdminAuth
// ============================================================================

pub struct AdminAuth {
    config: AuthConfig,
    admin_id: String,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenData>>,
    session: watch::Sender<Option<Session>>,
}

impl AdminAuth {
    pub fn new(config: AuthConfig) -> Self {
        let (session, _) = watch::channel(None);
        let admin_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, config.admin_email.as_bytes());
        Self {
            config,
            admin_id: admin_id.to_string(),
            refresh_tokens: RwLock::new(HashMap::new()),
            session,
        }
    }

    /// Receiver that observes every session change, starting with the
    /// current one. Dropping it unsubscribes.
    pub fn on_session_change(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn create_access_token(&self, session_id: &str) -> ContentResult<(String, i64)> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES)).timestamp();
        let claims = Claims {
            sub: self.admin_id.clone(),
            email: self.config.admin_email.clone(),
            sid: session_id.to_string(),
            exp,
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ContentError::Auth(format!("failed to issue token: {}", e)))?;
        Ok((token, exp))
    }

    async fn issue_session(&self, session_id: String) -> ContentResult<Session> {
        let (access_token, expires_at) = self.create_access_token(&session_id)?;
        let refresh_token = generate_refresh_token();

        let refresh_expiry = (Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS)).timestamp();
        let mut tokens = self.refresh_tokens.write().await;
        let now = Utc::now().timestamp();
        tokens.retain(|_, data| data.expires_at > now);
        tokens.insert(
            hash_refresh_token(&refresh_token),
            RefreshTokenData {
                session_id: session_id.clone(),
                expires_at: refresh_expiry,
            },
        );

        Ok(Session {
            id: session_id,
            user: SessionUser {
                id: self.admin_id.clone(),
                email: self.config.admin_email.clone(),
            },
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Starts a new session, replacing any previous one.
    pub async fn sign_in(&self, email: &str, password: &str) -> ContentResult<Session> {
        let email_matches = email.trim().eq_ignore_ascii_case(&self.config.admin_email);
        let password_matches = verify(password, &self.config.password_hash).unwrap_or(false);
        if !email_matches || !password_matches {
            tracing::warn!(email = %email, "failed admin sign-in");
            return Err(ContentError::Auth("Invalid email or password".to_string()));
        }

        self.refresh_tokens.write().await.clear();
        let session = self.issue_session(Uuid::new_v4().to_string()).await?;
        self.session.send_replace(Some(session.clone()));
        tracing::info!(session_id = %session.id, "admin signed in");
        Ok(session)
    }

    /// Ends the current session; every token issued for it stops working.
    pub async fn sign_out(&self) {
        self.refresh_tokens.write().await.clear();
        if let Some(previous) = self.session.send_replace(None) {
            tracing::info!(session_id = %previous.id, "admin signed out");
        }
    }

    /// Exchanges a refresh token for a new access/refresh pair in the
    /// same session. The presented refresh token is consumed.
    pub async fn refresh_session(&self, refresh_token: &str) -> ContentResult<Session> {
        let data = self
            .refresh_tokens
            .write()
            .await
            .remove(&hash_refresh_token(refresh_token))
            .ok_or_else(|| ContentError::Auth("Invalid refresh token".to_string()))?;

        if data.expires_at <= Utc::now().timestamp() {
            return Err(ContentError::Auth("Refresh token expired".to_string()));
        }
        let current = self.current_session().map(|s| s.id);
        if current.as_deref() != Some(data.session_id.as_str()) {
            return Err(ContentError::Auth("Session has ended".to_string()));
        }

        let session = self.issue_session(data.session_id).await?;
        self.session.send_replace(Some(session.clone()));
        tracing::debug!(session_id = %session.id, "session refreshed");
        Ok(session)
    }

    /// Verifies signature and expiry; session liveness is checked by the gate.
    pub fn verify_access_token(&self, token: &str) -> ContentResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ContentError::Auth("Invalid or expired token".to_string()))
    }
}

#[cfg(test)]
impl AdminAuth {
    /// admin@example.com / s3cret-pass with a cheap bcrypt cost.
    pub(crate) fn for_tests() -> Self {
        AdminAuth::new(
            AuthConfig::with_password("admin@example.com", "s3cret-pass", "test-secret", 4)
                .unwrap(),
        )
    }
}

//! OAuth2 access tokens for Google Cloud Storage

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::http::check_status;
use crate::error::{AppError, Result};

const VENDOR: &str = "Google OAuth";
const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.full_control";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the vendor-reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens for storage requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed token, e.g. for a storage emulator
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fields of a service account key file that the token flow needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    /// Parse either an inline JSON document or a path to a key file
    pub fn from_env_value(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let json = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            std::fs::read_to_string(trimmed).map_err(|e| {
                AppError::Storage(format!("Failed to read service account file '{}': {}", trimmed, e))
            })?
        };

        serde_json::from_str(&json)
            .map_err(|e| AppError::Storage(format!("Invalid service account credentials: {}", e)))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

/// JWT-bearer flow for a service account, with the token cached until near expiry
pub struct ServiceAccountTokenSource {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token_uri: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(client: Client, key: ServiceAccountKey, token_uri: Option<String>) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Storage(format!("Invalid service account private key: {}", e)))?;
        let token_uri = token_uri
            .or_else(|| key.token_uri.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        Ok(Self {
            client,
            key,
            encoding_key,
            token_uri,
            cached: Mutex::new(None),
        })
    }

    pub fn claims(&self, now: i64) -> AssertionClaims {
        AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: STORAGE_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Signed RS256 assertion exchanged for an access token
    pub fn assertion(&self, now: i64) -> Result<String> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &self.claims(now),
            &self.encoding_key,
        )
        .map_err(|e| AppError::Storage(format!("Failed to sign token assertion: {}", e)))
    }

    async fn fetch(&self, now: i64) -> Result<CachedToken> {
        let assertion = self.assertion(now)?;

        debug!(account = %self.key.client_email, "Requesting storage access token");

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let token: TokenResponse = check_status(VENDOR, response).await?.json().await?;

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        let cached = self.cached.lock().clone();
        if let Some(cached) = cached {
            if now < cached.expires_at - EXPIRY_MARGIN_SECS {
                return Ok(cached.token);
            }
        }

        let fresh = self.fetch(now).await?;
        let token = fresh.token.clone();
        *self.cached.lock() = Some(fresh);
        Ok(token)
    }
}

//! Google Cloud Storage (Firebase Storage bucket) implementation

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, header::CONTENT_TYPE, Client, Url};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::http::{build_client, check_status};
use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::storage::auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource};
use crate::storage::url::PublicUrl;
use crate::storage::ObjectStore;

const VENDOR: &str = "Cloud Storage";

/// JSON API client bound to one bucket
pub struct GcsStore {
    client: Client,
    bucket: String,
    upload_base_url: String,
    api_base_url: String,
    urls: PublicUrl,
    tokens: Arc<dyn TokenSource>,
}

impl GcsStore {
    pub fn new(
        client: Client,
        bucket: String,
        config: &StorageConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            urls: PublicUrl::new(&config.public_base_url, &bucket),
            bucket,
            upload_base_url: config.upload_base_url.clone(),
            api_base_url: config.api_base_url.clone(),
            tokens,
        }
    }

    /// Build a store from configuration
    ///
    /// Returns `Ok(None)` when no bucket is configured.
    pub fn from_config(config: &StorageConfig) -> Result<Option<Self>> {
        let Some(bucket) = config.bucket() else {
            return Ok(None);
        };

        let client = build_client(config.timeout_ms)?;

        let tokens: Arc<dyn TokenSource> = match (&config.access_token, config.credentials()) {
            (Some(token), _) if !token.is_empty() => Arc::new(StaticToken(token.clone())),
            (_, Some(credentials)) => {
                let key = ServiceAccountKey::from_env_value(&credentials)?;
                info!(account = %key.client_email, bucket = %bucket, "Using service account for storage");
                Arc::new(ServiceAccountTokenSource::new(
                    client.clone(),
                    key,
                    config.token_uri.clone(),
                )?)
            }
            _ => {
                return Err(AppError::MissingCredential(config.credentials_env.clone()));
            }
        };

        Ok(Some(Self::new(client, bucket, config, tokens)))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `<base>/b/<bucket>/o/<object>/...` with each segment percent-encoded
    fn object_api_url(&self, object: &str, suffix: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Storage(format!("Invalid storage API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Storage("Storage API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["b", self.bucket.as_str(), "o", object])
            .extend(suffix);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.tokens.access_token().await?))
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn upload(&self, object: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let url = format!(
            "{}/b/{}/o",
            self.upload_base_url.trim_end_matches('/'),
            self.bucket
        );

        debug!(bucket = %self.bucket, object = %object, bytes = data.len(), "Uploading object");

        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object)])
            .header(AUTHORIZATION, self.bearer().await?)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        check_status(VENDOR, response).await?;
        Ok(())
    }

    async fn make_public(&self, object: &str) -> Result<()> {
        let url = self.object_api_url(object, &["acl"])?;

        debug!(bucket = %self.bucket, object = %object, "Granting public read access");

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.bearer().await?)
            .json(&json!({ "entity": "allUsers", "role": "READER" }))
            .send()
            .await?;

        check_status(VENDOR, response).await?;
        Ok(())
    }

    fn public_url(&self, object: &str) -> String {
        self.urls.object_url(object)
    }
}

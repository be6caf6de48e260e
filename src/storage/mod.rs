//! Object storage for generated media

pub mod auth;
pub mod gcs;
pub mod url;

use async_trait::async_trait;

use crate::error::Result;

pub use gcs::GcsStore;

/// Bucket operations used by the narration pipeline
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite `object` with `data`
    async fn upload(&self, object: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Grant anonymous read access to `object`
    async fn make_public(&self, object: &str) -> Result<()>;

    /// URL at which a public object can be fetched
    fn public_url(&self, object: &str) -> String;
}

//! Durable storage for generated images and videos.

pub mod data_url;
pub mod fallback;
pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::{sync::Arc, time::Duration};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::generated_asset::AssetType;
use crate::errors::StorageError;
use crate::settings::AppConfig;
use self::{data_url::{extension_for, is_data_url, parse_data_url}, fallback::FallbackStore, local::LocalStore, s3::S3Store};

/// A place assets can be written to and read back from by URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Writes `data` and returns the URL the object is addressed by.
    async fn put(
        &self,
        asset_type: AssetType,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError>;

    /// Whether `url` points at an object held by this store.
    fn owns(&self, url: &str) -> bool;

    async fn signed_url(&self, url: &str, expires_in: Duration) -> Result<String, StorageError>;

    async fn get(&self, url: &str) -> Result<Bytes, StorageError>;

    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// Picks the backend once: S3 with local fallback when fully configured,
/// local disk otherwise.
pub async fn build_asset_store(config: &AppConfig) -> Arc<dyn AssetStore> {
    let local: Arc<dyn AssetStore> = Arc::new(LocalStore::new(&config.local_upload_dir));

    match config.s3_settings() {
        Some(settings) => {
            info!(
                bucket = %settings.bucket,
                region = %settings.region,
                fallback_dir = %config.local_upload_dir,
                "Asset storage: S3 with local fallback"
            );
            let s3: Arc<dyn AssetStore> = Arc::new(S3Store::new(&settings).await);
            Arc::new(FallbackStore::new(s3, local))
        }
        None => {
            warn!(dir = %config.local_upload_dir, "S3 not configured, asset storage: local disk");
            local
        }
    }
}

/// Uploads assets from data URLs or remote URLs and hands out
/// time-limited access URLs.
#[derive(Clone)]
pub struct AssetStorage {
    store: Arc<dyn AssetStore>,
    http: reqwest::Client,
    fetch_timeout: Duration,
}

impl AssetStorage {
    pub fn new(store: Arc<dyn AssetStore>, fetch_timeout: Duration) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            fetch_timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    #[instrument(skip(self, source), fields(backend = self.store.name(), data_url = is_data_url(source)))]
    pub async fn upload_from_url(
        &self,
        source: &str,
        asset_type: AssetType,
        user_id: &str,
    ) -> Result<String, StorageError> {
        let (content_type, data) = if is_data_url(source) {
            let decoded = parse_data_url(source)?;
            (decoded.content_type, decoded.bytes)
        } else {
            self.fetch(source, asset_type).await?
        };

        let content_type = content_type.unwrap_or_else(|| asset_type.default_content_type().to_string());
        let extension = extension_for(&content_type).unwrap_or(asset_type.default_extension());
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        let url = self
            .store
            .put(asset_type, user_id, &file_name, &content_type, data)
            .await?;

        info!(%url, "Asset stored");
        Ok(url)
    }

    async fn fetch(&self, source: &str, asset_type: AssetType) -> Result<(Option<String>, Bytes), StorageError> {
        let accept = match asset_type {
            AssetType::Image => "image/*",
            AssetType::Video => "video/*",
        };

        let response = self
            .http
            .get(source)
            .header(ACCEPT, accept)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| StorageError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Fetch(format!("{} returned {}", source, response.status())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::Fetch(e.to_string()))?;

        Ok((content_type, data))
    }

    /// Time-limited URL for a stored object. Anything the store cannot
    /// sign is returned unchanged.
    pub async fn signed_url(&self, url: &str, expires_in: Duration) -> String {
        if !self.store.owns(url) {
            return url.to_string();
        }
        match self.store.signed_url(url, expires_in).await {
            Ok(signed) => signed,
            Err(e) => {
                warn!(error = %e, "Failed to sign URL, returning original");
                url.to_string()
            }
        }
    }

    pub async fn read(&self, url: &str) -> Result<Bytes, StorageError> {
        self.store.get(url).await
    }

    pub async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.store.delete(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::data_url::to_data_url;

    fn local_storage() -> (AssetStorage, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("adlume-storage-{}", Uuid::new_v4()));
        let storage = AssetStorage::new(Arc::new(LocalStore::new(&dir)), Duration::from_secs(30));
        (storage, dir)
    }

    #[tokio::test]
    async fn data_url_upload_uses_declared_type() {
        let (storage, dir) = local_storage();
        let source = to_data_url("image/jpeg", b"jpeg-bytes");

        let url = storage.upload_from_url(&source, AssetType::Image, "user_1").await.unwrap();

        assert!(url.starts_with("/uploads/images/"));
        assert!(url.ends_with(".jpeg"));
        assert_eq!(&storage.read(&url).await.unwrap()[..], b"jpeg-bytes");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn invalid_data_url_is_rejected() {
        let (storage, _dir) = local_storage();
        let err = storage
            .upload_from_url("data:image/png;base64,!!!", AssetType::Image, "user_1")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidSource(_)));
    }

    #[tokio::test]
    async fn signing_falls_back_to_original_url() {
        let mut store = MockAssetStore::new();
        store.expect_owns().returning(|url| url.starts_with("https://bucket"));
        store
            .expect_signed_url()
            .returning(|_, _| Err(StorageError::Backend("expired credentials".into())));
        let storage = AssetStorage::new(Arc::new(store), Duration::from_secs(30));

        let owned = "https://bucket.s3.us-east-1.amazonaws.com/images/u/a.png";
        assert_eq!(storage.signed_url(owned, Duration::from_secs(60)).await, owned);

        let foreign = "https://cdn.example.com/a.png";
        assert_eq!(storage.signed_url(foreign, Duration::from_secs(60)).await, foreign);
    }
}

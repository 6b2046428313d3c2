use async_trait::async_trait;
use bytes::Bytes;
use std::{sync::Arc, time::Duration};
use tracing::warn;

use super::AssetStore;
use crate::entities::generated_asset::AssetType;
use crate::errors::StorageError;

/// Writes to `primary`, falling back to `fallback` when an upload fails.
/// Reads, signing and deletes go to whichever store owns the URL.
pub struct FallbackStore {
    primary: Arc<dyn AssetStore>,
    fallback: Arc<dyn AssetStore>,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn AssetStore>, fallback: Arc<dyn AssetStore>) -> Self {
        Self { primary, fallback }
    }

    fn owner(&self, url: &str) -> Option<&Arc<dyn AssetStore>> {
        if self.primary.owns(url) {
            Some(&self.primary)
        } else if self.fallback.owns(url) {
            Some(&self.fallback)
        } else {
            None
        }
    }
}

#[async_trait]
impl AssetStore for FallbackStore {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn put(
        &self,
        asset_type: AssetType,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        match self
            .primary
            .put(asset_type, user_id, file_name, content_type, data.clone())
            .await
        {
            Ok(url) => Ok(url),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Upload failed, falling back"
                );
                self.fallback
                    .put(asset_type, user_id, file_name, content_type, data)
                    .await
            }
        }
    }

    fn owns(&self, url: &str) -> bool {
        self.owner(url).is_some()
    }

    async fn signed_url(&self, url: &str, expires_in: Duration) -> Result<String, StorageError> {
        match self.owner(url) {
            Some(store) => store.signed_url(url, expires_in).await,
            None => Ok(url.to_string()),
        }
    }

    async fn get(&self, url: &str) -> Result<Bytes, StorageError> {
        match self.owner(url) {
            Some(store) => store.get(url).await,
            None => Err(StorageError::NotFound(url.to_string())),
        }
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        match self.owner(url) {
            Some(store) => store.delete(url).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::{local::LocalStore, MockAssetStore};

    #[tokio::test]
    async fn failed_primary_upload_lands_in_fallback() {
        let mut primary = MockAssetStore::new();
        primary.expect_name().return_const("s3");
        primary
            .expect_put()
            .times(1)
            .returning(|_, _, _, _, _| Err(StorageError::Backend("AccessDenied".into())));
        primary.expect_owns().returning(|url| url.contains("amazonaws.com"));

        let dir = std::env::temp_dir().join(format!("adlume-fallback-{}", uuid::Uuid::new_v4()));
        let store = FallbackStore::new(Arc::new(primary), Arc::new(LocalStore::new(&dir)));

        let url = store
            .put(AssetType::Image, "user_1", "a.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        assert_eq!(url, "/uploads/images/a.png");
        assert_eq!(&store.get(&url).await.unwrap()[..], b"png");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn foreign_urls_pass_through_signing() {
        let mut primary = MockAssetStore::new();
        primary.expect_owns().return_const(false);
        let dir = std::env::temp_dir().join("adlume-unused");
        let store = FallbackStore::new(Arc::new(primary), Arc::new(LocalStore::new(dir)));

        let url = "https://replicate.delivery/output.mp4";
        assert_eq!(store.signed_url(url, Duration::from_secs(1800)).await.unwrap(), url);
        assert!(matches!(store.get(url).await, Err(StorageError::NotFound(_))));
    }
}

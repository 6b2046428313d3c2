//! S3 asset store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use std::time::Duration;

use super::AssetStore;
use crate::entities::generated_asset::AssetType;
use crate::errors::StorageError;
use crate::settings::S3Settings;

/// Objects live under `{images|videos}/{user_id}/{file_name}` and are
/// addressed by their virtual-hosted URL.
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Store {
    pub async fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.as_str(),
            settings.secret_access_key.as_str(),
            None,
            None,
            "app-config",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            bucket: settings.bucket.clone(),
            region: settings.region.clone(),
        }
    }

    pub fn object_key(asset_type: AssetType, user_id: &str, file_name: &str) -> String {
        format!("{}/{}/{}", asset_type.folder(), user_id, file_name)
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key)
    }

    fn key_from_url(url: &str) -> Result<String, StorageError> {
        let parsed = url::Url::parse(url).map_err(|e| StorageError::InvalidSource(e.to_string()))?;
        let key = parsed.path().trim_start_matches('/');
        if key.is_empty() {
            return Err(StorageError::InvalidSource(format!("no object key in {url}")));
        }
        Ok(key.to_string())
    }
}

fn is_missing_object(message: &str) -> bool {
    message.contains("NoSuchKey") || message.contains("404") || message.contains("NotFound")
}

#[async_trait]
impl AssetStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        asset_type: AssetType,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        let key = Self::object_key(asset_type, user_id, file_name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(self.object_url(&key))
    }

    fn owns(&self, url: &str) -> bool {
        url.contains("amazonaws.com")
    }

    async fn signed_url(&self, url: &str, expires_in: Duration) -> Result<String, StorageError> {
        let key = Self::key_from_url(url)?;
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn get(&self, url: &str) -> Result<Bytes, StorageError> {
        let key = Self::key_from_url(url)?;

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let message = e.to_string();
                if is_missing_object(&message) {
                    StorageError::NotFound(key.clone())
                } else {
                    StorageError::Backend(message)
                }
            })?;

        let data = result
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(data.into_bytes())
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = Self::key_from_url(url)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }
}

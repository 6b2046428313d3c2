//! Local filesystem asset store.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use super::AssetStore;
use crate::entities::generated_asset::AssetType;
use crate::errors::StorageError;

pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Stores objects as `{base_path}/{images|videos}/{file_name}` and
/// addresses them as `/uploads/{images|videos}/{file_name}`.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn public_url(asset_type: AssetType, file_name: &str) -> String {
        format!("{}{}/{}", PUBLIC_PREFIX, asset_type.folder(), file_name)
    }

    /// Resolves a public URL to its file, refusing anything outside the
    /// two asset folders.
    fn path_for(&self, url: &str) -> Result<PathBuf, StorageError> {
        let relative = url
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or_else(|| StorageError::NotFound(url.to_string()))?;
        let (folder, file_name) = relative
            .split_once('/')
            .ok_or_else(|| StorageError::NotFound(url.to_string()))?;

        if AssetType::from_folder(folder).is_none()
            || file_name.is_empty()
            || file_name.starts_with('.')
            || file_name.contains(['/', '\\'])
        {
            return Err(StorageError::NotFound(url.to_string()));
        }
        Ok(self.base_path.join(folder).join(file_name))
    }
}

#[async_trait]
impl AssetStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        asset_type: AssetType,
        _user_id: &str,
        file_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        let dir = self.base_path.join(asset_type.folder());
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(file_name), &data).await?;
        Ok(Self::public_url(asset_type, file_name))
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with(PUBLIC_PREFIX)
    }

    async fn signed_url(&self, url: &str, _expires_in: Duration) -> Result<String, StorageError> {
        Ok(url.to_string())
    }

    async fn get(&self, url: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(url)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(url.to_string())
            } else {
                StorageError::from(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let path = self.path_for(url)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

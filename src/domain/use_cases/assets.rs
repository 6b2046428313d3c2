use std::time::Duration;

use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        generated_asset::AssetType,
        saved_asset::{
            AssetDownload, DeleteSavedAssetRequest, DownloadAssetQuery, NewSavedAsset, SaveAssetRequest,
            SaveAssetResponse, SavedAssetView, SavedAssetWithSource, SavedAssetsResponse,
        },
        user::Identity,
    },
    errors::{AppError, StorageError},
    infrastructure::storage::AssetStorage,
    shared_repos::SharedRepositories,
    use_cases::present,
};

/// Expiry of signed URLs in saved-asset listings.
pub const SAVED_ASSET_URL_TTL: Duration = Duration::from_secs(3600);

/// Id the client sends while a generation is still in flight.
const GENERATING_SENTINEL: &str = "generating";

pub struct AssetHandler {
    pub repos: SharedRepositories,
    pub storage: AssetStorage,
    pub purge_deleted_assets: bool,
}

impl AssetHandler {
    pub fn new(repos: SharedRepositories, storage: AssetStorage, purge_deleted_assets: bool) -> Self {
        AssetHandler { repos, storage, purge_deleted_assets }
    }

    /// Copies a generated asset into durable storage and records it as saved.
    #[instrument(skip(self, request), fields(caller = %identity.id))]
    pub async fn save_asset(&self, identity: &Identity, request: SaveAssetRequest) -> Result<SaveAssetResponse, AppError> {
        request.validate()?;
        let asset_id = request.generated_asset_id.unwrap_or_default();
        let user_id = request.user_id.unwrap_or_default();

        if asset_id == GENERATING_SENTINEL {
            return Err(AppError::StillGenerating);
        }

        identity.ensure_is(&user_id)?;

        self.save(&asset_id, &user_id)
            .await
            .map_err(|e| e.in_context("Failed to save asset"))
    }

    async fn save(&self, asset_id: &str, user_id: &str) -> Result<SaveAssetResponse, AppError> {
        let generated_asset_not_found = || AppError::NotFound("Generated asset not found".into());

        let asset_id = Uuid::parse_str(asset_id).map_err(|_| generated_asset_not_found())?;
        let generated = self.repos.generated_asset_repo
            .get_generated_asset(&asset_id)
            .await?
            .ok_or_else(generated_asset_not_found)?;

        if generated.user_id != user_id {
            warn!(asset_id = %asset_id, owner = %generated.user_id, "Save attempted on another user's asset");
            return Err(AppError::ForbiddenAccess("Unauthorized: Asset does not belong to user".into()));
        }

        if let Some(existing) = self.repos.saved_asset_repo.find_by_generated_asset(&asset_id).await? {
            return Err(already_saved(&existing));
        }

        let source = generated.url.as_deref()
            .ok_or_else(|| AppError::BadRequest("Generated asset does not have a URL".into()))?;

        let stored_url = self.storage
            .upload_from_url(source, generated.asset_type, user_id)
            .await?;

        let saved = self.repos.saved_asset_repo
            .create_saved_asset(&NewSavedAsset {
                user_id: user_id.to_string(),
                generated_asset_id: asset_id,
                s3_url: stored_url,
            })
            .await;

        let saved = match saved {
            Ok(saved) => saved,
            Err(AppError::Conflict(_)) => {
                // Lost a race with a concurrent save of the same asset.
                return match self.repos.saved_asset_repo.find_by_generated_asset(&asset_id).await? {
                    Some(existing) => Err(already_saved(&existing)),
                    None => Err(AppError::Conflict("Asset is already saved".into())),
                };
            }
            Err(e) => return Err(e),
        };

        info!(saved_asset_id = %saved.id, url = %saved.s3_url, "Asset saved");

        Ok(SaveAssetResponse {
            success: true,
            saved_asset: SavedAssetWithSource { saved, generated_asset: generated },
            message: "Asset saved successfully".into(),
        })
    }

    #[instrument(skip(self), fields(caller = %identity.id))]
    pub async fn list_saved_assets(
        &self,
        identity: &Identity,
        user_id: Option<String>,
    ) -> Result<SavedAssetsResponse, AppError> {
        let user_id = present(user_id)
            .ok_or_else(|| AppError::BadRequest("Missing required parameter: userId".into()))?;
        identity.ensure_is(&user_id)?;

        let saved = self.repos.saved_asset_repo
            .list_saved_assets(&user_id)
            .await
            .map_err(|e| e.in_context("Failed to fetch saved assets"))?;

        let mut views = Vec::with_capacity(saved.len());
        for details in saved {
            let signed = self.storage.signed_url(&details.s3_url, SAVED_ASSET_URL_TTL).await;
            views.push(SavedAssetView::new(details, signed));
        }

        Ok(SavedAssetsResponse {
            success: true,
            count: views.len(),
            saved_assets: views,
        })
    }

    #[instrument(skip(self, request), fields(caller = %identity.id))]
    pub async fn delete_saved_asset(
        &self,
        identity: &Identity,
        request: DeleteSavedAssetRequest,
    ) -> Result<serde_json::Value, AppError> {
        request.validate()?;
        let saved_id = request.saved_asset_id.unwrap_or_default();
        let user_id = request.user_id.unwrap_or_default();
        identity.ensure_is(&user_id)?;

        let not_found = || AppError::NotFound("Saved asset not found".into());
        let saved_id = Uuid::parse_str(&saved_id).map_err(|_| not_found())?;
        let saved = self.repos.saved_asset_repo
            .get_saved_asset(&saved_id)
            .await?
            .ok_or_else(not_found)?;

        if saved.user_id != user_id {
            warn!(saved_asset_id = %saved_id, owner = %saved.user_id, "Delete attempted on another user's asset");
            return Err(AppError::ForbiddenAccess("Unauthorized: Asset does not belong to user".into()));
        }

        self.repos.saved_asset_repo
            .delete_saved_asset(&saved_id)
            .await
            .map_err(|e| e.in_context("Failed to delete saved asset"))?;

        if self.purge_deleted_assets {
            if let Err(e) = self.storage.delete(&saved.s3_url).await {
                warn!(error = %e, url = %saved.s3_url, "Failed to remove stored object");
            }
        }

        Ok(serde_json::json!({
            "success": true,
            "message": "Saved asset deleted successfully"
        }))
    }

    #[instrument(skip(self), fields(caller = %identity.id))]
    pub async fn download_asset(&self, identity: &Identity, query: DownloadAssetQuery) -> Result<AssetDownload, AppError> {
        query.validate()?;
        let asset_id = query.asset_id.unwrap_or_default();
        let user_id = query.user_id.unwrap_or_default();
        identity.ensure_is(&user_id)?;

        let not_found = || AppError::NotFound("Asset not found".into());
        let asset_id = Uuid::parse_str(&asset_id).map_err(|_| not_found())?;
        let saved = self.repos.saved_asset_repo
            .get_saved_asset(&asset_id)
            .await?
            .ok_or_else(not_found)?;

        if saved.user_id != user_id {
            warn!(saved_asset_id = %asset_id, owner = %saved.user_id, "Download attempted on another user's asset");
            return Err(AppError::ForbiddenAccess("Unauthorized: Asset does not belong to user".into()));
        }

        let bytes = self.storage.read(&saved.s3_url).await.map_err(|e| {
            warn!(error = %e, url = %saved.s3_url, "Failed to read stored asset");
            match e {
                StorageError::NotFound(_) => not_found(),
                other => AppError::InternalError {
                    error: "Failed to fetch asset from storage".into(),
                    details: Some(other.to_string()),
                },
            }
        })?;

        Ok(AssetDownload {
            bytes,
            content_type: saved.asset_type.default_content_type(),
            file_name: saved.download_file_name(),
        })
    }

    /// Reads a file written by the local store, for the public uploads route.
    pub async fn read_upload(&self, folder: &str, file_name: &str) -> Result<(bytes::Bytes, String), AppError> {
        let asset_type = AssetType::from_folder(folder)
            .ok_or_else(|| AppError::NotFound("File not found".into()))?;
        let url = format!("/uploads/{}/{}", asset_type.folder(), file_name);

        let bytes = self.storage.read(&url).await.map_err(|e| match e {
            StorageError::NotFound(_) | StorageError::InvalidSource(_) => AppError::NotFound("File not found".into()),
            other => AppError::from(other),
        })?;

        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| asset_type.default_content_type().to_string());

        Ok((bytes, content_type))
    }
}

fn already_saved(existing: &crate::entities::saved_asset::SavedAsset) -> AppError {
    AppError::AlreadySaved(serde_json::to_value(existing).unwrap_or(serde_json::Value::Null))
}

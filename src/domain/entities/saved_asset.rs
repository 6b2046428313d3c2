use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::generated_asset::{AssetType, GeneratedAsset};
use super::validation::not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedAsset {
    pub id: Uuid,
    pub user_id: String,
    pub generated_asset_id: Uuid,
    pub s3_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSavedAsset {
    pub user_id: String,
    pub generated_asset_id: Uuid,
    pub s3_url: String,
}

/// Saved asset joined with the fields of its generated asset that
/// listings and downloads need.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SavedAssetDetails {
    pub id: Uuid,
    pub user_id: String,
    pub generated_asset_id: Uuid,
    pub s3_url: String,
    pub created_at: DateTime<Utc>,
    pub asset_type: AssetType,
    pub prompt: String,
    pub asset_created_at: DateTime<Utc>,
}

impl SavedAssetDetails {
    pub fn download_file_name(&self) -> String {
        format!(
            "adlume-{}-{}.{}",
            self.asset_type.as_lowercase(),
            self.created_at.format("%Y-%m-%d"),
            self.asset_type.default_extension()
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAssetSummary {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAssetView {
    pub id: Uuid,
    pub user_id: String,
    pub generated_asset_id: Uuid,
    /// Time-limited URL for display.
    pub s3_url: String,
    pub original_s3_url: String,
    pub created_at: DateTime<Utc>,
    pub generated_asset: GeneratedAssetSummary,
}

impl SavedAssetView {
    pub fn new(details: SavedAssetDetails, signed_url: String) -> Self {
        SavedAssetView {
            id: details.id,
            user_id: details.user_id,
            generated_asset_id: details.generated_asset_id,
            s3_url: signed_url,
            original_s3_url: details.s3_url,
            created_at: details.created_at,
            generated_asset: GeneratedAssetSummary {
                id: details.generated_asset_id,
                asset_type: details.asset_type,
                prompt: details.prompt,
                created_at: details.asset_created_at,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAssetsResponse {
    pub success: bool,
    pub saved_assets: Vec<SavedAssetView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAssetWithSource {
    #[serde(flatten)]
    pub saved: SavedAsset,
    pub generated_asset: GeneratedAsset,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAssetResponse {
    pub success: bool,
    pub saved_asset: SavedAssetWithSource,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveAssetRequest {
    #[validate(
        required(message = "Missing required fields: generatedAssetId, userId"),
        custom(function = "not_blank", message = "Missing required fields: generatedAssetId, userId")
    )]
    pub generated_asset_id: Option<String>,
    #[validate(
        required(message = "Missing required fields: generatedAssetId, userId"),
        custom(function = "not_blank", message = "Missing required fields: generatedAssetId, userId")
    )]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSavedAssetRequest {
    #[validate(
        required(message = "Missing required fields: savedAssetId, userId"),
        custom(function = "not_blank", message = "Missing required fields: savedAssetId, userId")
    )]
    pub saved_asset_id: Option<String>,
    #[validate(
        required(message = "Missing required fields: savedAssetId, userId"),
        custom(function = "not_blank", message = "Missing required fields: savedAssetId, userId")
    )]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DownloadAssetQuery {
    #[validate(
        required(message = "Missing required parameters: assetId, userId"),
        custom(function = "not_blank", message = "Missing required parameters: assetId, userId")
    )]
    pub asset_id: Option<String>,
    #[validate(
        required(message = "Missing required parameters: assetId, userId"),
        custom(function = "not_blank", message = "Missing required parameters: assetId, userId")
    )]
    pub user_id: Option<String>,
}

/// Bytes and headers for an asset download.
#[derive(Debug)]
pub struct AssetDownload {
    pub bytes: bytes::Bytes,
    pub content_type: &'static str,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn download_name_uses_saved_date_and_type() {
        let details = SavedAssetDetails {
            id: Uuid::new_v4(),
            user_id: "user_1".into(),
            generated_asset_id: Uuid::new_v4(),
            s3_url: "/uploads/videos/a.mp4".into(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap(),
            asset_type: AssetType::Video,
            prompt: "sneakers".into(),
            asset_created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        };
        assert_eq!(details.download_file_name(), "adlume-video-2025-03-09.mp4");
    }
}

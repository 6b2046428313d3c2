use serde::Serialize;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[sqlx(type_name = "asset_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Image,
    Video,
}

impl AssetType {
    /// Directory segment used by both object storage and the local store.
    pub fn folder(&self) -> &'static str {
        match self {
            AssetType::Image => "images",
            AssetType::Video => "videos",
        }
    }

    pub fn from_folder(folder: &str) -> Option<Self> {
        match folder {
            "images" => Some(AssetType::Image),
            "videos" => Some(AssetType::Video),
            _ => None,
        }
    }

    pub fn default_content_type(&self) -> &'static str {
        match self {
            AssetType::Image => "image/png",
            AssetType::Video => "video/mp4",
        }
    }

    pub fn default_extension(&self) -> &'static str {
        match self {
            AssetType::Image => "png",
            AssetType::Video => "mp4",
        }
    }

    pub fn as_lowercase(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "asset_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetStatus {
    Completed,
    Failed,
    Processing,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub prompt: String,
    pub status: AssetStatus,
    pub url: Option<String>,
    pub credits_used: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneratedAsset {
    pub user_id: String,
    pub asset_type: AssetType,
    pub prompt: String,
    pub status: AssetStatus,
    pub url: Option<String>,
    pub credits_used: i32,
}

impl NewGeneratedAsset {
    pub fn completed(user_id: &str, asset_type: AssetType, prompt: &str, url: String, credits_used: i32) -> Self {
        NewGeneratedAsset {
            user_id: user_id.to_string(),
            asset_type,
            prompt: prompt.to_string(),
            status: AssetStatus::Completed,
            url: Some(url),
            credits_used,
        }
    }
}

/// Outcome of recording a generation against a user's balance.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGeneration {
    pub asset: GeneratedAsset,
    pub remaining_credits: i32,
}

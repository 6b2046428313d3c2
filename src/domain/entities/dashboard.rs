use serde::Serialize;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::generated_asset::{AssetStatus, AssetType};

/// Per-status generation counts for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCounts {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
}

impl AssetCounts {
    /// Percentage of completed generations, rounded; 0 with no history.
    pub fn success_rate(&self) -> i64 {
        if self.total <= 0 {
            return 0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecentAsset {
    pub id: Uuid,
    pub asset_type: AssetType,
    pub prompt: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub saved_asset_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LastGeneration {
    pub created_at: DateTime<Utc>,
    pub status: AssetStatus,
}

#[derive(Debug, Serialize)]
pub struct DashboardUser {
    pub credits: i32,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdStats {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub success_rate: i64,
}

impl From<AssetCounts> for AdStats {
    fn from(counts: AssetCounts) -> Self {
        AdStats {
            total: counts.total,
            completed: counts.completed,
            failed: counts.failed,
            success_rate: counts.success_rate(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LastGenerated {
    pub date: DateTime<Utc>,
    pub status: AssetStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAd {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub prompt: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_saved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub user: DashboardUser,
    pub ads: AdStats,
    pub saved: i64,
    pub last_generated: Option<LastGenerated>,
    pub recent_ads: Vec<RecentAd>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
}

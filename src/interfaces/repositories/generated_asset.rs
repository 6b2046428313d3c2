use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::{
        dashboard::{AssetCounts, LastGeneration, RecentAsset},
        generated_asset::{GeneratedAsset, NewGeneratedAsset, RecordedGeneration},
        user::NewUser,
    },
    errors::AppError,
    repositories::{
        sqlx_repo::SqlxGeneratedAssetRepo,
        user::{insert_user_if_missing, lock_credits},
    },
};

const ASSET_COLUMNS: &str = "id, user_id, asset_type, prompt, status, url, credits_used, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeneratedAssetRepository: Send + Sync {
    /// Creates `user` when missing, stores the asset and debits
    /// `asset.credits_used` with a floor at zero, all in one transaction.
    /// With `enforce_balance` a short balance aborts with
    /// `InsufficientCredits` before anything is written.
    async fn record_generation(
        &self,
        user: &NewUser,
        asset: &NewGeneratedAsset,
        enforce_balance: bool,
    ) -> Result<RecordedGeneration, AppError>;

    async fn get_generated_asset(&self, id: &Uuid) -> Result<Option<GeneratedAsset>, AppError>;
    async fn count_by_status(&self, user_id: &str) -> Result<AssetCounts, AppError>;

    /// Newest completed assets that have a URL, flagged when saved.
    async fn recent_completed(&self, user_id: &str, limit: i64) -> Result<Vec<RecentAsset>, AppError>;
    async fn last_generation(&self, user_id: &str) -> Result<Option<LastGeneration>, AppError>;
}

impl SqlxGeneratedAssetRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxGeneratedAssetRepo { pool }
    }
}

#[async_trait]
impl GeneratedAssetRepository for SqlxGeneratedAssetRepo {
    async fn record_generation(
        &self,
        user: &NewUser,
        asset: &NewGeneratedAsset,
        enforce_balance: bool,
    ) -> Result<RecordedGeneration, AppError> {
        let mut tx = self.pool.begin().await?;

        insert_user_if_missing(&mut *tx, user).await?;
        let available = lock_credits(&mut *tx, &asset.user_id).await?;

        if enforce_balance && available < asset.credits_used {
            return Err(AppError::InsufficientCredits {
                required: asset.credits_used,
                available,
            });
        }

        let stored = sqlx::query_as::<_, GeneratedAsset>(&format!(
            "INSERT INTO generated_assets (id, user_id, asset_type, prompt, status, url, credits_used) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ASSET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&asset.user_id)
        .bind(asset.asset_type)
        .bind(&asset.prompt)
        .bind(asset.status)
        .bind(&asset.url)
        .bind(asset.credits_used)
        .fetch_one(&mut *tx)
        .await?;

        let remaining_credits = sqlx::query_scalar::<_, i32>(
            "UPDATE users SET credits = GREATEST(credits - $2, 0), updated_at = NOW() WHERE id = $1 RETURNING credits",
        )
        .bind(&asset.user_id)
        .bind(asset.credits_used)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RecordedGeneration { asset: stored, remaining_credits })
    }

    async fn get_generated_asset(&self, id: &Uuid) -> Result<Option<GeneratedAsset>, AppError> {
        let asset = sqlx::query_as::<_, GeneratedAsset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM generated_assets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    async fn count_by_status(&self, user_id: &str) -> Result<AssetCounts, AppError> {
        let (total, completed, failed) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'COMPLETED'),
                COUNT(*) FILTER (WHERE status = 'FAILED')
            FROM generated_assets
            WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AssetCounts { total, completed, failed })
    }

    async fn recent_completed(&self, user_id: &str, limit: i64) -> Result<Vec<RecentAsset>, AppError> {
        let assets = sqlx::query_as::<_, RecentAsset>(
            r#"SELECT g.id, g.asset_type, g.prompt, g.url, g.created_at, s.id AS saved_asset_id
            FROM generated_assets g
            LEFT JOIN saved_assets s ON s.generated_asset_id = g.id
            WHERE g.user_id = $1 AND g.status = 'COMPLETED' AND g.url IS NOT NULL
            ORDER BY g.created_at DESC
            LIMIT $2"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn last_generation(&self, user_id: &str) -> Result<Option<LastGeneration>, AppError> {
        let last = sqlx::query_as::<_, LastGeneration>(
            "SELECT created_at, status FROM generated_assets WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(last)
    }
}

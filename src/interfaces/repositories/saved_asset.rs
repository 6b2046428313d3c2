use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::saved_asset::{NewSavedAsset, SavedAsset, SavedAssetDetails},
    errors::AppError,
    repositories::sqlx_repo::SqlxSavedAssetRepo,
};

const SAVED_COLUMNS: &str = "id, user_id, generated_asset_id, s3_url, created_at";

const DETAILS_QUERY: &str = r#"SELECT s.id, s.user_id, s.generated_asset_id, s.s3_url, s.created_at,
        g.asset_type, g.prompt, g.created_at AS asset_created_at
    FROM saved_assets s
    JOIN generated_assets g ON g.id = s.generated_asset_id"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SavedAssetRepository: Send + Sync {
    async fn find_by_generated_asset(&self, generated_asset_id: &Uuid) -> Result<Option<SavedAsset>, AppError>;

    /// Fails with `Conflict` when the generated asset is already saved.
    async fn create_saved_asset(&self, saved: &NewSavedAsset) -> Result<SavedAsset, AppError>;
    async fn get_saved_asset(&self, id: &Uuid) -> Result<Option<SavedAssetDetails>, AppError>;
    async fn list_saved_assets(&self, user_id: &str) -> Result<Vec<SavedAssetDetails>, AppError>;
    async fn delete_saved_asset(&self, id: &Uuid) -> Result<(), AppError>;
    async fn count_saved_assets(&self, user_id: &str) -> Result<i64, AppError>;
}

impl SqlxSavedAssetRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxSavedAssetRepo { pool }
    }
}

#[async_trait]
impl SavedAssetRepository for SqlxSavedAssetRepo {
    async fn find_by_generated_asset(&self, generated_asset_id: &Uuid) -> Result<Option<SavedAsset>, AppError> {
        let saved = sqlx::query_as::<_, SavedAsset>(&format!(
            "SELECT {SAVED_COLUMNS} FROM saved_assets WHERE generated_asset_id = $1"
        ))
        .bind(generated_asset_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn create_saved_asset(&self, saved: &NewSavedAsset) -> Result<SavedAsset, AppError> {
        let created = sqlx::query_as::<_, SavedAsset>(&format!(
            "INSERT INTO saved_assets (id, user_id, generated_asset_id, s3_url) VALUES ($1, $2, $3, $4) \
             RETURNING {SAVED_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&saved.user_id)
        .bind(saved.generated_asset_id)
        .bind(&saved.s3_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_saved_asset(&self, id: &Uuid) -> Result<Option<SavedAssetDetails>, AppError> {
        let details = sqlx::query_as::<_, SavedAssetDetails>(&format!("{DETAILS_QUERY} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(details)
    }

    async fn list_saved_assets(&self, user_id: &str) -> Result<Vec<SavedAssetDetails>, AppError> {
        let saved = sqlx::query_as::<_, SavedAssetDetails>(&format!(
            "{DETAILS_QUERY} WHERE s.user_id = $1 ORDER BY s.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn delete_saved_asset(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM saved_assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Saved asset not found".into()));
        }

        Ok(())
    }

    async fn count_saved_assets(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM saved_assets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

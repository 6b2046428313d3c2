use async_trait::async_trait;

use crate::{errors::AppError, repositories::sqlx_repo::SqlxPromoCodeRepo};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    async fn has_used_promo_code(&self, user_id: &str, promo_code: &str) -> Result<bool, AppError>;
}

impl SqlxPromoCodeRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxPromoCodeRepo { pool }
    }
}

#[async_trait]
impl PromoCodeRepository for SqlxPromoCodeRepo {
    async fn has_used_promo_code(&self, user_id: &str, promo_code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM promo_code_usages WHERE user_id = $1 AND promo_code = $2)",
        )
        .bind(user_id)
        .bind(promo_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

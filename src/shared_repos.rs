use std::sync::Arc;

use crate::repositories::{
    generated_asset::GeneratedAssetRepository,
    promo_code::PromoCodeRepository,
    saved_asset::SavedAssetRepository,
    sqlx_repo::{SqlxGeneratedAssetRepo, SqlxPromoCodeRepo, SqlxSavedAssetRepo, SqlxUserRepo},
    user::UserRepository,
};

#[derive(Clone)]
pub struct SharedRepositories {
    pub user_repo: Arc<dyn UserRepository>,
    pub generated_asset_repo: Arc<dyn GeneratedAssetRepository>,
    pub saved_asset_repo: Arc<dyn SavedAssetRepository>,
    pub promo_code_repo: Arc<dyn PromoCodeRepository>,
}

impl SharedRepositories {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SharedRepositories {
            user_repo: Arc::new(SqlxUserRepo::new(pool.clone())),
            generated_asset_repo: Arc::new(SqlxGeneratedAssetRepo::new(pool.clone())),
            saved_asset_repo: Arc::new(SqlxSavedAssetRepo::new(pool.clone())),
            promo_code_repo: Arc::new(SqlxPromoCodeRepo::new(pool)),
        }
    }
}

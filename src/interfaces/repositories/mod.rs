pub mod generated_asset;
pub mod promo_code;
pub mod saved_asset;
pub mod sqlx_repo;
pub mod token;
pub mod user;

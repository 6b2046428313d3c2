pub mod dashboard;
pub mod generated_asset;
pub mod generation;
pub mod promo_code;
pub mod saved_asset;
pub mod token;
pub mod user;
pub mod validation;

use serde::Serialize;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeUsage {
    pub id: Uuid,
    pub user_id: String,
    pub promo_code: String,
    pub credits_added: i32,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPromoCodeUsage {
    pub user_id: String,
    pub promo_code: String,
    pub credits_added: i32,
    pub source: String,
}

pub const DEFAULT_PROMO_SOURCE: &str = "promo_code";

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    entities::{
        promo_code::NewPromoCodeUsage,
        user::{CreditAction, NewUser, User},
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxUserRepo,
};

const USER_COLUMNS: &str = "id, name, email, credits, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;
    async fn update_user_name(&self, id: &str, name: &str) -> Result<User, AppError>;

    /// Adds or subtracts credits in one transaction, creating `user` first
    /// when missing. Subtraction floors at zero. A promo usage, when given,
    /// is recorded in the same transaction; reuse yields `Conflict`.
    async fn apply_credit_change(
        &self,
        user: &NewUser,
        action: CreditAction,
        amount: i32,
        promo: Option<NewPromoCodeUsage>,
    ) -> Result<User, AppError>;
}

impl SqlxUserRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxUserRepo { pool }
    }
}

/// Inserts the user unless a row with the same id exists.
pub(crate) async fn insert_user_if_missing(conn: &mut PgConnection, user: &NewUser) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO users (id, name, email, credits) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.credits)
    .execute(conn)
    .await?;
    Ok(())
}

/// Locks the user's row for the rest of the transaction.
pub(crate) async fn lock_credits(conn: &mut PgConnection, id: &str) -> Result<i32, AppError> {
    let credits = sqlx::query_scalar::<_, i32>("SELECT credits FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(credits)
}

#[async_trait]
impl UserRepository for SqlxUserRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, credits) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.credits)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_user_name(&self, id: &str, name: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn apply_credit_change(
        &self,
        user: &NewUser,
        action: CreditAction,
        amount: i32,
        promo: Option<NewPromoCodeUsage>,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        insert_user_if_missing(&mut *tx, user).await?;
        let current = lock_credits(&mut *tx, &user.id).await?;

        let updated = match action {
            CreditAction::Add => current.saturating_add(amount),
            CreditAction::Subtract => current.saturating_sub(amount).max(0),
        };

        let saved = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET credits = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.id)
        .bind(updated)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(promo) = promo {
            sqlx::query(
                "INSERT INTO promo_code_usages (id, user_id, promo_code, credits_added, source) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(&promo.user_id)
            .bind(&promo.promo_code)
            .bind(promo.credits_added)
            .bind(&promo.source)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(saved)
    }
}

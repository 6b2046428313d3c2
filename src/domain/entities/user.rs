use serde::{Serialize, Deserialize};
use validator::Validate;
use chrono::{DateTime, Utc};

use crate::entities::token::Claims;
use crate::errors::AppError;
use super::validation::validate_credit_action;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-provider subject.
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub credits: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub credits: i32,
}

impl NewUser {
    pub fn from_identity(identity: &Identity, credits: i32) -> Self {
        NewUser {
            id: identity.id.clone(),
            name: identity.display_name(),
            email: identity.email.clone(),
            credits,
        }
    }
}

/// The authenticated caller as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
            .to_string()
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    Found,
}

#[derive(Debug, Serialize)]
pub struct SyncUserResponse {
    pub success: bool,
    pub user: User,
    pub action: SyncAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditAction {
    Add,
    Subtract,
}

impl CreditAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add" => Some(CreditAction::Add),
            "subtract" => Some(CreditAction::Subtract),
            _ => None,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            CreditAction::Add => "added",
            CreditAction::Subtract => "subtracted",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCreditsRequest {
    #[validate(
        required(message = "Missing required fields: credits, action"),
        range(min = 1, message = "Credits must be a positive number")
    )]
    pub credits: Option<i32>,
    #[validate(
        required(message = "Missing required fields: credits, action"),
        custom(function = "validate_credit_action")
    )]
    pub action: Option<String>,
    pub source: Option<String>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub success: bool,
    pub credits: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Identity {
    /// Rejects requests whose asserted `userId` is not the signed-in user.
    pub fn ensure_is(&self, user_id: &str) -> Result<(), AppError> {
        if self.id == user_id {
            return Ok(());
        }
        tracing::warn!(caller = %self.id, asserted = %user_id, "userId does not match session");
        Err(AppError::ForbiddenAccess("Forbidden: userId does not match the signed-in user".into()))
    }
}

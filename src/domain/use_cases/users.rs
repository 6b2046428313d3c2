use tracing::{info, instrument};
use validator::Validate;

use crate::{
    entities::{
        promo_code::{NewPromoCodeUsage, DEFAULT_PROMO_SOURCE},
        user::{CreditAction, CreditsResponse, Identity, NewUser, SyncAction, SyncUserResponse, UpdateCreditsRequest},
    },
    errors::AppError,
    shared_repos::SharedRepositories,
    use_cases::present,
};

pub struct UserHandler {
    pub repos: SharedRepositories,
    pub default_credits: i32,
}

impl UserHandler {
    pub fn new(repos: SharedRepositories, default_credits: i32) -> Self {
        UserHandler { repos, default_credits }
    }

    /// Creates the caller's record or refreshes its display name.
    #[instrument(skip(self), fields(user_id = %identity.id))]
    pub async fn sync_user(&self, identity: &Identity) -> Result<SyncUserResponse, AppError> {
        let existing = self.repos.user_repo.get_user_by_id(&identity.id).await?;

        let (user, action) = match existing {
            Some(_) => {
                let user = self.repos.user_repo
                    .update_user_name(&identity.id, &identity.display_name())
                    .await?;
                (user, SyncAction::Updated)
            }
            None => {
                let user = self.repos.user_repo
                    .create_user(&NewUser::from_identity(identity, self.default_credits))
                    .await?;
                info!(credits = user.credits, "Created user on sync");
                (user, SyncAction::Created)
            }
        };

        Ok(SyncUserResponse { success: true, user, action })
    }

    /// Returns the caller's record, creating it on first contact.
    #[instrument(skip(self), fields(user_id = %identity.id))]
    pub async fn get_or_create_user(&self, identity: &Identity) -> Result<SyncUserResponse, AppError> {
        if let Some(user) = self.repos.user_repo.get_user_by_id(&identity.id).await? {
            return Ok(SyncUserResponse { success: true, user, action: SyncAction::Found });
        }

        let user = self.repos.user_repo
            .create_user(&NewUser::from_identity(identity, self.default_credits))
            .await?;

        Ok(SyncUserResponse { success: true, user, action: SyncAction::Created })
    }

    #[instrument(skip(self), fields(caller = %identity.id))]
    pub async fn get_credits(&self, identity: &Identity, user_id: Option<String>) -> Result<CreditsResponse, AppError> {
        let user_id = present(user_id)
            .ok_or_else(|| AppError::BadRequest("Missing required parameter: userId".into()))?;
        identity.ensure_is(&user_id)?;

        let user = match self.repos.user_repo.get_user_by_id(&user_id).await? {
            Some(user) => user,
            None => self.repos.user_repo.create_user(&self.credit_account(identity)).await?,
        };

        Ok(CreditsResponse {
            success: true,
            credits: user.credits,
            name: user.name,
            message: None,
        })
    }

    /// Adds or subtracts credits, recording promo code grants once per user.
    #[instrument(skip(self, request), fields(user_id = %identity.id))]
    pub async fn update_credits(
        &self,
        identity: &Identity,
        request: UpdateCreditsRequest,
    ) -> Result<CreditsResponse, AppError> {
        request.validate()?;

        let amount = request.credits.unwrap_or_default();
        let action = request.action.as_deref()
            .and_then(CreditAction::parse)
            .ok_or_else(|| AppError::BadRequest("Invalid action. Must be 'add' or 'subtract'".into()))?;

        let promo_code = present(request.promo_code);
        if let Some(code) = &promo_code {
            if self.repos.promo_code_repo.has_used_promo_code(&identity.id, code).await? {
                return Err(promo_reused());
            }
        }

        let promo = match (action, promo_code) {
            (CreditAction::Add, Some(code)) => Some(NewPromoCodeUsage {
                user_id: identity.id.clone(),
                promo_code: code,
                credits_added: amount,
                source: present(request.source).unwrap_or_else(|| DEFAULT_PROMO_SOURCE.to_string()),
            }),
            _ => None,
        };

        let user = self.repos.user_repo
            .apply_credit_change(&self.credit_account(identity), action, amount, promo)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => promo_reused(),
                other => other,
            })?;

        info!(action = action.past_tense(), amount, credits = user.credits, "Updated credits");

        Ok(CreditsResponse {
            success: true,
            credits: user.credits,
            name: None,
            message: Some(format!("Successfully {} {} credits", action.past_tense(), amount)),
        })
    }

    /// Row created when the credits endpoints meet an unknown user.
    fn credit_account(&self, identity: &Identity) -> NewUser {
        let mut new_user = NewUser::from_identity(identity, self.default_credits);
        if new_user.email.is_none() {
            new_user.email = Some(format!("{}@temp.local", identity.id));
        }
        new_user
    }
}

fn promo_reused() -> AppError {
    AppError::BadRequest("Promo code has already been used".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use mockall::predicate::*;

    use crate::{
        entities::user::User,
        repositories::{
            generated_asset::MockGeneratedAssetRepository,
            promo_code::MockPromoCodeRepository,
            saved_asset::MockSavedAssetRepository,
            user::MockUserRepository,
        },
    };

    fn identity() -> Identity {
        Identity { id: "user_1".into(), name: Some("Ada".into()), email: None }
    }

    fn user(credits: i32) -> User {
        User {
            id: "user_1".into(),
            name: Some("Ada".into()),
            email: None,
            credits,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn handler(users: MockUserRepository, promos: MockPromoCodeRepository) -> UserHandler {
        let repos = SharedRepositories {
            user_repo: Arc::new(users),
            generated_asset_repo: Arc::new(MockGeneratedAssetRepository::new()),
            saved_asset_repo: Arc::new(MockSavedAssetRepository::new()),
            promo_code_repo: Arc::new(promos),
        };
        UserHandler::new(repos, 10)
    }

    #[tokio::test]
    async fn sync_creates_missing_user_with_default_credits() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().returning(|_| Ok(None));
        users.expect_create_user()
            .withf(|u| u.credits == 10 && u.name == "Ada")
            .returning(|_| Ok(user(10)));

        let response = handler(users, MockPromoCodeRepository::new())
            .sync_user(&identity())
            .await
            .unwrap();

        assert_eq!(response.action, SyncAction::Created);
        assert_eq!(response.user.credits, 10);
    }

    #[tokio::test]
    async fn sync_updates_only_the_name() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().returning(|_| Ok(Some(user(42))));
        users.expect_update_user_name()
            .with(eq("user_1"), eq("Ada"))
            .returning(|_, _| Ok(user(42)));
        users.expect_create_user().never();

        let response = handler(users, MockPromoCodeRepository::new())
            .sync_user(&identity())
            .await
            .unwrap();

        assert_eq!(response.action, SyncAction::Updated);
        assert_eq!(response.user.credits, 42);
    }

    #[tokio::test]
    async fn credits_for_another_user_are_forbidden() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().never();

        let err = handler(users, MockPromoCodeRepository::new())
            .get_credits(&identity(), Some("user_2".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ForbiddenAccess(_)));
    }

    #[tokio::test]
    async fn credits_lookup_creates_placeholder_email() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().returning(|_| Ok(None));
        users.expect_create_user()
            .withf(|u| u.email.as_deref() == Some("user_1@temp.local"))
            .returning(|_| Ok(user(10)));

        let response = handler(users, MockPromoCodeRepository::new())
            .get_credits(&identity(), Some("user_1".into()))
            .await
            .unwrap();

        assert_eq!(response.credits, 10);
        assert_eq!(response.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn update_requires_credits_and_action() {
        let request = UpdateCreditsRequest { credits: Some(5), action: None, source: None, promo_code: None };

        let err = handler(MockUserRepository::new(), MockPromoCodeRepository::new())
            .update_credits(&identity(), request)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required fields: credits, action");
    }

    #[tokio::test]
    async fn update_rejects_unknown_action() {
        let request = UpdateCreditsRequest {
            credits: Some(5),
            action: Some("multiply".into()),
            source: None,
            promo_code: None,
        };

        let err = handler(MockUserRepository::new(), MockPromoCodeRepository::new())
            .update_credits(&identity(), request)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.to_string(), "Invalid action. Must be 'add' or 'subtract'");
    }

    #[tokio::test]
    async fn non_positive_credits_are_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_apply_credit_change().never();
        let request = UpdateCreditsRequest {
            credits: Some(0),
            action: Some("subtract".into()),
            source: None,
            promo_code: None,
        };

        let err = handler(users, MockPromoCodeRepository::new())
            .update_credits(&identity(), request)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Credits must be a positive number");
    }

    #[tokio::test]
    async fn credit_change_for_new_user_gets_placeholder_email() {
        let mut users = MockUserRepository::new();
        users.expect_apply_credit_change()
            .withf(|u, action, amount, promo| {
                u.email.as_deref() == Some("user_1@temp.local")
                    && u.credits == 10
                    && *action == CreditAction::Subtract
                    && *amount == 3
                    && promo.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(user(7)));

        let request = UpdateCreditsRequest {
            credits: Some(3),
            action: Some("subtract".into()),
            source: None,
            promo_code: None,
        };
        let response = handler(users, MockPromoCodeRepository::new())
            .update_credits(&identity(), request)
            .await
            .unwrap();

        assert_eq!(response.credits, 7);
    }

    #[tokio::test]
    async fn reused_promo_code_is_rejected_before_any_write() {
        let mut promos = MockPromoCodeRepository::new();
        promos.expect_has_used_promo_code()
            .with(eq("user_1"), eq("WELCOME"))
            .returning(|_, _| Ok(true));
        let mut users = MockUserRepository::new();
        users.expect_apply_credit_change().never();

        let request = UpdateCreditsRequest {
            credits: Some(100),
            action: Some("add".into()),
            source: None,
            promo_code: Some("WELCOME".into()),
        };
        let err = handler(users, promos).update_credits(&identity(), request).await.unwrap_err();

        assert_eq!(err.to_string(), "Promo code has already been used");
    }

    #[tokio::test]
    async fn promo_grant_is_recorded_with_default_source() {
        let mut promos = MockPromoCodeRepository::new();
        promos.expect_has_used_promo_code().returning(|_, _| Ok(false));
        let mut users = MockUserRepository::new();
        users.expect_apply_credit_change()
            .withf(|_, action, amount, promo| {
                *action == CreditAction::Add
                    && *amount == 100
                    && promo.as_ref().is_some_and(|p| p.source == "promo_code" && p.promo_code == "WELCOME")
            })
            .returning(|_, _, _, _| Ok(user(110)));

        let request = UpdateCreditsRequest {
            credits: Some(100),
            action: Some("add".into()),
            source: None,
            promo_code: Some("WELCOME".into()),
        };
        let response = handler(users, promos).update_credits(&identity(), request).await.unwrap();

        assert_eq!(response.credits, 110);
        assert_eq!(response.message.as_deref(), Some("Successfully added 100 credits"));
    }

    #[tokio::test]
    async fn concurrent_promo_insert_maps_to_reuse() {
        let mut promos = MockPromoCodeRepository::new();
        promos.expect_has_used_promo_code().returning(|_, _| Ok(false));
        let mut users = MockUserRepository::new();
        users.expect_apply_credit_change()
            .returning(|_, _, _, _| Err(AppError::Conflict("Database conflict occurred".into())));

        let request = UpdateCreditsRequest {
            credits: Some(50),
            action: Some("add".into()),
            source: Some("campaign".into()),
            promo_code: Some("SPRING".into()),
        };
        let err = handler(users, promos).update_credits(&identity(), request).await.unwrap_err();

        assert_eq!(err.to_string(), "Promo code has already been used");
    }
}

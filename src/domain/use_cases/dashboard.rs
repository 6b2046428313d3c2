use std::time::Duration;

use tracing::instrument;

use crate::{
    entities::{
        dashboard::{DashboardResponse, DashboardStats, DashboardUser, LastGenerated, RecentAd},
        user::Identity,
    },
    errors::AppError,
    infrastructure::storage::AssetStorage,
    shared_repos::SharedRepositories,
    use_cases::present,
};

const RECENT_ADS_LIMIT: i64 = 6;
const PREVIEW_URL_TTL: Duration = Duration::from_secs(1800);

pub struct DashboardHandler {
    pub repos: SharedRepositories,
    pub storage: AssetStorage,
}

impl DashboardHandler {
    pub fn new(repos: SharedRepositories, storage: AssetStorage) -> Self {
        DashboardHandler { repos, storage }
    }

    #[instrument(skip(self), fields(caller = %identity.id))]
    pub async fn get_stats(&self, identity: &Identity, user_id: Option<String>) -> Result<DashboardResponse, AppError> {
        let user_id = present(user_id)
            .ok_or_else(|| AppError::BadRequest("Missing required parameter: userId".into()))?;
        identity.ensure_is(&user_id)?;

        self.collect(&user_id)
            .await
            .map_err(|e| e.in_context("Failed to fetch dashboard stats"))
    }

    async fn collect(&self, user_id: &str) -> Result<DashboardResponse, AppError> {
        let user = self.repos.user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found. Please refresh the page.".into()))?;

        let (counts, saved, last, recent) = futures::try_join!(
            self.repos.generated_asset_repo.count_by_status(user_id),
            self.repos.saved_asset_repo.count_saved_assets(user_id),
            self.repos.generated_asset_repo.last_generation(user_id),
            self.repos.generated_asset_repo.recent_completed(user_id, RECENT_ADS_LIMIT),
        )?;

        let mut recent_ads = Vec::with_capacity(recent.len());
        for asset in recent {
            let url = match &asset.url {
                Some(url) => Some(self.storage.signed_url(url, PREVIEW_URL_TTL).await),
                None => None,
            };
            recent_ads.push(RecentAd {
                id: asset.id,
                asset_type: asset.asset_type,
                prompt: asset.prompt,
                url,
                created_at: asset.created_at,
                is_saved: asset.saved_asset_id.is_some(),
            });
        }

        Ok(DashboardResponse {
            success: true,
            stats: DashboardStats {
                user: DashboardUser {
                    credits: user.credits,
                    name: user.name,
                    email: user.email,
                },
                ads: counts.into(),
                saved,
                last_generated: last.map(|l| LastGenerated { date: l.created_at, status: l.status }),
                recent_ads,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::{
        entities::{
            dashboard::{AssetCounts, RecentAsset},
            generated_asset::AssetType,
            user::User,
        },
        infrastructure::storage::MockAssetStore,
        repositories::{
            generated_asset::MockGeneratedAssetRepository,
            promo_code::MockPromoCodeRepository,
            saved_asset::MockSavedAssetRepository,
            user::MockUserRepository,
        },
    };

    fn identity() -> Identity {
        Identity { id: "user_1".into(), name: None, email: None }
    }

    fn handler(
        users: MockUserRepository,
        assets: MockGeneratedAssetRepository,
        saved: MockSavedAssetRepository,
        store: MockAssetStore,
    ) -> DashboardHandler {
        let repos = SharedRepositories {
            user_repo: Arc::new(users),
            generated_asset_repo: Arc::new(assets),
            saved_asset_repo: Arc::new(saved),
            promo_code_repo: Arc::new(MockPromoCodeRepository::new()),
        };
        DashboardHandler::new(repos, AssetStorage::new(Arc::new(store), Duration::from_secs(30)))
    }

    #[tokio::test]
    async fn unknown_user_is_404() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().returning(|_| Ok(None));

        let err = handler(users, MockGeneratedAssetRepository::new(), MockSavedAssetRepository::new(), MockAssetStore::new())
            .get_stats(&identity(), Some("user_1".into()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User not found. Please refresh the page.");
    }

    #[tokio::test]
    async fn stats_aggregate_counts_and_sign_previews() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().returning(|_| {
            Ok(Some(User {
                id: "user_1".into(),
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                credits: 33,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        let mut assets = MockGeneratedAssetRepository::new();
        assets.expect_count_by_status()
            .returning(|_| Ok(AssetCounts { total: 3, completed: 2, failed: 1 }));
        assets.expect_last_generation().returning(|_| Ok(None));
        assets.expect_recent_completed()
            .withf(|_, limit| *limit == 6)
            .returning(|_, _| {
                Ok(vec![
                    RecentAsset {
                        id: Uuid::new_v4(),
                        asset_type: AssetType::Video,
                        prompt: "coffee".into(),
                        url: Some("https://bucket.s3.us-east-1.amazonaws.com/videos/user_1/a.mp4".into()),
                        created_at: Utc::now(),
                        saved_asset_id: Some(Uuid::new_v4()),
                    },
                    RecentAsset {
                        id: Uuid::new_v4(),
                        asset_type: AssetType::Image,
                        prompt: "tea".into(),
                        url: Some("data:image/png;base64,AA==".into()),
                        created_at: Utc::now(),
                        saved_asset_id: None,
                    },
                ])
            });
        let mut saved = MockSavedAssetRepository::new();
        saved.expect_count_saved_assets().returning(|_| Ok(1));
        let mut store = MockAssetStore::new();
        store.expect_owns().returning(|url| url.contains("amazonaws.com"));
        store.expect_signed_url()
            .withf(|_, ttl| *ttl == Duration::from_secs(1800))
            .times(1)
            .returning(|url, _| Ok(format!("{url}?sig")));

        let response = handler(users, assets, saved, store)
            .get_stats(&identity(), Some("user_1".into()))
            .await
            .unwrap();

        let stats = response.stats;
        assert_eq!(stats.user.credits, 33);
        assert_eq!(stats.ads.success_rate, 67);
        assert_eq!(stats.saved, 1);
        assert!(stats.last_generated.is_none());
        assert_eq!(stats.recent_ads.len(), 2);
        assert!(stats.recent_ads[0].is_saved);
        assert!(stats.recent_ads[0].url.as_deref().is_some_and(|u| u.ends_with("?sig")));
        assert_eq!(stats.recent_ads[1].url.as_deref(), Some("data:image/png;base64,AA=="));
        assert!(!stats.recent_ads[1].is_saved);
    }
}

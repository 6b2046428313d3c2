use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod shared_repos;
pub mod telemetry;

pub use domain::{entities, pricing, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, providers, retry, storage};

use auth::jwt::JwtVerifier;
use providers::Providers;
use repositories::token::SessionTokenVerifier;
use retry::RetryPolicy;
use settings::{AppConfig, IdentityKeys};
use shared_repos::SharedRepositories;
use storage::{build_asset_store, AssetStorage};
use use_cases::{assets::AssetHandler, dashboard::DashboardHandler, generation::GenerationHandler, users::UserHandler};

pub struct AppState {
    pub user_handler: UserHandler,
    pub generation_handler: GenerationHandler,
    pub asset_handler: AssetHandler,
    pub dashboard_handler: DashboardHandler,
    pub verifier: Arc<dyn SessionTokenVerifier>,
    pub repos: SharedRepositories,
    pub storage: AssetStorage,
    pub providers: Providers,
}

impl AppState {
    pub async fn new(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Self> {
        let keys = IdentityKeys::try_from(config)?;
        let verifier = Arc::new(JwtVerifier::new(keys));
        let repos = SharedRepositories::new(pool);
        let providers = Providers::from_config(config);
        let storage = AssetStorage::new(build_asset_store(config).await, config.asset_fetch_timeout());

        Ok(Self::from_parts(config, repos, providers, storage, verifier))
    }

    /// Wires the use cases from already-built collaborators.
    pub fn from_parts(
        config: &AppConfig,
        repos: SharedRepositories,
        providers: Providers,
        storage: AssetStorage,
        verifier: Arc<dyn SessionTokenVerifier>,
    ) -> Self {
        let retry = RetryPolicy::new(config.retry_max_retries, config.retry_base_delay());

        AppState {
            user_handler: UserHandler::new(repos.clone(), config.default_user_credits),
            generation_handler: GenerationHandler::new(
                repos.clone(),
                providers.clone(),
                retry,
                config.default_user_credits,
                config.enforce_credit_balance,
            ),
            asset_handler: AssetHandler::new(repos.clone(), storage.clone(), config.purge_deleted_assets),
            dashboard_handler: DashboardHandler::new(repos.clone(), storage.clone()),
            verifier,
            repos,
            storage,
            providers,
        }
    }
}

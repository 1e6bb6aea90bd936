use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::{MailClient, ObjectStorage};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, PlanLimitService, SeaOrmAuthService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("ForgeFit/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<MailClient>,

    /// Present only when storage is enabled in config.
    pub storage: Option<Arc<ObjectStorage>>,

    pub auth_service: Arc<dyn AuthService>,

    pub plan_limits: Arc<PlanLimitService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.server.http_timeout_seconds)?;

        let mailer = Arc::new(MailClient::new(http_client, config.email.clone()));

        let storage = if config.storage.enabled {
            Some(Arc::new(ObjectStorage::new(&config.storage).await?))
        } else {
            info!("Object storage disabled, image endpoints will be unavailable");
            None
        };

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            &config.auth,
            config.security.clone(),
            mailer.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let plan_limits = Arc::new(PlanLimitService::new(store.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            storage,
            auth_service,
            plan_limits,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}

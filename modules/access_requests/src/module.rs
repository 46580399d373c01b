use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::dto::NotificationDto;
use crate::api::rest::routes;
use crate::api::rest::sse::{SseBroadcaster, SseNotificationPublisher};
use crate::bot::BotDispatcher;
use crate::config::AccessRequestsConfig;
use crate::contract::client::AccessRequestsApi;
use crate::contract::model::Identity;
use crate::domain::policy::AccessPolicy;
use crate::domain::ports::DownloadLauncher;
use crate::domain::repo::StatusStore;
use crate::domain::service::Service;
use crate::gateways::local::AccessRequestsLocalClient;
use crate::infra::launcher::ScriptLauncher;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmStatusStore;

/// The access_requests module: store, lifecycle service, chat front-end and
/// REST surface wired together over one database connection.
#[derive(Clone)]
pub struct AccessRequests {
    service: Arc<Service>,
    client: Arc<dyn AccessRequestsApi>,
    bot: Arc<BotDispatcher>,
    notifications: SseBroadcaster<NotificationDto>,
}

impl AccessRequests {
    /// Create or upgrade the schema. Run once at startup, before `init`.
    pub async fn migrate(db: &db::DbHandle) -> anyhow::Result<()> {
        Self::migrate_connection(&db.sea()).await
    }

    pub async fn migrate_connection(conn: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running access_requests database migrations");
        Migrator::up(conn, None).await?;
        info!("Access requests database migrations completed successfully");
        Ok(())
    }

    /// Status store over `conn`, for tooling that bypasses the lifecycle service.
    pub fn status_store(conn: DatabaseConnection) -> Arc<dyn StatusStore> {
        Arc::new(SeaOrmStatusStore::new(conn))
    }

    /// Wire the module with the script launcher from the configuration.
    pub fn init(db: &db::DbHandle, cfg: &AccessRequestsConfig) -> anyhow::Result<Self> {
        let launcher = Arc::new(ScriptLauncher::new(&cfg.download.script_path));
        Self::from_connection(db.sea(), cfg, launcher)
    }

    pub fn from_connection(
        conn: DatabaseConnection,
        cfg: &AccessRequestsConfig,
        launcher: Arc<dyn DownloadLauncher>,
    ) -> anyhow::Result<Self> {
        info!("Initializing access_requests module");
        cfg.validate()?;
        debug!(
            "Loaded access_requests config: default_page_size={}, max_page_size={}",
            cfg.default_page_size, cfg.max_page_size
        );

        let admin = Identity(cfg.admin_identity);
        let notifications = SseBroadcaster::new(cfg.notifications_capacity);
        let publisher = SseNotificationPublisher::new(notifications.clone(), admin);

        let service = Arc::new(Service::new(
            Self::status_store(conn),
            AccessPolicy::new(admin),
            Arc::new(publisher),
            launcher,
            cfg.service_config(),
        ));

        // In-process client; the chat front-end only talks to the public contract
        let client: Arc<dyn AccessRequestsApi> =
            Arc::new(AccessRequestsLocalClient::new(service.clone()));
        let bot = Arc::new(BotDispatcher::new(client.clone()));

        Ok(Self {
            service,
            client,
            bot,
            notifications,
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn client(&self) -> Arc<dyn AccessRequestsApi> {
        self.client.clone()
    }

    pub fn bot(&self) -> Arc<BotDispatcher> {
        self.bot.clone()
    }

    pub fn notifications(&self) -> SseBroadcaster<NotificationDto> {
        self.notifications.clone()
    }

    /// Mount the REST and chat routes on `router`.
    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering access_requests REST routes");
        routes::register_routes(
            router,
            self.service.clone(),
            self.bot.clone(),
            self.notifications.clone(),
        )
    }
}

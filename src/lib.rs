#[macro_use]
extern crate rocket;

pub mod campaign;
pub mod config;
pub mod db;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod mailer;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod store;
pub mod tabular;
pub mod unsubscribe;

use crate::config::AppConfig;
use crate::db::CampaignDb;
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors();

    let rocket = rocket::build()
        .attach(RequestLogger)
        .attach(CampaignDb::init());

    let rocket = match cors {
        Ok(cors) => rocket.attach(cors),
        Err(err) => {
            log::error!("invalid CORS configuration, continuing without it: {}", err);
            rocket
        }
    };

    rocket
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match CampaignDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        match store::run_migrations(&pool).await {
                            Ok(_) => {
                                log::info!("database migrations successful");
                                Ok(rocket)
                            }
                            Err(e) => {
                                log::error!("database migrations failed: {}", e);
                                Err(rocket)
                            }
                        }
                    }
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        // Handlers receive the pool through managed state rather than a
        // per-request `Connection`, which keeps them mountable in tests.
        .attach(AdHoc::try_on_ignite("Manage DB Pool", |rocket| async move {
            match CampaignDb::fetch(&rocket) {
                Some(db) => {
                    let pool = (**db).clone();
                    Ok(rocket.manage(pool))
                }
                None => Err(rocket),
            }
        }))
        .attach(AdHoc::try_on_ignite(
            "Application Configuration",
            |rocket| async move {
                let config = AppConfig::from_env();

                if let Err(err) = std::fs::create_dir_all(&config.upload_dir) {
                    log::error!(
                        "failed to create upload folder {}: {}",
                        config.upload_dir.display(),
                        err
                    );
                    return Err(rocket);
                }
                log::info!(
                    "upload folder initialized at: {}",
                    config.upload_dir.display()
                );

                let transport = mailer::transport_from_config(&config);

                Ok(rocket.manage(config).manage(transport))
            },
        ))
        .mount(
            routes::API_BASE,
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                routes::health::readiness_check,
                // Recipient routes
                routes::recipients::list_recipients,
                routes::recipients::import_recipients,
                // Exclusion routes
                routes::exclusions::list_exclusions,
                routes::exclusions::export_exclusions,
                // Campaign routes
                routes::campaigns::list_campaign_history,
                routes::campaigns::send_campaign,
                // Unsubscribe
                routes::unsubscribe::unsubscribe,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Campaign API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::config::AppConfig;
    use crate::mailer::{
        MailTransport, OutgoingMessage, SenderCredentials, SharedTransport, TransportError,
    };
    use crate::models::Contact;
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Convenience helpers for seeding the three tables in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        /// Create a fixture helper bound to the provided pool.
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert an active recipient, returning its id.
        pub async fn insert_recipient(&self, name: &str, email: &str) -> Result<i32, sqlx::Error> {
            crate::store::recipients::insert_recipient(self.pool, &Contact::new(name, email)).await
        }

        /// Insert an excluded recipient, returning its id.
        pub async fn insert_excluded(&self, name: &str, email: &str) -> Result<i32, sqlx::Error> {
            crate::store::exclusions::insert_excluded(self.pool, &Contact::new(name, email)).await
        }

        /// Name/email pairs currently on the active list, in insertion order.
        pub async fn recipient_pairs(&self) -> Result<Vec<(String, String)>, sqlx::Error> {
            sqlx::query_as("SELECT name, email FROM recipients ORDER BY id")
                .fetch_all(self.pool)
                .await
        }

        /// Name/email pairs currently on the exclusion list, in insertion order.
        pub async fn excluded_pairs(&self) -> Result<Vec<(String, String)>, sqlx::Error> {
            sqlx::query_as("SELECT name, email FROM excluded_recipients ORDER BY id")
                .fetch_all(self.pool)
                .await
        }
    }

    /// Transport that records every message instead of sending it.
    ///
    /// Addresses registered with [`RecordingTransport::failing_for`] are
    /// rejected so callers can observe per-recipient failure handling.
    #[derive(Default)]
    pub struct RecordingTransport {
        sent: Mutex<Vec<OutgoingMessage>>,
        attempts: Mutex<Vec<String>>,
        failing: HashSet<String>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_for<I, S>(addresses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                failing: addresses.into_iter().map(Into::into).collect(),
                ..Self::default()
            }
        }

        /// Messages that were accepted, in delivery order.
        pub fn sent(&self) -> Vec<OutgoingMessage> {
            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }

        /// Every address a delivery was attempted for, in order.
        pub fn attempts(&self) -> Vec<String> {
            self.attempts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    #[rocket::async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(
            &self,
            message: &OutgoingMessage,
            _credentials: Option<&SenderCredentials>,
        ) -> Result<(), TransportError> {
            self.attempts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(message.to.clone());

            if self.failing.contains(&message.to) {
                return Err(TransportError::Rejected(format!(
                    "550 mailbox unavailable: {}",
                    message.to
                )));
            }

            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(message.clone());
            Ok(())
        }
    }

    pub mod database {
        use crate::store::migration::MIGRATOR;
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, ImageExt, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral, fully migrated database for integration tests.
        ///
        /// Uses the server named by `TEST_DATABASE_URL` when set, otherwise a
        /// disposable Postgres container. Either way each instance gets its
        /// own freshly created database.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                match std::env::var("TEST_DATABASE_URL") {
                    Ok(url) => {
                        let options: PgConnectOptions = url.parse()?;
                        Self::provision(options, None).await
                    }
                    Err(_) => Self::new().await,
                }
            }

            /// Provision a fresh database inside a new Postgres container.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().with_tag("16-alpine").start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
                let options: PgConnectOptions = admin_url.parse()?;

                Self::provision(options, Some(container)).await
            }

            async fn provision(
                base_options: PgConnectOptions,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options = base_options.log_statements(LevelFilter::Off);
                let admin_options = base_options.clone().database("postgres");

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("campaigns_{}", Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", database_name);
                sqlx::query(&create_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            /// Cloneable connection pool for use in tests and Rocket state.
            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            /// Convenience method returning a clone of the pooled connection handle.
            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database_with_fallback(self.admin_options.clone(), &self.database_name).await?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }

        async fn drop_database_with_fallback(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_force = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", database_name);
            let result = match sqlx::query(&drop_force).execute(&admin_pool).await {
                Ok(_) => Ok(()),
                Err(err) if force_drop_unsupported(&err) => {
                    let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\"", database_name);
                    sqlx::query(&drop_sql).execute(&admin_pool).await.map(|_| ())
                }
                Err(err) => Err(err),
            };

            admin_pool.close().await;
            result
        }

        /// `WITH (FORCE)` only exists from Postgres 13 onwards.
        fn force_drop_unsupported(err: &sqlx::Error) -> bool {
            matches!(
                err,
                sqlx::Error::Database(db_err)
                    if db_err
                        .code()
                        .map(|code| code == "42601" || code == "0A000")
                        .unwrap_or(false)
            )
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        config: AppConfig,
        transport: Option<SharedTransport>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                pg_pool: None,
                config: AppConfig::default(),
                transport: None,
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push((crate::routes::API_BASE.to_string(), routes));
            self
        }

        /// Manage a `PgPool` instance for tests that exercise database-backed routes.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        /// Replace the default application configuration.
        pub fn manage_config(mut self, config: AppConfig) -> Self {
            self.config = config;
            self
        }

        /// Manage the transport campaign routes deliver through.
        pub fn manage_transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
            self.transport = Some(transport);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }

            if let Some(transport) = self.transport {
                rocket = rocket.manage(transport);
            }

            rocket.manage(self.config)
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}

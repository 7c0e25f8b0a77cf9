mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, GoogleOAuthSettings};
pub use repos::{ISubscriptionRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{FrozenSys, ISys};
use system::RealSys;

#[derive(Clone)]
pub struct TempoContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub push: Arc<dyn IPushSender>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl TempoContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        Self {
            repos,
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            push: Arc::new(HttpPushSender::new()),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> TempoContext {
    TempoContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

/// Context backed by in-memory repos and a stub push sender. Used by tests,
/// no database required.
pub fn setup_inmemory_context() -> TempoContext {
    TempoContext {
        repos: Repos::create_inmemory(),
        config: Config::new(),
        sys: Arc::new(RealSys {}),
        push: Arc::new(StubPushSender::new()),
    }
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}

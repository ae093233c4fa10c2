use std::sync::Arc;

use cotiza_agent::{ChatCompletionsProvider, ProviderError, ScopeProvider};
use cotiza_core::config::{has_api_key, AppConfig, ConfigError, LoadOptions};
use cotiza_db::{connect_with_config, migrations, DbPool, Repositories};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub repos: Repositories,
    pub provider: Arc<dyn ScopeProvider>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client setup failed: {0}")]
    Provider(#[source] ProviderError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let provider = ChatCompletionsProvider::from_config(&config.llm).map_err(BootstrapError::Provider)?;
    if config.llm.provider.requires_api_key() && !has_api_key(&config.llm) {
        warn!(
            event_name = "system.bootstrap.llm_unconfigured",
            correlation_id = "bootstrap",
            provider = ?config.llm.provider,
            "no llm api key configured; scope generation will use baseline estimates"
        );
    }

    Ok(Application {
        repos: Repositories::sql(db_pool.clone()),
        db_pool,
        provider: Arc::new(provider),
        config,
    })
}

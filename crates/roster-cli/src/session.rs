use crate::cli::ConnArgs;
use crate::config::ProjectConfig;
use anyhow::Context;
use roster::{InstrumentedClient, Pool, PoolClient};

/// A loaded config plus the pool built from it.
pub struct Session {
    pub config: ProjectConfig,
    pool: Pool,
}

impl Session {
    pub fn open(conn: &ConnArgs) -> anyhow::Result<Self> {
        let config = ProjectConfig::load(conn.config.clone(), conn.database.as_deref())?;
        let pool = roster::create_pool_with_settings(config.database_url(), &config.pool_settings())
            .context("failed to create connection pool")?;
        tracing::debug!(config = %config.config_path.display(), "session opened");
        Ok(Self { config, pool })
    }

    pub async fn connection(&self) -> anyhow::Result<PoolClient> {
        self.pool
            .get()
            .await
            .context("failed to acquire a database connection")
    }

    /// A pooled connection that logs and counts every statement.
    pub async fn instrumented(&self) -> anyhow::Result<InstrumentedClient<PoolClient>> {
        let client = self.connection().await?;
        Ok(InstrumentedClient::new(client).with_config(self.config.monitor_config()))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

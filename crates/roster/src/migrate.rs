//! Schema migrations via [`refinery`].
//!
//! The SQL files under `crates/roster/migrations` are embedded at compile time.
//!
//! ```ignore
//! let pool = roster::create_pool(&database_url)?;
//! let report = roster::migrate::run_pool(&pool).await?;
//! ```

use crate::error::RosterResult;

pub use refinery::{Migration, Report, Runner};

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Runner over the embedded migrations.
pub fn runner() -> Runner {
    embedded::migrations::runner()
}

/// Names of the embedded migrations, in version order (`V1__create_team_member`).
pub fn embedded_names() -> Vec<String> {
    let runner = runner();
    let mut migrations: Vec<&Migration> = runner.get_migrations().iter().collect();
    migrations.sort_by_key(|m| m.version());
    migrations
        .into_iter()
        .map(|m| format!("V{}__{}", m.version(), m.name()))
        .collect()
}

/// Apply pending migrations on a single connection.
pub async fn run(client: &mut tokio_postgres::Client) -> RosterResult<Report> {
    let report = runner().run_async(client).await?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(report)
}

/// Acquire a connection from a pool and apply pending migrations on it.
#[cfg(feature = "pool")]
pub async fn run_pool(pool: &deadpool_postgres::Pool) -> RosterResult<Report> {
    let mut client = pool.get().await?;
    run(&mut client).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_migration_is_embedded() {
        assert_eq!(embedded_names(), vec!["V1__create_team_member".to_string()]);
    }
}

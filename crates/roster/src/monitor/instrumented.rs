use super::config::MonitorConfig;
use super::stats::StatsMonitor;
use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryResult};
use crate::client::GenericClient;
use crate::error::{RosterError, RosterResult};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// A `GenericClient` wrapper that logs every statement and counts it.
///
/// Events go to the `roster.sql` target: DEBUG on success, WARN past the
/// slow-query threshold, ERROR on failure.
pub struct InstrumentedClient<C> {
    client: C,
    stats: Arc<StatsMonitor>,
    config: MonitorConfig,
}

impl<C: GenericClient> InstrumentedClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            stats: Arc::new(StatsMonitor::new()),
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share counters with other clients.
    pub fn with_stats(mut self, stats: Arc<StatsMonitor>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<StatsMonitor> {
        &self.stats
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn display_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    fn report(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let slow = self
            .config
            .slow_query_threshold
            .is_some_and(|threshold| duration > threshold);
        self.stats.record(ctx, duration, result, slow);

        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN => tracing::warn!($($field)*),
                    _ => tracing::debug!($($field)*),
                }
            };
        }

        let level = match (result, slow) {
            (QueryResult::Error(_), _) => Level::ERROR,
            (_, true) => Level::WARN,
            _ => Level::DEBUG,
        };
        let message = match (result, slow) {
            (QueryResult::Error(_), _) => "query failed",
            (_, true) => "slow query",
            _ => "query",
        };
        let tag = ctx.tag.as_deref().unwrap_or("-");
        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        let sql = self.display_sql(&ctx.sql);
        emit_at_level!(
            level,
            target: "roster.sql",
            query_type = %ctx.query_type,
            tag,
            param_count = ctx.param_count,
            elapsed_ms,
            outcome = ?result,
            sql = %sql,
            "{message}"
        );
    }

    async fn run<T, Fut>(
        &self,
        sql: &str,
        param_count: usize,
        tag: Option<&str>,
        fut: Fut,
        outcome: fn(&T) -> QueryResult,
    ) -> RosterResult<T>
    where
        Fut: Future<Output = RosterResult<T>> + Send,
    {
        let mut ctx = QueryContext::new(sql, param_count);
        if let Some(tag) = tag {
            ctx = ctx.with_tag(tag);
        }

        let start = Instant::now();
        let result = match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(RosterError::Timeout(timeout)),
            },
            None => fut.await,
        };
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => outcome(value),
            Err(e) => QueryResult::Error(e.to_string()),
        };
        self.report(&ctx, duration, &query_result);
        result
    }
}

fn rows_outcome(rows: &Vec<Row>) -> QueryResult {
    QueryResult::Rows(rows.len())
}

fn affected_outcome(n: &u64) -> QueryResult {
    QueryResult::Affected(*n)
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RosterResult<Vec<Row>> {
        let fut = self.client.query(sql, params);
        self.run(sql, params.len(), None, fut, rows_outcome).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RosterResult<Vec<Row>> {
        let fut = self.client.query(sql, params);
        self.run(sql, params.len(), Some(tag), fut, rows_outcome).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RosterResult<u64> {
        let fut = self.client.execute(sql, params);
        self.run(sql, params.len(), None, fut, affected_outcome).await
    }

    async fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RosterResult<u64> {
        let fut = self.client.execute(sql, params);
        self.run(sql, params.len(), Some(tag), fut, affected_outcome).await
    }
}

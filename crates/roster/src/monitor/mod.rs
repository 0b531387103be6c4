//! Statement logging and counters.
//!
//! Wrap any [`GenericClient`](crate::GenericClient) in an
//! [`InstrumentedClient`] to get one `tracing` event per statement on the
//! `roster.sql` target and a shared [`StatsMonitor`].
//!
//! # Example
//!
//! ```rust,ignore
//! use roster::monitor::{InstrumentedClient, MonitorConfig};
//! use std::time::Duration;
//!
//! let client = InstrumentedClient::new(pool.get().await?)
//!     .with_config(MonitorConfig::new().with_slow_query_threshold(Duration::from_millis(200)));
//!
//! let page = MemberRepository.search_page_complex(&client, &cond, &pageable).await?;
//! println!("{} statements", client.stats().stats().total_queries);
//! ```

mod config;
mod instrumented;
mod stats;
mod types;

pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use stats::{QueryStats, StatsMonitor};
pub use types::{QueryContext, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

use super::types::{QueryContext, QueryResult, QueryType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free query counters, shareable across clients via `Arc`.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    slow_queries: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
}

/// Snapshot of [`StatsMonitor`] counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub slow_queries: u64,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult, slow: bool) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if result.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        if slow {
            self.slow_queries.fetch_add(1, Ordering::Relaxed);
        }

        let counter = match ctx.query_type {
            QueryType::Select => Some(&self.select_count),
            QueryType::Insert => Some(&self.insert_count),
            QueryType::Update => Some(&self.update_count),
            QueryType::Delete => Some(&self.delete_count),
            QueryType::Other => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let prev = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev.checked_add(nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }
        self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            slow_queries: self.slow_queries.load(Ordering::Relaxed),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.slow_queries,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.total_duration_nanos,
            &self.max_duration_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_type_and_outcome() {
        let stats = StatsMonitor::new();
        let select = QueryContext::new("SELECT * FROM member", 0);
        let update = QueryContext::new("UPDATE member SET age = age + $1", 1);

        stats.record(&select, Duration::from_millis(3), &QueryResult::Rows(4), false);
        stats.record(&select, Duration::from_millis(9), &QueryResult::Rows(1), true);
        stats.record(&update, Duration::from_millis(1), &QueryResult::Error("boom".into()), false);

        let snapshot = stats.stats();
        assert_eq!(snapshot.total_queries, 3);
        assert_eq!(snapshot.select_count, 2);
        assert_eq!(snapshot.update_count, 1);
        assert_eq!(snapshot.failed_queries, 1);
        assert_eq!(snapshot.slow_queries, 1);
        assert_eq!(snapshot.max_duration, Duration::from_millis(9));
        assert_eq!(snapshot.total_duration, Duration::from_millis(13));

        stats.reset();
        assert_eq!(stats.stats(), QueryStats::default());
    }
}

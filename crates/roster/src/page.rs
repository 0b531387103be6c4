//! Page requests, sorting and paged results.
//!
//! Two ways to assemble a [`Page`]:
//!
//! - [`Page::new`] takes a total the caller already counted.
//! - [`get_page`] takes the content plus a lazy count and only runs the count
//!   when the total cannot be derived from the content itself.

use crate::error::{RosterError, RosterResult};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Whitelisted sort keys. Only these ever reach an ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    MemberId,
    Username,
    Age,
    TeamName,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            SortKey::MemberId => "member.id",
            SortKey::Username => "member.username",
            SortKey::Age => "member.age",
            SortKey::TeamName => "team.name",
        }
    }
}

impl FromStr for SortKey {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" | "member_id" => Ok(SortKey::MemberId),
            "username" => Ok(SortKey::Username),
            "age" => Ok(SortKey::Age),
            "team" | "team_name" => Ok(SortKey::TeamName),
            other => Err(RosterError::validation(format!("unknown sort key: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub key: SortKey,
    pub direction: Direction,
}

impl Order {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: Direction::Asc,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: Direction::Desc,
        }
    }

    pub fn to_sql(&self) -> String {
        let dir = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        format!("{} {dir}", self.key.column())
    }
}

impl FromStr for Order {
    type Err = RosterError;

    /// Parses `key` or `key,asc` / `key,desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, dir) = match s.split_once(',') {
            Some((key, dir)) => (key.trim(), dir.trim()),
            None => (s.trim(), "asc"),
        };
        let key = key.parse()?;
        match dir.to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::asc(key)),
            "desc" => Ok(Order::desc(key)),
            other => Err(RosterError::validation(format!("unknown sort direction: {other}"))),
        }
    }
}

/// Ordered list of sort terms; empty means unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn and(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }
}

/// Largest offset or size a request may carry; both are bound as `BIGINT`.
pub const MAX_WINDOW: u64 = i64::MAX as u64;

/// A page request: a window `[offset, offset + size)` plus a sort.
///
/// `size == None` is the unpaged request (everything, one page). Offset and
/// size never exceed [`MAX_WINDOW`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    offset: u64,
    size: Option<u64>,
    sort: Sort,
}

impl Pageable {
    /// Zero-based page `page` of `size` rows.
    pub fn of(page: u64, size: u64) -> RosterResult<Self> {
        let offset = page
            .checked_mul(size)
            .filter(|offset| *offset <= MAX_WINDOW)
            .ok_or_else(|| RosterError::validation(format!("page {page} of size {size} is out of range")))?;
        Self::at_offset(offset, size)
    }

    /// A window starting at an arbitrary row offset.
    pub fn at_offset(offset: u64, size: u64) -> RosterResult<Self> {
        if size < 1 {
            return Err(RosterError::validation("page size must be at least 1"));
        }
        if size > MAX_WINDOW || offset > MAX_WINDOW {
            return Err(RosterError::validation(format!(
                "page window (offset {offset}, size {size}) exceeds {MAX_WINDOW}"
            )));
        }
        Ok(Self {
            offset,
            size: Some(size),
            sort: Sort::unsorted(),
        })
    }

    pub fn unpaged() -> Self {
        Self {
            offset: 0,
            size: None,
            sort: Sort::unsorted(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn is_paged(&self) -> bool {
        self.size.is_some()
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Row offset of the first element; 0 when unpaged.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size(&self) -> Option<u64> {
        self.size
    }

    /// Zero-based page number; 0 when unpaged.
    pub fn page_number(&self) -> u64 {
        match self.size {
            Some(size) => self.offset / size,
            None => 0,
        }
    }

    /// The following window. Unpaged stays unpaged.
    pub fn next(&self) -> Self {
        match self.size {
            Some(size) => Self {
                offset: self.offset.saturating_add(size).min(MAX_WINDOW),
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// The preceding window, clamped at offset 0.
    pub fn previous_or_first(&self) -> Self {
        match self.size {
            Some(size) => Self {
                offset: self.offset.saturating_sub(size),
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }
}

impl Default for Pageable {
    fn default() -> Self {
        Self::unpaged()
    }
}

/// One page of results plus the exact total across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    pageable: Pageable,
    total: u64,
}

impl<T> Page<T> {
    /// Combine content with an already-known total.
    ///
    /// A non-empty page whose window reaches past `total` reports
    /// `offset + content.len()` instead, so a stale count can never claim
    /// fewer rows than were just read.
    pub fn new(content: Vec<T>, pageable: Pageable, total: u64) -> Self {
        let total = match pageable.page_size() {
            Some(size)
                if !content.is_empty() && pageable.offset().saturating_add(size) > total =>
            {
                pageable.offset() + content.len() as u64
            }
            _ => total,
        };
        Self {
            content,
            pageable,
            total,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn pageable(&self) -> &Pageable {
        &self.pageable
    }

    pub fn total_elements(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u64 {
        match self.pageable.page_size() {
            Some(size) => self.total.div_ceil(size),
            None => 1,
        }
    }

    pub fn number(&self) -> u64 {
        self.pageable.page_number()
    }

    /// Requested page size; the content length when unpaged.
    pub fn size(&self) -> u64 {
        self.pageable
            .page_size()
            .unwrap_or(self.content.len() as u64)
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.pageable.is_paged() && self.pageable.offset() + (self.content.len() as u64) < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.pageable.has_previous()
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Transform the content, keeping paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            pageable: self.pageable,
            total: self.total,
        }
    }
}

impl<T> fmt::Display for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page {} of {} ({} of {} rows)",
            self.number() + 1,
            self.total_pages(),
            self.content.len(),
            self.total
        )
    }
}

/// Total implied by the content alone, if any.
///
/// - unpaged, or first window not filled: the content is everything.
/// - later window, non-empty but not filled: this is the last page.
///
/// A full window (or an empty later window) says nothing about what follows.
pub fn derivable_total(content_len: usize, pageable: &Pageable) -> Option<u64> {
    let len = content_len as u64;
    let Some(size) = pageable.page_size() else {
        return Some(len);
    };
    if pageable.offset() == 0 {
        return (size > len).then_some(len);
    }
    (len != 0 && size > len).then(|| pageable.offset() + len)
}

/// Build a page, running `count` only when the total cannot be derived.
///
/// The total is always exact; this only elides a redundant COUNT.
pub async fn get_page<T, F, Fut>(content: Vec<T>, pageable: Pageable, count: F) -> RosterResult<Page<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = RosterResult<i64>>,
{
    if let Some(total) = derivable_total(content.len(), &pageable) {
        tracing::trace!(total, "count query skipped");
        return Ok(Page::new(content, pageable, total));
    }
    let total = count().await?;
    let total = u64::try_from(total)
        .map_err(|_| RosterError::decode("count", format!("negative row count {total}")))?;
    Ok(Page::new(content, pageable, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pageable(offset: u64, size: u64) -> Pageable {
        Pageable::at_offset(offset, size).unwrap()
    }

    async fn page_with_counter(len: usize, p: Pageable, count: i64) -> (Page<usize>, usize) {
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;
        let page = get_page((0..len).collect(), p, move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Ok(count)
        })
        .await
        .unwrap();
        (page, calls.load(Ordering::SeqCst))
    }

    #[test]
    fn size_must_be_positive() {
        assert!(Pageable::of(0, 0).is_err());
        assert!(Pageable::at_offset(3, 0).is_err());
        assert_eq!(Pageable::of(2, 5).unwrap().offset(), 10);
    }

    #[test]
    fn window_must_fit_in_bigint() {
        assert!(Pageable::at_offset(MAX_WINDOW, MAX_WINDOW).is_ok());
        assert!(Pageable::at_offset(0, MAX_WINDOW + 1).is_err());
        assert!(Pageable::at_offset(MAX_WINDOW + 1, 10).is_err());
        assert!(Pageable::of(u64::MAX / 4, 10).is_err());
        assert!(Pageable::of(u64::MAX, 2).is_err());
        assert_eq!(Pageable::of(MAX_WINDOW / 10, 10).unwrap().offset(), MAX_WINDOW / 10 * 10);
        assert_eq!(pageable(MAX_WINDOW, 10).next().offset(), MAX_WINDOW);
    }

    #[test]
    fn next_and_previous_move_by_one_window() {
        let p = Pageable::of(1, 10).unwrap();
        assert_eq!(p.next().offset(), 20);
        assert_eq!(p.previous_or_first().offset(), 0);
        assert_eq!(p.previous_or_first().previous_or_first().offset(), 0);
        assert_eq!(Pageable::unpaged().next(), Pageable::unpaged());
    }

    #[test]
    fn order_parsing_is_whitelisted() {
        assert_eq!("username,desc".parse::<Order>().unwrap(), Order::desc(SortKey::Username));
        assert_eq!("age".parse::<Order>().unwrap(), Order::asc(SortKey::Age));
        assert!("age; DROP TABLE member".parse::<Order>().is_err());
        assert!("age,sideways".parse::<Order>().is_err());
    }

    #[tokio::test]
    async fn first_partial_page_skips_count() {
        let (page, calls) = page_with_counter(3, pageable(0, 10), 99).await;
        assert_eq!(calls, 0);
        assert_eq!(page.total_elements(), 3);
        assert_eq!(page.total_pages(), 1);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn empty_first_page_has_zero_total_without_count() {
        let (page, calls) = page_with_counter(0, pageable(0, 10), 99).await;
        assert_eq!(calls, 0);
        assert_eq!(page.total_elements(), 0);
        assert_eq!(page.total_pages(), 0);
    }

    #[tokio::test]
    async fn last_partial_page_derives_total() {
        let (page, calls) = page_with_counter(2, pageable(2, 3), 99).await;
        assert_eq!(calls, 0);
        assert_eq!(page.total_elements(), 4);
    }

    #[tokio::test]
    async fn full_page_always_counts() {
        let (page, calls) = page_with_counter(2, pageable(1, 2), 4).await;
        assert_eq!(calls, 1);
        assert_eq!(page.total_elements(), 4);
        assert_eq!(page.number_of_elements(), 2);
        assert!(page.has_next());
        assert!(page.has_previous());

        let (_, calls) = page_with_counter(10, pageable(0, 10), 10).await;
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn empty_later_page_counts() {
        let (page, calls) = page_with_counter(0, pageable(20, 10), 7).await;
        assert_eq!(calls, 1);
        assert_eq!(page.total_elements(), 7);
    }

    #[tokio::test]
    async fn unpaged_never_counts() {
        let (page, calls) = page_with_counter(42, Pageable::unpaged(), 0).await;
        assert_eq!(calls, 0);
        assert_eq!(page.total_elements(), 42);
        assert_eq!(page.size(), 42);
        assert_eq!(page.total_pages(), 1);
    }

    #[tokio::test]
    async fn negative_count_is_rejected() {
        let result = get_page(vec![1, 2], pageable(0, 2), || async { Ok(-1) }).await;
        assert!(matches!(result, Err(RosterError::Decode { .. })));
    }

    #[tokio::test]
    async fn count_errors_propagate() {
        let result = get_page(vec![1, 2], pageable(0, 2), || async {
            Err(RosterError::Other("boom".into()))
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn page_new_keeps_exact_total_and_maps() {
        let page = Page::new(vec![1, 2], pageable(2, 2), 7);
        assert_eq!(page.total_pages(), 4);
        assert_eq!(page.number(), 1);
        let page = page.map(|n| n * 10);
        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.total_elements(), 7);
        assert_eq!(page.to_string(), "Page 2 of 4 (2 of 7 rows)");
    }

    #[test]
    fn stale_total_is_raised_to_rows_seen() {
        let page = Page::new(vec![1, 2, 3], pageable(4, 5), 5);
        assert_eq!(page.total_elements(), 7);
    }
}

//! Filtered record fetcher
//!
//! Fills one display page of operations of a given type, fetching as many
//! source pages as it takes. There is no way to know up front how many
//! operations of a type exist, so a sparse type could otherwise drag the
//! whole dataset over the wire. Every top-level fetch therefore stops after
//! [`FetchLimits::max_total_records`] raw records, even if the display page
//! is not full yet, and reports that more matches may exist.
//!
//! Navigation is cursor based. [`NavState`] keeps the cursor each displayed
//! page started from plus a history stack of earlier ones: `next` pushes,
//! `prev` pops. The state is owned by the caller, so independent tables
//! never share history.

use tracing::{debug, info};

use crate::error::Result;
use crate::record::{Cursor, Record};
use crate::source::{OperationQuery, Order, Page, RecordSource};

/// Raw records fetched per top-level call before giving up on filling the page.
pub const DEFAULT_MAX_TOTAL_RECORDS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_total_records: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_total_records: DEFAULT_MAX_TOTAL_RECORDS,
        }
    }
}

/// Cursor history for backward navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    history: Vec<Cursor>,
    current: Cursor,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor the page on display was fetched from.
    pub fn current(&self) -> &Cursor {
        &self.current
    }

    pub fn history(&self) -> &[Cursor] {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }
}

/// One display page worth of operations.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub records: Vec<Record>,
    /// The fetch stopped at the record cap with the page not full and the
    /// stream not exhausted.
    pub possibly_more_data_available: bool,
    /// Raw records pulled from the source to build this result.
    pub total_fetched: usize,
    pub pages_fetched: usize,
    pub started_from: Cursor,
    end_cursor: Cursor,
    last_page: Page,
}

impl FetchResult {
    /// Wrap a raw source page unchanged.
    fn from_page(page: Page, started_from: Cursor) -> Self {
        let end_cursor = page.last_paging_token().cloned().unwrap_or_default();
        FetchResult {
            records: page.records.clone(),
            possibly_more_data_available: false,
            total_fetched: page.len(),
            pages_fetched: 1,
            started_from,
            end_cursor,
            last_page: page,
        }
    }

    /// The last page seen was empty: the stream has nothing further.
    pub fn is_exhausted(&self) -> bool {
        self.last_page.is_empty()
    }

    /// Where `next` will resume from.
    pub fn end_cursor(&self) -> &Cursor {
        &self.end_cursor
    }

    /// Last raw page fetched from the source, before filtering.
    pub fn last_page(&self) -> &Page {
        &self.last_page
    }

    /// Same empty page again, with nothing fetched for it.
    fn echo_exhausted(&self) -> Self {
        FetchResult {
            total_fetched: 0,
            pages_fetched: 0,
            ..FetchResult::from_page(self.last_page.clone(), self.started_from.clone())
        }
    }
}

/// Fetches display pages of operations from a source, optionally keeping only
/// one operation type.
pub struct OperationFetcher<S> {
    source: S,
    query: OperationQuery,
    filter: Option<String>,
    limit: u32,
    page_size: u32,
    limits: FetchLimits,
}

impl<S: RecordSource> OperationFetcher<S> {
    /// `query` carries the scope (account / transaction); order, limit and
    /// cursor are set per request.
    pub fn new(source: S, query: OperationQuery, limit: u32) -> Self {
        let limit = limit.max(1);
        Self {
            source,
            query,
            filter: None,
            limit,
            page_size: limit,
            limits: FetchLimits::default(),
        }
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Records requested per source call. Defaults to the display limit.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_limits(mut self, limits: FetchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn request(&self, cursor: &Cursor, page_size: u32) -> OperationQuery {
        let query = self.query.clone().limit(page_size).order(Order::Desc);
        if cursor.is_start() {
            query
        } else {
            query.cursor(cursor.clone())
        }
    }

    /// First display page.
    pub async fn fetch_records(&self) -> Result<FetchResult> {
        self.fetch_enough(&Cursor::start()).await
    }

    /// Build one display page starting at `from`.
    ///
    /// Without a filter this is a single source call and the raw page comes
    /// back unchanged. With a filter, pages are fetched until the display
    /// page is full, the source runs dry, or the record cap is reached.
    /// A source error aborts the whole fetch.
    pub async fn fetch_enough(&self, from: &Cursor) -> Result<FetchResult> {
        let filter = match &self.filter {
            Some(filter) => filter,
            None => {
                let page = self.source.call(&self.request(from, self.page_size)).await?;
                return Ok(FetchResult::from_page(page, from.clone()));
            }
        };

        let cap = self.limits.max_total_records;
        let limit = self.limit as usize;
        let mut cursor = from.clone();
        let mut records: Vec<Record> = Vec::new();
        let mut total_fetched = 0usize;
        let mut pages_fetched = 0usize;

        let last_page = loop {
            let budget = cap.saturating_sub(total_fetched);
            let page_size = (self.page_size as usize).min(budget).max(1) as u32;
            let page = self.source.call(&self.request(&cursor, page_size)).await?;

            pages_fetched += 1;
            total_fetched += page.len();
            records.extend(page.records.iter().filter(|r| r.is_type(filter)).cloned());
            cursor = page.last_paging_token().cloned().unwrap_or_default();

            debug!(
                filter = %filter,
                page = pages_fetched,
                raw = page.len(),
                matched = records.len(),
                total_fetched,
                "fetcher.page"
            );

            if records.len() < limit && !page.is_empty() && total_fetched < cap {
                continue;
            }
            break page;
        };

        // The cap can be hit while the stream still has records and the page
        // is short; only that combination raises the flag.
        let possibly_more_data_available =
            total_fetched >= cap && !cursor.is_start() && records.len() < limit;
        if possibly_more_data_available {
            info!(
                filter = %filter,
                matched = records.len(),
                total_fetched,
                "record cap reached before the page filled, more data possibly available"
            );
        }

        // Overflow past the display limit is dropped and picked up again by
        // `next`, which resumes right after the last record shown.
        let mut end_cursor = cursor;
        if records.len() > limit {
            records.truncate(limit);
            if let Some(last) = records.last() {
                end_cursor = last.paging_token.clone();
            }
        }

        debug!(
            filter = %filter,
            from = %from,
            to = %end_cursor,
            matched = records.len(),
            pages_fetched,
            total_fetched,
            "fetcher.done"
        );

        Ok(FetchResult {
            records,
            possibly_more_data_available,
            total_fetched,
            pages_fetched,
            started_from: from.clone(),
            end_cursor,
            last_page,
        })
    }

    /// Page after `current`. Once the stream is exhausted this resolves to
    /// the same empty page without touching the source or `nav`.
    pub async fn next(&self, nav: &mut NavState, current: &FetchResult) -> Result<FetchResult> {
        if current.is_exhausted() {
            return Ok(current.echo_exhausted());
        }

        let target = current.end_cursor.clone();
        let result = self.fetch_enough(&target).await?;

        let previous = std::mem::replace(&mut nav.current, target);
        nav.history.push(previous);
        Ok(result)
    }

    /// Page before the one on display. With no history this goes back to the
    /// start of the stream. Resolves without fetching if `current` is the
    /// exhausted end of the stream.
    pub async fn prev(&self, nav: &mut NavState, current: &FetchResult) -> Result<FetchResult> {
        if current.is_exhausted() {
            return Ok(current.echo_exhausted());
        }

        let target = nav.history.last().cloned().unwrap_or_default();
        let result = self.fetch_enough(&target).await?;

        nav.history.pop();
        nav.current = target;
        Ok(result)
    }
}

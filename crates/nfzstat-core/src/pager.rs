//! Page walking over count-paginated endpoints
//!
//! Page 1 doubles as the count probe. The total number of requests is derived
//! from `meta.count` and deliberately errs one page high: the API's own page
//! boundaries are not trusted, and a page past the end just returns `[]`.

use serde_json::Value;

use crate::client::PageSource;
use crate::envelope;
use crate::error::FetchError;
use crate::query::Query;
use crate::rate_limit::RateLimiter;

/// Default page size used by every stage
pub const DEFAULT_LIMIT: u64 = 25;

/// Upper bound on requests per walk; a larger `meta.count` is malformed
pub const MAX_REQUESTS: u64 = 100_000;

/// How many page requests a walk issues for a given result count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    /// `ceil(count / limit) + 1`: the last request is always past the data.
    CeilPlusOne,
    /// `floor(count / limit) + 1`: one past the data only when `count` is an
    /// exact multiple of `limit`.
    FloorPlusOne,
}

impl PageCount {
    /// Total page requests, including the page-1 probe
    pub fn total_requests(self, count: u64, limit: u64) -> u64 {
        let limit = limit.max(1);
        match self {
            Self::CeilPlusOne => count.div_ceil(limit).saturating_add(1),
            Self::FloorPlusOne => (count / limit).saturating_add(1),
        }
    }
}

/// Result of walking all pages of one unit of work.
#[derive(Debug)]
pub enum WalkOutcome {
    Complete(Vec<Value>),
    /// A request failed; `partial` holds the records of pages fetched before it
    Failed {
        reason: FetchError,
        partial: Vec<Value>,
    },
}

impl WalkOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Records gathered so far, complete or not
    pub fn records(&self) -> &[Value] {
        match self {
            Self::Complete(records) => records,
            Self::Failed { partial, .. } => partial,
        }
    }
}

/// Drives a [`PageSource`] across every page of an endpoint.
#[derive(Debug, Clone, Copy)]
pub struct PageWalker {
    limit: u64,
    page_count: PageCount,
    limiter: RateLimiter,
}

impl PageWalker {
    pub fn new(limit: u64, page_count: PageCount, limiter: RateLimiter) -> Self {
        Self {
            limit: limit.max(1),
            page_count,
            limiter,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Fetch every page of `endpoint`, collecting the array at `records_at`
    /// (a JSON pointer, see [`envelope::FLAT_RECORDS`]).
    ///
    /// The limiter waits after each successful request, the last one included.
    /// Never returns early with an error: a failed request ends the walk as
    /// [`WalkOutcome::Failed`] carrying what was already collected.
    pub fn walk<S: PageSource + ?Sized>(
        &self,
        source: &S,
        endpoint: &str,
        template: &Query,
        records_at: &str,
    ) -> WalkOutcome {
        let template = template.clone().with("limit", self.limit);
        let mut records = Vec::new();

        let total = match self.fetch_page(source, endpoint, &template, 1, records_at, &mut records)
        {
            Ok(first) => match envelope::count(&first) {
                Ok(count) => self.page_count.total_requests(count, self.limit),
                Err(reason) => return Self::failed(reason, records),
            },
            Err(reason) => return Self::failed(reason, records),
        };
        if total > MAX_REQUESTS {
            let reason = FetchError::malformed(format!(
                "meta.count implies {total} page requests (max {MAX_REQUESTS})"
            ));
            return Self::failed(reason, records);
        }
        log::debug!("{endpoint}: {total} page requests");

        for page in 2..=total {
            if let Err(reason) =
                self.fetch_page(source, endpoint, &template, page, records_at, &mut records)
            {
                return Self::failed(reason, records);
            }
        }

        WalkOutcome::Complete(records)
    }

    /// One request: fetch, wait, append records. Returns the parsed body.
    fn fetch_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        endpoint: &str,
        template: &Query,
        page: u64,
        records_at: &str,
        out: &mut Vec<Value>,
    ) -> Result<Value, FetchError> {
        let body = source.fetch(endpoint, &template.with_page(page))?;
        self.limiter.wait();
        let page_records = envelope::records(&body, records_at)?;
        out.extend(page_records.iter().cloned());
        Ok(body)
    }

    fn failed(reason: FetchError, partial: Vec<Value>) -> WalkOutcome {
        WalkOutcome::Failed { reason, partial }
    }
}

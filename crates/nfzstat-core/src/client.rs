//! Blocking JSON client for the paginated statistics API.
//!
//! Uses async reqwest internally with `tokio::time::timeout` as the request
//! bound, but presents a sync interface: the pipeline issues one request at a
//! time and nothing else runs while it waits.

use std::sync::LazyLock;
use std::time::Duration;

use serde_json::Value;

use crate::error::FetchError;
use crate::query::Query;

/// Default per-request bound
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect timeout (also capped by the request bound)
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared tokio runtime for HTTP operations.
///
/// Current-thread: requests are strictly sequential, so a worker pool would
/// only sit idle.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Anything that can answer one GET with a parsed JSON body.
///
/// [`PagedClient`] is the production implementation; tests drive the page
/// walker and the stages with scripted sources.
pub trait PageSource {
    fn fetch(&self, endpoint: &str, query: &Query) -> Result<Value, FetchError>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn fetch(&self, endpoint: &str, query: &Query) -> Result<Value, FetchError> {
        (**self).fetch(endpoint, query)
    }
}

/// Percent-encode `raw` as a single URL path segment.
///
/// `/`, `?`, `#` and `%` in an id cannot change the request path or start a
/// query string.
pub fn path_segment(raw: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct PagedClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl PagedClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(concat!("nfzstat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for an endpoint path relative to the base URL
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn get_json(&self, url: &str, query: &Query) -> Result<Value, reqwest::Error> {
        let resp = self
            .client
            .get(url)
            .query(query.pairs())
            .send()
            .await?
            .error_for_status()?;
        resp.json::<Value>().await
    }
}

impl PageSource for PagedClient {
    fn fetch(&self, endpoint: &str, query: &Query) -> Result<Value, FetchError> {
        let url = self.url(endpoint);
        log::debug!("GET {url} {:?}", query.pairs());

        SHARED_RUNTIME.block_on(async {
            match tokio::time::timeout(self.timeout, self.get_json(&url, query)).await {
                Ok(result) => result.map_err(FetchError::from_reqwest),
                Err(_) => Err(FetchError::Timeout),
            }
        })
    }
}

//! Catalog client for the bibliographic API.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use futures::future::join_all;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::normalize::{normalize_search, normalize_trending};
use crate::store::CatalogStore;
use crate::types::*;

const TRENDING_PATH: &str = "/trending/daily.json";
const SEARCH_PATH: &str = "/search.json";

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// The catalog operations used by the application.
///
/// Results of both fetch operations are memoized in the client's
/// [CatalogStore]; a repeated call with the same arguments returns the
/// same [Arc] without issuing a request.
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch a page of today's trending works.
    async fn fetch_popular(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<BooksPage>, CatalogClientError>;

    /// Full text search.
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<BooksPage>, CatalogClientError>;

    /// All genres observed by this client so far, sorted.
    fn list_genres(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// A client for the Open Library API.
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogClientConfig,
    store: Arc<CatalogStore>,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client recording its results in `store`.
    pub fn new(
        config: CatalogClientConfig,
        store: Arc<CatalogStore>,
    ) -> Result<Self, CatalogClientError> {
        let http = build_http_client(&config)?;
        Ok(Self {
            http,
            config,
            store,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogClientError> {
        let url = format!("{}{path}", self.config.catalog_url.trim_end_matches('/'));
        Url::parse(&url).map_err(|e| CatalogClientError::Other(format!("invalid url {url}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogClientError> {
        debug!(%url, "sending catalog request");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CatalogClientError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogClientError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| CatalogClientError::Decode {
                url: url.to_string(),
                source,
            })
    }

    /// Fetch the detail record of a work, defaulting to an empty record.
    async fn fetch_work_details(&self, work_key: &str) -> WorkDetails {
        let result = match self.endpoint(&format!("{work_key}.json")) {
            Ok(url) => self.get_json::<WorkDetails>(url).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!(work_key, error = %e, "could not fetch work details");
            WorkDetails::default()
        })
    }

    /// Fetch the name of an author, if the author record has one.
    async fn fetch_author_name(&self, author_key: &str) -> Option<String> {
        let result = match self.endpoint(&format!("{author_key}.json")) {
            Ok(url) => self.get_json::<AuthorDetails>(url).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(author) => author.name,
            Err(e) => {
                warn!(author_key, error = %e, "could not fetch author");
                None
            },
        }
    }

    /// Complete a trending work with its details and author.
    async fn resolve_trending(&self, work: TrendingWork) -> Book {
        let details = self.fetch_work_details(&work.key).await;

        let inline_author = work
            .author_name
            .as_ref()
            .and_then(|names| names.first())
            .cloned();
        let author = match inline_author {
            Some(author) => Some(author),
            None => match details.first_author_key() {
                Some(author_key) => self.fetch_author_name(author_key).await,
                None => None,
            },
        };

        normalize_trending(work, details, author, &self.config.covers_url)
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip(self))]
    async fn fetch_popular(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<BooksPage>, CatalogClientError> {
        let key = CacheKey::popular(page, page_size);
        if let Some(cached) = self.store.get(&key) {
            return Ok(cached);
        }

        let mut url = self.endpoint(TRENDING_PATH)?;
        url.query_pairs_mut()
            .append_pair("limit", &page_size.to_string())
            .append_pair("page", &page.to_string());

        let response: TrendingResponse = self.get_json(url).await?;
        let works = response.works.ok_or(CatalogClientError::MissingField {
            endpoint: TRENDING_PATH,
            field: "works",
        })?;
        debug!(n_works = works.len(), "received trending works");

        let books = join_all(works.into_iter().map(|work| self.resolve_trending(work))).await;

        let page = BooksPage {
            total: books.len() as u64,
            books,
            page,
        };
        Ok(self.store.insert(key, page))
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<BooksPage>, CatalogClientError> {
        let key = CacheKey::search(query, page, page_size);
        if let Some(cached) = self.store.get(&key) {
            return Ok(cached);
        }

        let mut url = self.endpoint(SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("q", query.trim())
            .append_pair("page", &page.to_string())
            .append_pair("limit", &page_size.to_string());

        let response: SearchResponse = self.get_json(url).await?;
        let docs = response.docs.ok_or(CatalogClientError::MissingField {
            endpoint: SEARCH_PATH,
            field: "docs",
        })?;
        debug!(
            n_docs = docs.len(),
            num_found = response.num_found,
            "received search results"
        );

        let books = docs
            .into_iter()
            .map(|doc| normalize_search(doc, &self.config.covers_url))
            .collect();

        let page = BooksPage {
            books,
            total: response.num_found,
            page,
        };
        Ok(self.store.insert(key, page))
    }

    fn list_genres(&self) -> Vec<String> {
        self.store.genres()
    }
}

// ---------------------------------------------------------------------------
// Mock client
// ---------------------------------------------------------------------------

/// A canned response served by [MockClient].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Page(BooksPage),
    Error(String),
}

/// A client serving queued responses in order.
///
/// Like [CatalogClient] it memoizes through its [CatalogStore],
/// so a cached call does not consume a response.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<MockResponse>>,
    store: Arc<CatalogStore>,
    requests: AtomicUsize,
}

impl MockClient {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }

    /// Push a new response into the list of mock responses
    pub fn push_page(&self, page: BooksPage) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(MockResponse::Page(page));
    }

    /// Push an error into the list of mock responses
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(MockResponse::Error(message.into()));
    }

    /// Number of requests that were not served from the store
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn respond(&self, key: CacheKey) -> Result<Arc<BooksPage>, CatalogClientError> {
        if let Some(cached) = self.store.get(&key) {
            return Ok(cached);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);

        let response = self
            .responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();
        match response {
            Some(MockResponse::Page(page)) => Ok(self.store.insert(key, page)),
            Some(MockResponse::Error(message)) => Err(CatalogClientError::Other(message)),
            None => Err(CatalogClientError::Other(format!(
                "no mock response left for {key}"
            ))),
        }
    }
}

impl ClientTrait for MockClient {
    async fn fetch_popular(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<BooksPage>, CatalogClientError> {
        self.respond(CacheKey::popular(page, page_size))
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<BooksPage>, CatalogClientError> {
        self.respond(CacheKey::search(query, page, page_size))
    }

    fn list_genres(&self) -> Vec<String> {
        self.store.genres()
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;

    use httpmock::Method::GET;
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::normalize::{DEFAULT_COVER, NO_DESCRIPTION, UNKNOWN_AUTHOR};

    fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: url.to_string(),
            covers_url: "https://covers.test/b".to_string(),
            ..Default::default()
        }
    }

    fn client(server: &MockServer) -> CatalogClient {
        CatalogClient::new(
            client_config(&server.base_url()),
            Arc::new(CatalogStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn popular_resolves_inline_author_and_description() {
        let server = MockServer::start_async().await;
        let trending = server.mock_async(|when, then| {
            when.method(GET)
                .path("/trending/daily.json")
                .query_param("limit", "9")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "works": [{
                    "key": "/works/OL1W",
                    "title": "Dune",
                    "author_name": ["Frank Herbert"],
                    "subject": ["Accessible book", "Science fiction", "Fiction"],
                    "cover_edition_key": "OL123M",
                    "cover_i": 456,
                    "first_publish_year": 1965
                }]
            }));
        }).await;
        let details = server.mock_async(|when, then| {
            when.method(GET).path("/works/OL1W.json");
            then.status(200)
                .json_body(json!({ "description": { "type": "/type/text", "value": "Spice." } }));
        }).await;

        let client = client(&server);
        let page = client.fetch_popular(1, 9).await.unwrap();

        trending.assert_async().await;
        details.assert_async().await;
        assert_eq!(page.total, 1);
        assert_eq!(page.page, 1);
        let book = &page.books[0];
        assert_eq!(book.id, "OL1W");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.description, "Spice.");
        assert_eq!(book.genres, vec!["Science fiction", "Fiction"]);
        assert_eq!(book.cover, "https://covers.test/b/olid/OL123M-M.jpg");
        assert_eq!(book.olid, "OL123M");
        assert_eq!(book.first_publish_year, Some(1965));
        assert!((4..=5).contains(&book.rating));
        assert_eq!(client.list_genres(), vec!["Fiction", "Science fiction"]);
    }

    #[tokio::test]
    async fn popular_resolves_author_through_work_details() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/trending/daily.json");
            then.status(200).json_body(json!({
                "works": [{ "key": "/works/OL2W", "title": "Emma", "cover_i": 7 }]
            }));
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/works/OL2W.json");
            then.status(200).json_body(json!({
                "authors": [{ "author": { "key": "/authors/OL9A" } }]
            }));
        }).await;
        let author = server.mock_async(|when, then| {
            when.method(GET).path("/authors/OL9A.json");
            then.status(200).json_body(json!({ "name": "Jane Austen" }));
        }).await;

        let page = client(&server).fetch_popular(1, 9).await.unwrap();

        author.assert_async().await;
        let book = &page.books[0];
        assert_eq!(book.author, "Jane Austen");
        assert_eq!(book.description, NO_DESCRIPTION);
        assert_eq!(book.cover, "https://covers.test/b/id/7-M.jpg");
        assert_eq!(book.olid, "work-OL2W");
    }

    #[tokio::test]
    async fn failed_secondary_lookups_fall_back_to_sentinels() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/trending/daily.json");
            then.status(200)
                .json_body(json!({ "works": [{ "key": "/works/OL3W", "title": "Lost" }] }));
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/works/OL3W.json");
            then.status(200).json_body(json!({
                "authors": [{ "author": { "key": "/authors/OL404A" } }]
            }));
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/authors/OL404A.json");
            then.status(500);
        }).await;

        let page = client(&server).fetch_popular(1, 9).await.unwrap();

        assert_eq!(page.books[0].author, UNKNOWN_AUTHOR);
    }

    #[tokio::test]
    async fn failed_work_details_fall_back_to_empty_details() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/trending/daily.json");
            then.status(200).json_body(json!({
                "works": [
                    { "key": "/works/OL4W", "title": "Gone" },
                    { "key": "/works/OL5W", "title": "Kept", "author_name": ["Ann"] }
                ]
            }));
        }).await;
        let details = server.mock_async(|when, then| {
            when.method(GET).path("/works/OL4W.json");
            then.status(500);
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/works/OL5W.json");
            then.status(200).json_body(json!({ "description": "Still here." }));
        }).await;

        let page = client(&server).fetch_popular(1, 9).await.unwrap();

        details.assert_async().await;
        assert_eq!(page.books.len(), 2);
        assert_eq!(page.books[0].author, UNKNOWN_AUTHOR);
        assert_eq!(page.books[0].description, NO_DESCRIPTION);
        assert_eq!(page.books[1].author, "Ann");
        assert_eq!(page.books[1].description, "Still here.");
    }

    #[tokio::test]
    async fn popular_accepts_both_cover_fields() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/trending/daily.json");
            then.status(200).json_body(json!({
                "works": [{ "key": "/works/OL6W", "title": "Both", "cover_i": 1, "cover_id": 1 }]
            }));
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/works/OL6W.json");
            then.status(200).json_body(json!({}));
        }).await;

        let page = client(&server).fetch_popular(1, 9).await.unwrap();

        assert_eq!(page.books[0].cover, "https://covers.test/b/id/1-M.jpg");
    }

    #[tokio::test]
    async fn popular_is_memoized() {
        let server = MockServer::start_async().await;
        let trending = server.mock_async(|when, then| {
            when.method(GET).path("/trending/daily.json");
            then.status(200).json_body(json!({ "works": [] }));
        }).await;

        let client = client(&server);
        let first = client.fetch_popular(2, 9).await.unwrap();
        let second = client.fetch_popular(2, 9).await.unwrap();

        trending.assert_hits_async(1).await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn popular_without_works_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/trending/daily.json");
            then.status(200).json_body(json!({ "query": "daily" }));
        }).await;

        let result = client(&server).fetch_popular(1, 9).await;
        assert!(
            matches!(result, Err(CatalogClientError::MissingField {
                field: "works",
                ..
            })),
            "expected MissingField, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn search_normalizes_inline_fields() {
        let server = MockServer::start_async().await;
        let search = server.mock_async(|when, then| {
            when.method(GET)
                .path("/search.json")
                .query_param("q", "tolkien")
                .query_param("page", "2")
                .query_param("limit", "3");
            then.status(200).json_body(json!({
                "numFound": 20,
                "docs": [
                    { "key": "/works/OL1W", "title": "A", "cover_edition_key": "OL123M" },
                    { "key": "/works/OL2W", "title": "B", "cover_i": 456, "author_name": ["X"] },
                    { "key": "/works/OL3W", "title": "C" }
                ]
            }));
        }).await;

        let client = client(&server);
        let page = client.search("tolkien", 2, 3).await.unwrap();

        search.assert_async().await;
        assert_eq!(page.total, 20);
        assert_eq!(page.page, 2);
        let covers = page.books.iter().map(|b| b.cover.as_str()).collect::<Vec<_>>();
        assert_eq!(covers, vec![
            "https://covers.test/b/olid/OL123M-M.jpg",
            "https://covers.test/b/id/456-M.jpg",
            DEFAULT_COVER,
        ]);
        assert_eq!(page.books[1].author, "X");
        assert_eq!(page.books[2].author, UNKNOWN_AUTHOR);
        assert!(page.books.iter().all(|b| b.description == NO_DESCRIPTION));
    }

    #[tokio::test]
    async fn search_is_memoized_per_query() {
        let server = MockServer::start_async().await;
        let search = server.mock_async(|when, then| {
            when.method(GET).path("/search.json");
            then.status(200).json_body(json!({ "numFound": 0, "docs": [] }));
        }).await;

        let client = client(&server);
        client.search("dune", 1, 9).await.unwrap();
        client.search("dune", 1, 9).await.unwrap();
        search.assert_hits_async(1).await;

        client.search("emma", 1, 9).await.unwrap();
        search.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn search_without_docs_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/search.json");
            then.status(200).json_body(json!({ "numFound": 0 }));
        }).await;

        let result = client(&server).search("dune", 1, 9).await;
        assert!(
            matches!(result, Err(CatalogClientError::MissingField {
                field: "docs",
                ..
            })),
            "expected MissingField, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/search.json");
            then.status(503);
        }).await;

        let result = client(&server).search("dune", 1, 9).await;
        assert!(
            matches!(result, Err(CatalogClientError::UnexpectedStatus { status, .. }) if status == 503),
            "expected UnexpectedStatus, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("shelf-test".to_string(), "test-value".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.header("shelf-test", "test-value");
            then.status(200).json_body(json!({ "numFound": 0, "docs": [] }));
        }).await;

        let config = CatalogClientConfig {
            extra_headers,
            ..client_config(&server.base_url())
        };
        let client = CatalogClient::new(config, Arc::new(CatalogStore::new())).unwrap();
        client.search("dune", 1, 9).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "shelf-test-agent";

        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!({ "numFound": 0, "docs": [] }));
        }).await;

        let config = CatalogClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };
        let client = CatalogClient::new(config, Arc::new(CatalogStore::new())).unwrap();
        client.search("dune", 1, 9).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn mock_client_serves_responses_in_order() {
        let mock = MockClient::new(Arc::new(CatalogStore::new()));
        mock.push_page(BooksPage {
            books: vec![],
            total: 0,
            page: 1,
        });
        mock.push_error("boom");

        assert!(mock.fetch_popular(1, 9).await.is_ok());
        assert!(mock.fetch_popular(1, 9).await.is_ok());
        assert_eq!(mock.requests(), 1);
        assert!(mock.search("dune", 1, 9).await.is_err());
        assert_eq!(mock.requests(), 2);
    }
}

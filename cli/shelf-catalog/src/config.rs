//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://openlibrary.org";
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org/b";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the bibliographic API.
    pub catalog_url: String,
    /// Base URL for cover images.
    ///
    /// Only used to build cover URLs, never requested by the client.
    pub covers_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Custom user agent, defaults to reqwest's
    pub user_agent: Option<String>,
    /// Upper bound for a single request, including reading the body.
    pub request_timeout: Duration,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use shelf_catalog::{
    CatalogClient,
    CatalogClientConfig,
    CatalogStore,
    Client,
    DEFAULT_CATALOG_URL,
    DEFAULT_COVERS_URL,
};
use tracing::debug;

use crate::config::Config;

pub const SHELF_USER_AGENT: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));

/// Translate the user configuration into a [CatalogClientConfig]
///
/// Unset URLs fall back to the public Open Library endpoints.
pub fn catalog_client_config(config: &Config) -> CatalogClientConfig {
    let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();

    // Pass in a bool if we are running in CI, so requests can reflect this in the headers
    if std::env::var("CI").is_ok() {
        extra_headers.insert("shelf-ci".to_string(), "true".to_string());
    };

    CatalogClientConfig {
        catalog_url: config
            .shelf
            .catalog_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
        covers_url: config
            .shelf
            .covers_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COVERS_URL.to_string()),
        extra_headers,
        user_agent: Some(SHELF_USER_AGENT.to_string()),
        request_timeout: Duration::from_secs(config.shelf.request_timeout),
    }
}

/// Initialize the catalog client sharing `store` with the rest of the process
pub fn init_catalog_client(config: &Config, store: Arc<CatalogStore>) -> Result<Client> {
    let client_config = catalog_client_config(config);
    debug!(
        catalog_url = %client_config.catalog_url,
        covers_url = %client_config.covers_url,
        "using catalog client"
    );
    let client = CatalogClient::new(client_config, store)
        .context("could not initialize catalog client")?;
    Ok(client.into())
}

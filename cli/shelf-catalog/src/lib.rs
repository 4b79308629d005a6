//! Client for the Open Library catalog.
//!
//! This crate provides:
//! - HTTP client construction for the bibliographic API
//! - Normalization of trending works and search hits into [Book]s
//! - A [CatalogStore] memoizing result pages and collecting observed genres
//! - Local filtering of loaded books
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use shelf_catalog::{CatalogClient, CatalogClientConfig, CatalogStore, ClientTrait};
//!
//! let store = Arc::new(CatalogStore::new());
//! let client = CatalogClient::new(CatalogClientConfig::default(), store)?;
//! let page = client.search("dune", 1, 9).await?;
//! ```

mod client;
mod config;
mod error;
pub mod filter;
pub mod normalize;
mod store;
pub mod types;

pub use client::{CatalogClient, Client, ClientTrait, MockClient, MockResponse};
pub use config::{
    CatalogClientConfig,
    DEFAULT_CATALOG_URL,
    DEFAULT_COVERS_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use error::CatalogClientError;
pub use filter::{BookFilter, apply_filters};
pub use store::CatalogStore;
pub use types::{Book, BooksPage, CacheKey};

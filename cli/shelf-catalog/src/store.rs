//! Memoized results and observed genres.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::types::{BooksPage, CacheKey};

/// Results and genres accumulated by a catalog client.
///
/// The store is owned by the application and handed to clients,
/// so that its lifetime is explicit and tests can inspect it.
/// Entries are never evicted and the genre set only grows.
#[derive(Debug, Default)]
pub struct CatalogStore {
    pages: Mutex<HashMap<CacheKey, Arc<BooksPage>>>,
    genres: Mutex<BTreeSet<String>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached page for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<BooksPage>> {
        let pages = self.pages.lock().expect("catalog store poisoned");
        let page = pages.get(key).cloned();
        debug!(%key, hit = page.is_some(), "catalog cache lookup");
        page
    }

    /// Cache `page` under `key` and record its genres.
    ///
    /// If another request for the same key finished first, its page is kept
    /// and returned instead.
    pub fn insert(&self, key: CacheKey, page: BooksPage) -> Arc<BooksPage> {
        self.observe_genres(page.books.iter().flat_map(|book| book.genres.iter()));

        let mut pages = self.pages.lock().expect("catalog store poisoned");
        pages.entry(key).or_insert_with(|| Arc::new(page)).clone()
    }

    /// Add genre labels to the set of observed genres.
    pub fn observe_genres<'a>(&self, genres: impl IntoIterator<Item = &'a String>) {
        let mut known = self.genres.lock().expect("catalog store poisoned");
        known.extend(genres.into_iter().cloned());
    }

    /// All genres observed so far, sorted.
    pub fn genres(&self) -> Vec<String> {
        let known = self.genres.lock().expect("catalog store poisoned");
        known.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().expect("catalog store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

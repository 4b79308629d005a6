//! Catalog interaction types.
//!
//! The response types mirror the subset of the Open Library JSON that the
//! client reads. Every field is optional on the wire, the normalized [Book]
//! is what the rest of the application works with.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

/// A normalized book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Work identifier with the `/works/` prefix removed, e.g. `OL45804W`
    pub id: String,
    pub title: String,
    pub author: String,
    /// At most [crate::normalize::MAX_GENRES] labels
    pub genres: Vec<String>,
    /// Placeholder rating, see [crate::normalize::placeholder_rating]
    pub rating: u8,
    pub cover: String,
    /// The cover edition key, or `work-<id>` if the source has none
    pub olid: String,
    pub first_publish_year: Option<i32>,
    pub description: String,
}

/// One page of normalized results, as cached by [crate::CatalogStore].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooksPage {
    pub books: Vec<Book>,
    /// Total number of results reported for the query
    pub total: u64,
    /// 1-based page number this page was requested with
    pub page: u32,
}

/// Key of a cached [BooksPage].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Popular {
        page: u32,
        page_size: u32,
    },
    Search {
        query: String,
        page: u32,
        page_size: u32,
    },
}

impl CacheKey {
    pub fn popular(page: u32, page_size: u32) -> Self {
        CacheKey::Popular { page, page_size }
    }

    /// Queries are trimmed so that `" dune"` and `"dune"` share an entry.
    pub fn search(query: &str, page: u32, page_size: u32) -> Self {
        CacheKey::Search {
            query: query.trim().to_string(),
            page,
            page_size,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Popular { page, page_size } => write!(f, "popular_{page}_{page_size}"),
            CacheKey::Search {
                query,
                page,
                page_size,
            } => write!(f, "search_{query}_{page}_{page_size}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /trending/daily.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrendingResponse {
    pub works: Option<Vec<TrendingWork>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrendingWork {
    pub key: String,
    #[serde(default)]
    pub title: String,
    pub author_name: Option<Vec<String>>,
    pub subject: Option<Vec<String>>,
    pub cover_edition_key: Option<String>,
    /// Trending results have used both names for the numeric cover id,
    /// sometimes in the same record
    pub cover_i: Option<i64>,
    pub cover_id: Option<i64>,
    pub first_publish_year: Option<i32>,
}

impl TrendingWork {
    pub fn cover_number(&self) -> Option<i64> {
        self.cover_i.or(self.cover_id)
    }
}

/// `GET /works/<id>.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkDetails {
    pub description: Option<TextValue>,
    pub authors: Option<Vec<WorkAuthor>>,
}

impl WorkDetails {
    /// Key of the first listed author, e.g. `/authors/OL34184A`
    pub fn first_author_key(&self) -> Option<&str> {
        self.authors
            .as_ref()?
            .iter()
            .find_map(|author| author.author.as_ref().map(|r| r.key.as_str()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkAuthor {
    pub author: Option<KeyRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeyRef {
    pub key: String,
}

/// Free text fields come either as a plain string
/// or as `{ "type": "/type/text", "value": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TextValue {
    Plain(String),
    Typed { value: String },
}

impl TextValue {
    pub fn into_text(self) -> String {
        match self {
            TextValue::Plain(text) => text,
            TextValue::Typed { value } => value,
        }
    }
}

/// `GET /authors/<id>.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthorDetails {
    pub name: Option<String>,
}

/// `GET /search.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    pub docs: Option<Vec<SearchDoc>>,
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchDoc {
    pub key: String,
    #[serde(default)]
    pub title: String,
    pub author_name: Option<Vec<String>>,
    pub subject: Option<Vec<String>>,
    pub cover_edition_key: Option<String>,
    pub cover_i: Option<i64>,
    pub first_publish_year: Option<i32>,
}

//! Normalization of heterogeneous catalog results into [Book] records.

use std::ops::RangeInclusive;

use crate::types::{Book, SearchDoc, TrendingWork, WorkDetails};

pub const UNKNOWN_AUTHOR: &str = "Unknown author";
pub const NO_DESCRIPTION: &str = "Description not available";
/// Local path rendered when the source provides no cover at all
pub const DEFAULT_COVER: &str = "images/default-book-cover.jpg";

pub const MAX_GENRES: usize = 3;
/// Subjects with this many words or more are noise rather than genres
pub const MAX_GENRE_WORDS: usize = 4;
/// Subjects containing any of these are availability tags, not genres
pub const BOILERPLATE_SUBJECTS: [&str; 2] = ["Accessible book", "Protected DAISY"];

pub const POPULAR_RATING: RangeInclusive<u8> = 4..=5;
pub const SEARCH_RATING: RangeInclusive<u8> = 3..=5;

const WORKS_PREFIX: &str = "/works/";

/// Select up to [MAX_GENRES] genre labels from a subject list.
pub fn extract_genres(subjects: Option<&[String]>) -> Vec<String> {
    let Some(subjects) = subjects else {
        return Vec::new();
    };

    subjects
        .iter()
        .filter(|subject| {
            !BOILERPLATE_SUBJECTS
                .iter()
                .any(|marker| subject.contains(marker))
        })
        .filter(|subject| subject.split(' ').count() < MAX_GENRE_WORDS)
        .take(MAX_GENRES)
        .cloned()
        .collect()
}

/// Strip the `/works/` prefix from a source key.
///
/// A key that strips to nothing falls back to the raw key,
/// then to an id derived from the title.
pub fn book_id(key: &str, title: &str) -> String {
    let key = key.trim();
    match key.strip_prefix(WORKS_PREFIX).unwrap_or(key) {
        "" if key.is_empty() => {
            let hash = blake3::hash(title.as_bytes()).to_hex();
            format!("work-{}", &hash.as_str()[..12])
        },
        "" => key.to_string(),
        id => id.to_string(),
    }
}

/// Build a medium sized cover URL.
///
/// An edition key takes precedence over a numeric cover id.
/// Without either, the local [DEFAULT_COVER] is used.
pub fn cover_url(covers_url: &str, edition_key: Option<&str>, cover_id: Option<i64>) -> String {
    let base = covers_url.trim_end_matches('/');
    match (edition_key, cover_id) {
        (Some(edition_key), _) => format!("{base}/olid/{edition_key}-M.jpg"),
        (None, Some(cover_id)) => format!("{base}/id/{cover_id}-M.jpg"),
        (None, None) => DEFAULT_COVER.to_string(),
    }
}

/// Rating shown for a book.
///
/// The catalog does not provide ratings.
/// This is a stand-in derived from a hash of the book id,
/// so a book keeps its rating across pages and runs.
/// Replace with a real signal once one is available.
pub fn placeholder_rating(id: &str, range: RangeInclusive<u8>) -> u8 {
    let (start, end) = range.into_inner();
    let span = u16::from(end - start) + 1;
    let hash = blake3::hash(id.as_bytes());
    start + (u16::from(hash.as_bytes()[0]) % span) as u8
}

fn olid(edition_key: Option<&str>, id: &str) -> String {
    match edition_key {
        Some(edition_key) => edition_key.to_string(),
        None => format!("work-{id}"),
    }
}

/// Normalize a trending work.
///
/// `details` and `author` are the results of the secondary lookups,
/// already defaulted if they failed.
pub fn normalize_trending(
    work: TrendingWork,
    details: WorkDetails,
    author: Option<String>,
    covers_url: &str,
) -> Book {
    let id = book_id(&work.key, &work.title);
    let edition_key = work.cover_edition_key.as_deref();

    Book {
        rating: placeholder_rating(&id, POPULAR_RATING),
        genres: extract_genres(work.subject.as_deref()),
        cover: cover_url(covers_url, edition_key, work.cover_number()),
        olid: olid(edition_key, &id),
        title: work.title,
        author: author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        first_publish_year: work.first_publish_year,
        description: details
            .description
            .map(|d| d.into_text())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        id,
    }
}

/// Normalize a search hit from its inline fields only.
///
/// Search results carry no description.
pub fn normalize_search(doc: SearchDoc, covers_url: &str) -> Book {
    let id = book_id(&doc.key, &doc.title);
    let edition_key = doc.cover_edition_key.as_deref();

    Book {
        rating: placeholder_rating(&id, SEARCH_RATING),
        genres: extract_genres(doc.subject.as_deref()),
        cover: cover_url(covers_url, edition_key, doc.cover_i),
        olid: olid(edition_key, &id),
        title: doc.title,
        author: doc
            .author_name
            .and_then(|names| names.into_iter().next())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        first_publish_year: doc.first_publish_year,
        description: NO_DESCRIPTION.to_string(),
        id,
    }
}

//! Local filtering of loaded books.

use crate::types::Book;

/// Criteria applied to an already loaded list of books.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case insensitive substring of any genre label
    pub genre: Option<String>,
    /// Minimum rating, inclusive
    pub min_rating: Option<u8>,
}

impl BookFilter {
    pub fn new(genre: Option<String>, min_rating: Option<u8>) -> Self {
        Self {
            genre: genre.filter(|g| !g.is_empty()),
            min_rating,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genre.is_none() && self.min_rating.is_none()
    }

    pub fn matches(&self, book: &Book) -> bool {
        let matches_genre = match &self.genre {
            None => true,
            Some(genre) => {
                let genre = genre.to_lowercase();
                book.genres
                    .iter()
                    .any(|label| label.to_lowercase().contains(&genre))
            },
        };
        let matches_rating = self
            .min_rating
            .is_none_or(|min_rating| book.rating >= min_rating);

        matches_genre && matches_rating
    }

    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        books
            .iter()
            .filter(|book| self.matches(book))
            .cloned()
            .collect()
    }
}

/// Keep the books matching both an optional genre and an optional minimum rating.
///
/// An empty genre counts as no genre filter.
pub fn apply_filters(books: &[Book], genre: Option<&str>, min_rating: Option<u8>) -> Vec<Book> {
    BookFilter::new(genre.map(ToOwned::to_owned), min_rating).apply(books)
}

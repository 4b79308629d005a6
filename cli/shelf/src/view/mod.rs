//! State of the book listing and the transitions between pages, searches
//! and filters.
//!
//! The [ViewController] owns a [ViewState] and draws it onto a [Surface].
//! Transitions mutate the state first and then call [ViewController::render],
//! surfaces never read back from the controller.

use std::sync::Arc;

use serde::Serialize;
use shelf_catalog::{Book, BookFilter, BooksPage, CatalogClientError, ClientTrait};
use shelf_core::SessionRecord;
use tracing::{debug, instrument, warn};

use crate::utils::display_chain;

mod terminal;

pub use terminal::{JsonSurface, TerminalSurface};

pub const LOAD_ERROR_MESSAGE: &str =
    "An error occurred while loading the books. Please try again.";
pub const NO_RESULTS_MESSAGE: &str = "No books found. Try changing your search criteria.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(total: u64, page_size: u32, page: u32) -> Self {
        let total_pages = total.div_ceil(u64::from(page_size.max(1)));
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        Self {
            page,
            total_pages,
            has_previous: page > 1,
            has_next: page < total_pages,
        }
    }
}

/// What the listing currently shows.
///
/// An empty `query` means browsing the trending list.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub page: u32,
    pub page_size: u32,
    pub query: String,
    /// The last successfully loaded page, the base for local filtering
    pub loaded: Option<Arc<BooksPage>>,
    pub filter: BookFilter,
    pub genre_options: Vec<String>,
}

impl ViewState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            query: String::new(),
            loaded: None,
            filter: BookFilter::default(),
            genre_options: Vec::new(),
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }

    /// The loaded books that pass the current filter
    pub fn visible_books(&self) -> Vec<Book> {
        match &self.loaded {
            Some(loaded) => self.filter.apply(&loaded.books),
            None => Vec::new(),
        }
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.loaded
            .as_ref()
            .map(|loaded| Pagination::new(loaded.total, self.page_size, self.page))
    }
}

/// Something the listing can be drawn on.
pub trait Surface {
    fn show_loading(&mut self);
    fn hide_loading(&mut self);
    fn render_books(&mut self, books: &[Book]);
    fn render_pagination(&mut self, pagination: &Pagination);
    fn set_genre_options(&mut self, genres: &[String]);
    fn show_error(&mut self, message: &str);
    fn show_session(&mut self, session: Option<&SessionRecord>);

    /// Write out whatever was rendered since the last call
    fn present(&mut self) {}
}

pub struct ViewController<'a, C, S> {
    client: &'a C,
    surface: S,
    state: ViewState,
}

impl<'a, C: ClientTrait, S: Surface> ViewController<'a, C, S> {
    pub fn new(client: &'a C, surface: S, page_size: u32) -> Self {
        Self {
            client,
            surface,
            state: ViewState::new(page_size),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Load `page` of the trending list, or of the results for `query`.
    ///
    /// Page, query and book list are only replaced if the load succeeds,
    /// a failure leaves the previous state in place and shows
    /// [LOAD_ERROR_MESSAGE] instead.
    /// The filter is reset with every successful load.
    #[instrument(skip(self))]
    pub async fn load(&mut self, query: &str, page: u32) -> Result<(), CatalogClientError> {
        self.surface.show_loading();

        let result = if query.is_empty() {
            self.client.fetch_popular(page, self.state.page_size).await
        } else {
            self.client.search(query, page, self.state.page_size).await
        };

        self.surface.hide_loading();

        match result {
            Ok(loaded) => {
                debug!(books = loaded.books.len(), total = loaded.total, "loaded books");
                self.state.page = page;
                self.state.query = query.to_string();
                self.state.loaded = Some(loaded);
                self.state.filter = BookFilter::default();
                self.state.genre_options = self.client.list_genres();
                self.render();
                Ok(())
            },
            Err(err) => {
                warn!(error = %display_chain(&err), "failed to load books");
                self.surface.show_error(LOAD_ERROR_MESSAGE);
                Err(err)
            },
        }
    }

    /// Go to the next page of the current listing.
    ///
    /// Returns `false` without loading anything if there is no next page.
    pub async fn next_page(&mut self) -> Result<bool, CatalogClientError> {
        if !self.state.pagination().is_some_and(|p| p.has_next) {
            debug!("already on the last page");
            return Ok(false);
        }
        let query = self.state.query.clone();
        self.load(&query, self.state.page + 1).await?;
        Ok(true)
    }

    /// Go to the previous page of the current listing.
    ///
    /// Returns `false` without loading anything on the first page.
    pub async fn previous_page(&mut self) -> Result<bool, CatalogClientError> {
        if self.state.page <= 1 {
            debug!("already on the first page");
            return Ok(false);
        }
        let query = self.state.query.clone();
        self.load(&query, self.state.page - 1).await?;
        Ok(true)
    }

    /// Search from the first page, an empty query returns to browsing.
    pub async fn submit_search(&mut self, query: &str) -> Result<(), CatalogClientError> {
        self.load(query.trim(), 1).await
    }

    /// Filter the loaded books without fetching anything.
    pub fn set_filter(&mut self, filter: BookFilter) {
        debug!(?filter, "filter changed");
        self.state.filter = filter;
        let visible = self.state.visible_books();
        self.surface.render_books(&visible);
    }

    pub fn show_session(&mut self, session: Option<&SessionRecord>) {
        self.surface.show_session(session);
    }

    /// Draw the whole state onto the surface
    pub fn render(&mut self) {
        let visible = self.state.visible_books();
        self.surface.render_books(&visible);
        if let Some(pagination) = self.state.pagination() {
            self.surface.render_pagination(&pagination);
        }
        self.surface.set_genre_options(&self.state.genre_options);
    }
}

use std::fmt::Write as _;
use std::io::{self, Stdout, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use shelf_catalog::Book;
use shelf_core::SessionRecord;
use tracing::{debug, trace};

use super::{NO_RESULTS_MESSAGE, Pagination, Surface};
use crate::utils::message;

const MAX_RATING: u8 = 5;

/// Draws cards as text.
///
/// Transitions only update the pending frame,
/// [Surface::present] writes it out.
pub struct TerminalSurface<W = Stdout> {
    out: W,
    width: usize,
    spinner: Option<ProgressBar>,
    show_spinner: bool,
    books: Option<String>,
    pagination: Option<String>,
}

impl TerminalSurface<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout(), textwrap::termwidth(), true)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn with_writer(out: W, width: usize, show_spinner: bool) -> Self {
        Self {
            out,
            width,
            spinner: None,
            show_spinner,
            books: None,
            pagination: None,
        }
    }

    fn render_card(&self, book: &Book) -> String {
        let mut card = String::new();

        let title = match book.first_publish_year {
            Some(year) => format!("{} ({year})", book.title),
            None => book.title.clone(),
        };
        let options = textwrap::Options::new(self.width).subsequent_indent("  ");
        let _ = writeln!(card, "{}", textwrap::fill(&title, options));

        let details = textwrap::Options::new(self.width)
            .initial_indent("  ")
            .subsequent_indent("  ");
        let _ = writeln!(card, "{}", textwrap::fill(&format!("by {}", book.author), details.clone()));
        let _ = writeln!(card, "  {} ({}/{MAX_RATING})", stars(book.rating), book.rating);
        if !book.genres.is_empty() {
            let genres = format!("Genres: {}", book.genres.join(", "));
            let _ = writeln!(card, "{}", textwrap::fill(&genres, details));
        }
        let _ = writeln!(card, "  Cover: {}", book.cover);

        card
    }

    fn write_out(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            debug!(%err, "could not write listing");
        }
    }
}

impl Default for TerminalSurface<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_RATING as usize - filled)
    )
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn show_loading(&mut self) {
        if !self.show_spinner {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Loading books...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn hide_loading(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn render_books(&mut self, books: &[Book]) {
        if books.is_empty() {
            self.books = Some(format!("{NO_RESULTS_MESSAGE}\n"));
            return;
        }

        let cards = books
            .iter()
            .map(|book| self.render_card(book))
            .collect::<Vec<_>>()
            .join("\n");
        self.books = Some(cards);
    }

    fn render_pagination(&mut self, pagination: &Pagination) {
        self.pagination = Some(format!(
            "Page {} of {}",
            pagination.page, pagination.total_pages
        ));
    }

    fn set_genre_options(&mut self, genres: &[String]) {
        trace!(count = genres.len(), "genre options updated");
    }

    fn show_error(&mut self, message: &str) {
        self.books = None;
        message::error(message);
    }

    fn show_session(&mut self, session: Option<&SessionRecord>) {
        match session {
            Some(session) => message::info(format!("Logged in as {}", session.username)),
            None => message::info("Not logged in"),
        }
    }

    fn present(&mut self) {
        let Some(books) = self.books.take() else {
            return;
        };
        let mut frame = books;
        if let Some(pagination) = &self.pagination {
            frame.push('\n');
            frame.push_str(pagination);
            frame.push('\n');
        }
        self.write_out(&frame);
    }
}

/// Collects the listing and writes it as a single JSON document.
pub struct JsonSurface<W = Stdout> {
    out: W,
    books: Option<Vec<Book>>,
    pagination: Option<Pagination>,
}

impl JsonSurface<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for JsonSurface<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> JsonSurface<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            books: None,
            pagination: None,
        }
    }
}

impl<W: Write> Surface for JsonSurface<W> {
    fn show_loading(&mut self) {}

    fn hide_loading(&mut self) {}

    fn render_books(&mut self, books: &[Book]) {
        self.books = Some(books.to_vec());
    }

    fn render_pagination(&mut self, pagination: &Pagination) {
        self.pagination = Some(*pagination);
    }

    fn set_genre_options(&mut self, _genres: &[String]) {}

    fn show_error(&mut self, message: &str) {
        self.books = None;
        message::error(message);
    }

    fn show_session(&mut self, _session: Option<&SessionRecord>) {}

    fn present(&mut self) {
        let Some(books) = self.books.take() else {
            return;
        };
        let document = json!({
            "books": books,
            "pagination": self.pagination,
        });
        let written = serde_json::to_writer_pretty(&mut self.out, &document)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(self.out));
        if let Err(err) = written {
            debug!(%err, "could not write listing");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shelf_catalog::BookFilter;

    use super::*;
    use crate::view::tests::book;

    fn surface() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::with_writer(Vec::new(), 80, false)
    }

    fn output(surface: &TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.out.clone()).unwrap()
    }

    #[test]
    fn stars_fill_up_to_rating() {
        assert_eq!(stars(4), "★★★★☆");
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(9), "★★★★★");
    }

    #[test]
    fn card_shows_rating_and_genres() {
        let mut surface = surface();
        surface.render_books(&[book("OL1W", &["Fantasy", "Adventure"], 4)]);
        surface.render_pagination(&Pagination::new(20, 9, 1));
        surface.present();

        assert_eq!(output(&surface), indoc::indoc! {"
            Title OL1W
              by Some Author
              ★★★★☆ (4/5)
              Genres: Fantasy, Adventure
              Cover: images/default-book-cover.jpg

            Page 1 of 3
        "});
    }

    #[test]
    fn empty_listing_shows_no_results_message() {
        let mut surface = surface();
        surface.render_books(&[]);
        surface.present();
        assert_eq!(output(&surface), format!("{NO_RESULTS_MESSAGE}\n"));
    }

    #[test]
    fn nothing_is_presented_twice() {
        let mut surface = surface();
        surface.render_books(&[book("OL1W", &[], 3)]);
        surface.present();
        let first = output(&surface);
        surface.present();
        assert_eq!(output(&surface), first);
    }

    #[test]
    fn error_discards_pending_books() {
        let mut surface = surface();
        surface.render_books(&[book("OL1W", &[], 3)]);
        surface.show_error("nope");
        surface.present();
        assert_eq!(output(&surface), "");
    }

    #[test]
    fn json_contains_books_and_pagination() {
        let books = vec![book("OL1W", &["Poetry"], 5), book("OL2W", &["Drama"], 3)];
        let mut surface = JsonSurface::with_writer(Vec::new());
        surface.render_books(&BookFilter::new(None, Some(4)).apply(&books));
        surface.render_pagination(&Pagination::new(20, 9, 2));
        surface.present();

        let value: serde_json::Value = serde_json::from_slice(&surface.out).unwrap();
        assert_eq!(value["books"].as_array().unwrap().len(), 1);
        assert_eq!(value["books"][0]["id"], "OL1W");
        assert_eq!(value["pagination"], json!({
            "page": 2,
            "total_pages": 3,
            "has_previous": true,
            "has_next": true,
        }));
    }
}

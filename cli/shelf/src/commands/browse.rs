use std::fmt::Display;
use std::process::ExitCode;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use inquire::InquireError;
use shelf_catalog::BookFilter;
use tracing::{debug, instrument};

use super::{Shelf, ShelfErrorCode, auth};
use crate::utils::dialog::{Dialog, Select, Text};
use crate::utils::message;
use crate::view::{JsonSurface, Surface, TerminalSurface, ViewController, ViewState};

pub(crate) const MAX_RATING: u8 = 5;

pub(crate) fn is_page_number(page: &u32) -> bool {
    *page >= 1
}

/// Narrow down a loaded page
#[derive(Debug, Bpaf, Clone, Default)]
pub struct FilterArgs {
    /// Only show books with a genre containing <genre>
    #[bpaf(long, argument("genre"))]
    pub genre: Option<String>,

    /// Only show books rated at least <rating> (1-5)
    #[bpaf(long("min-rating"), argument("rating"))]
    pub min_rating: Option<u8>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<BookFilter> {
        if self
            .min_rating
            .is_some_and(|rating| !(1..=MAX_RATING).contains(&rating))
        {
            bail!("'--min-rating' must be between 1 and {MAX_RATING}");
        }
        Ok(BookFilter::new(self.genre.clone(), self.min_rating))
    }
}

// List today's trending books
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Page to show
    #[bpaf(
        long,
        short,
        argument("N"),
        guard(is_page_number, "page numbers start at 1"),
        fallback(1)
    )]
    pub page: u32,

    #[bpaf(external(filter_args))]
    pub filter: FilterArgs,

    /// Print the listing as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Keep browsing: page, search, filter and log in from a prompt
    #[bpaf(long, short)]
    pub interactive: bool,
}

impl Browse {
    #[instrument(name = "browse", fields(page = self.page, interactive = self.interactive), skip_all)]
    pub async fn handle(self, shelf: &mut Shelf) -> Result<()> {
        let filter = self.filter.to_filter()?;
        if self.interactive {
            if self.json {
                bail!("'--json' cannot be combined with '--interactive'");
            }
            return interactive(shelf, "", self.page, filter).await;
        }
        show_listing(shelf, "", self.page, filter, self.json).await
    }
}

/// Load one page, apply `filter` and print the result.
pub(crate) async fn show_listing(
    shelf: &Shelf,
    query: &str,
    page: u32,
    filter: BookFilter,
    json: bool,
) -> Result<()> {
    if json {
        show_once(shelf, JsonSurface::new(), query, page, filter).await
    } else {
        show_once(shelf, TerminalSurface::new(), query, page, filter).await
    }
}

async fn show_once<S: Surface>(
    shelf: &Shelf,
    surface: S,
    query: &str,
    page: u32,
    filter: BookFilter,
) -> Result<()> {
    let mut view = ViewController::new(&shelf.catalog, surface, shelf.page_size);

    // the view already told the user
    if view.load(query, page).await.is_err() {
        return Err(ShelfErrorCode(ExitCode::from(1)).into());
    }

    if !filter.is_empty() {
        view.set_filter(filter);
    }
    view.surface_mut().present();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    NextPage,
    PreviousPage,
    Search,
    Browse,
    FilterGenre,
    MinRating,
    ClearFilters,
    Login,
    Register,
    Logout,
    Quit,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::NextPage => "Next page",
            Action::PreviousPage => "Previous page",
            Action::Search => "Search",
            Action::Browse => "Browse trending books",
            Action::FilterGenre => "Filter by genre",
            Action::MinRating => "Filter by minimum rating",
            Action::ClearFilters => "Clear filters",
            Action::Login => "Log in",
            Action::Register => "Register",
            Action::Logout => "Log out",
            Action::Quit => "Quit",
        };
        write!(f, "{label}")
    }
}

/// The actions that make sense for the current listing
pub(crate) fn available_actions(state: &ViewState, logged_in: bool) -> Vec<Action> {
    let mut actions = Vec::new();

    if let Some(pagination) = state.pagination() {
        if pagination.has_next {
            actions.push(Action::NextPage);
        }
        if pagination.has_previous {
            actions.push(Action::PreviousPage);
        }
    }

    actions.push(Action::Search);
    if state.is_searching() || state.loaded.is_none() {
        actions.push(Action::Browse);
    }

    if state.loaded.is_some() {
        if !state.genre_options.is_empty() {
            actions.push(Action::FilterGenre);
        }
        actions.push(Action::MinRating);
        if !state.filter.is_empty() {
            actions.push(Action::ClearFilters);
        }
    }

    if logged_in {
        actions.push(Action::Logout);
    } else {
        actions.push(Action::Login);
        actions.push(Action::Register);
    }

    actions.push(Action::Quit);
    actions
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GenreChoice(Option<String>);

impl Display for GenreChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(genre) => write!(f, "{genre}"),
            None => write!(f, "All genres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RatingChoice(Option<u8>);

impl Display for RatingChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(MAX_RATING) => write!(f, "{MAX_RATING} stars"),
            Some(rating) => write!(f, "{rating}+ stars"),
            None => write!(f, "Any rating"),
        }
    }
}

/// True if the user backed out of a prompt
fn is_cancelled(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Browse from a prompt until the user quits.
///
/// Failed loads and rejected logins are shown and the loop goes on.
pub(crate) async fn interactive(
    shelf: &mut Shelf,
    query: &str,
    page: u32,
    filter: BookFilter,
) -> Result<()> {
    if !Dialog::can_prompt() {
        bail!("Cannot prompt for user input, run without '--interactive'");
    }

    let Shelf {
        catalog,
        session,
        page_size,
    } = shelf;
    let mut view = ViewController::new(&*catalog, TerminalSurface::new(), *page_size);

    view.show_session(session.current());
    if view.load(query, page).await.is_ok() && !filter.is_empty() {
        view.set_filter(filter);
    }
    view.surface_mut().present();

    loop {
        let actions = available_actions(view.state(), session.is_logged_in());
        let action = Dialog {
            message: "What next?",
            help_message: None,
            typed: Select { options: actions },
        }
        .prompt()
        .await;

        let action = match action {
            Ok(action) => action,
            Err(err) if is_cancelled(&err) => break,
            Err(err) => return Err(err.into()),
        };
        debug!(%action, "selected");

        // load failures are shown by the view
        match action {
            Action::NextPage => {
                view.next_page().await.ok();
            },
            Action::PreviousPage => {
                view.previous_page().await.ok();
            },
            Action::Search => {
                let query = Dialog {
                    message: "Search for:",
                    help_message: Some("Title, author or keywords"),
                    typed: Text {
                        default: Some(view.state().query.clone()).filter(|q| !q.is_empty()),
                    },
                }
                .prompt()
                .await;
                match query {
                    Ok(query) => {
                        view.submit_search(&query).await.ok();
                    },
                    Err(err) if is_cancelled(&err) => {},
                    Err(err) => return Err(err.into()),
                }
            },
            Action::Browse => {
                view.submit_search("").await.ok();
            },
            Action::FilterGenre => {
                let filter = prompt_genre(view.state()).await?;
                if let Some(filter) = filter {
                    view.set_filter(filter);
                }
            },
            Action::MinRating => {
                let filter = prompt_min_rating(view.state()).await?;
                if let Some(filter) = filter {
                    view.set_filter(filter);
                }
            },
            Action::ClearFilters => view.set_filter(BookFilter::default()),
            Action::Login => {
                if let Err(err) = auth::prompt_login(session, None, None).await {
                    message::error(format!("{err:#}"));
                }
                view.show_session(session.current());
            },
            Action::Register => {
                if let Err(err) = auth::register(session).await {
                    message::error(format!("{err:#}"));
                }
                view.show_session(session.current());
            },
            Action::Logout => {
                if let Err(err) = auth::logout(session) {
                    message::error(format!("{err:#}"));
                }
                view.show_session(session.current());
            },
            Action::Quit => break,
        }

        view.surface_mut().present();
    }

    Ok(())
}

async fn prompt_genre(state: &ViewState) -> Result<Option<BookFilter>> {
    let mut options = vec![GenreChoice(None)];
    options.extend(state.genre_options.iter().cloned().map(Some).map(GenreChoice));

    let choice = Dialog {
        message: "Genre:",
        help_message: None,
        typed: Select { options },
    }
    .prompt()
    .await;

    match choice {
        Ok(GenreChoice(genre)) => Ok(Some(BookFilter::new(genre, state.filter.min_rating))),
        Err(err) if is_cancelled(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn prompt_min_rating(state: &ViewState) -> Result<Option<BookFilter>> {
    let mut options = vec![RatingChoice(None)];
    options.extend((1..=MAX_RATING).map(Some).map(RatingChoice));

    let choice = Dialog {
        message: "Minimum rating:",
        help_message: None,
        typed: Select { options },
    }
    .prompt()
    .await;

    match choice {
        Ok(RatingChoice(min_rating)) => Ok(Some(BookFilter::new(
            state.filter.genre.clone(),
            min_rating,
        ))),
        Err(err) if is_cancelled(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

mod auth;
mod browse;
mod search;

use std::fmt::{self, Debug, Display};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bpaf::{Args, Bpaf, Parser};
use indoc::{formatdoc, indoc};
use shelf_catalog::{CatalogStore, Client};
use shelf_core::{FileStorage, MemoryStorage, SessionStore, UncheckedVerifier};
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::message;

static SHELF_DESCRIPTION: &'_ str = indoc! {"
    shelf browses the Open Library catalog from your terminal.

    List today's trending books, search by title, author or keyword,
    and narrow down what was loaded by genre or rating."
};

pub const SHELF_VERSION: &str = env!("CARGO_PKG_VERSION");

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(SHELF_DESCRIPTION))]
pub struct ShelfCli(#[bpaf(external(shelf_args))] pub ShelfArgs);

/// Main shelf args parser
///
/// To parse the shelf CLI, use [`ShelfCli`] instead using [`shelf_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct ShelfArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Print the version of the program
    #[allow(dead_code)] // fake arg, `--version` is checked for separately (see [Version])
    #[bpaf(long, short('V'))]
    version: bool,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

/// Everything a command works with
#[derive(Debug)]
pub struct Shelf {
    pub catalog: Client,
    pub session: SessionStore,
    pub page_size: u32,
}

impl ShelfArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        // the remembered session lives in the data dir
        tokio::fs::create_dir_all(&config.shelf.data_dir)
            .await
            .with_context(|| {
                format!(
                    "Could not create data directory: {}",
                    config.shelf.data_dir.display()
                )
            })?;

        let session = SessionStore::open(
            FileStorage::in_dir(&config.shelf.data_dir),
            MemoryStorage::default(),
            UncheckedVerifier,
        );

        let Some(command) = self.command else {
            print_welcome_message(&session);
            return Ok(());
        };

        let store = Arc::new(CatalogStore::new());
        let catalog = init_catalog_client(&config, store)?;

        let mut shelf = Shelf {
            catalog,
            session,
            page_size: config.shelf.page_size,
        };
        debug!(?shelf, "initialized");

        // Wait for either an interrupting signal or completion of the command
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                Err(anyhow!("user interrupted process"))
            }
            result = command.handle(&mut shelf) => result,
        }
    }
}

fn print_welcome_message(session: &SessionStore) {
    let greeting = match session.current() {
        Some(record) => format!("Welcome back, {}!", record.username),
        None => "Welcome to shelf!".to_string(),
    };

    message::plain(formatdoc! {"
        {greeting}

        Get started with:

            shelf browse             List today's trending books
            shelf browse -i          Page, search and filter interactively
            shelf search <query>     Search by title, author or keyword
            shelf login              Start a session

        Run 'shelf --help' for all commands.
    "});
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// List today's trending books
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),

    /// Search the catalog by title, author or keyword
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Start a session
    #[bpaf(command)]
    Login(#[bpaf(external(auth::login))] auth::Login),

    /// Create a profile and start a session for it
    #[bpaf(command)]
    Register,

    /// End the current session
    #[bpaf(command)]
    Logout,

    /// Print your current login status
    #[bpaf(command)]
    Status,
}

impl Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl Commands {
    async fn handle(self, shelf: &mut Shelf) -> Result<()> {
        match self {
            Commands::Browse(args) => args.handle(shelf).await,
            Commands::Search(args) => args.handle(shelf).await,
            Commands::Login(args) => args.handle(shelf).await,
            Commands::Register => auth::register(&mut shelf.session).await,
            Commands::Logout => auth::logout(&mut shelf.session),
            Commands::Status => {
                message::plain(auth::status_message(shelf.session.current()));
                Ok(())
            },
        }
    }
}

/// Fake argument used to parse `--version` separately
#[derive(Bpaf, Default)]
pub struct Version(#[bpaf(short('V'), long("version"))] bool);

impl Version {
    /// Parses to [Self] and extract the `--version` flag
    pub fn check() -> bool {
        bpaf::construct!(version(), shelf_args())
            .to_options()
            .run_inner(Args::current_args())
            .map(|(v, _)| v)
            .unwrap_or_default()
            .0
    }
}

/// Exit with the given code without printing anything else
///
/// Used when the failure was already shown to the user.
#[derive(Debug)]
pub struct ShelfErrorCode(pub ExitCode);

impl Display for ShelfErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

impl std::error::Error for ShelfErrorCode {}

use anyhow::{Result, bail};
use bpaf::Bpaf;
use tracing::instrument;

use super::Shelf;
use super::browse::{FilterArgs, filter_args, interactive, is_page_number, show_listing};

// Search the catalog by title, author or keyword
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Page of the results to show
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

    /// Print the results as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Keep browsing the results from a prompt
    #[bpaf(long, short)]
    pub interactive: bool,

    /// Title, author or keywords to search for
    #[bpaf(positional("query"), some("a search query is required"))]
    pub query: Vec<String>,
}

impl Search {
    /// The words of the query joined and trimmed
    pub fn query(&self) -> String {
        self.query.join(" ").trim().to_string()
    }

    #[instrument(name = "search", fields(query = %self.query(), page = self.page), skip_all)]
    pub async fn handle(self, shelf: &mut Shelf) -> Result<()> {
        let query = self.query();
        if query.is_empty() {
            bail!("Search query must not be empty, use 'shelf browse' to list trending books");
        }

        let filter = self.filter.to_filter()?;
        if self.interactive {
            if self.json {
                bail!("'--json' cannot be combined with '--interactive'");
            }
            return interactive(shelf, &query, self.page, filter).await;
        }
        show_listing(shelf, &query, self.page, filter, self.json).await
    }
}

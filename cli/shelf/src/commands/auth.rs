use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use indoc::formatdoc;
use shelf_core::{Registration, SessionRecord, SessionStore};
use tracing::{debug, instrument};

use super::Shelf;
use crate::utils::dialog::{Confirm, Dialog, Password, Text};
use crate::utils::message;

const PASSWORD_HELP: &str = "Passwords are neither checked nor stored";

// Start a session
//
// A session started here is always remembered,
// one that ends with the process is only useful inside `browse -i`.
#[derive(Debug, Bpaf, Clone)]
pub struct Login {
    /// Username to log in as, prompted for if omitted
    #[bpaf(long, short, argument("username"))]
    pub username: Option<String>,
}

impl Login {
    #[instrument(name = "login", skip_all)]
    pub async fn handle(self, shelf: &mut Shelf) -> Result<()> {
        prompt_login(&mut shelf.session, self.username, Some(true)).await
    }
}

fn ensure_can_prompt() -> Result<()> {
    if !Dialog::can_prompt() {
        bail!("Cannot prompt for user input");
    }
    Ok(())
}

async fn prompt_text(message: &str, help_message: Option<&str>) -> Result<String> {
    Dialog {
        message,
        help_message,
        typed: Text::default(),
    }
    .prompt()
    .await
    .with_context(|| format!("Could not read '{}'", message.trim_end_matches(':')))
}

async fn prompt_password(message: &str) -> Result<String> {
    Dialog {
        message,
        help_message: Some(PASSWORD_HELP),
        typed: Password,
    }
    .prompt()
    .await
    .context("Could not read password")
}

async fn prompt_remember() -> Result<bool> {
    Dialog {
        message: "Remember me?",
        help_message: Some("Otherwise you are logged out when shelf exits"),
        typed: Confirm {
            default: Some(true),
        },
    }
    .prompt()
    .await
    .context("Could not read answer")
}

/// Prompt for missing credentials and log in
///
/// `remember` is asked for if `None`.
pub(crate) async fn prompt_login(
    session: &mut SessionStore,
    username: Option<String>,
    remember: Option<bool>,
) -> Result<()> {
    ensure_can_prompt()?;

    let username = match username {
        Some(username) => username,
        None => prompt_text("Username:", None).await?,
    };
    let password = prompt_password("Password:").await?;
    let remember = match remember {
        Some(remember) => remember,
        None => prompt_remember().await?,
    };

    start_session(session, &username, &password, remember)
}

fn start_session(
    session: &mut SessionStore,
    username: &str,
    password: &str,
    remember: bool,
) -> Result<()> {
    let record = session.login(username, password, remember)?;
    if remember {
        message::updated(format!("Logged in as {}", record.username));
    } else {
        message::updated(format!("Logged in as {} until shelf exits", record.username));
    }
    Ok(())
}

/// Prompt for a profile, register it and log in
#[instrument(name = "register", skip_all)]
pub(crate) async fn register(session: &mut SessionStore) -> Result<()> {
    ensure_can_prompt()?;

    let registration = Registration {
        name: prompt_text("Name:", None).await?,
        email: prompt_text("Email:", None).await?,
        username: prompt_text("Username:", None).await?,
        password: prompt_password("Password:").await?,
        confirm_password: prompt_password("Confirm password:").await?,
    };
    debug!(?registration, "registering");

    let record = session.register(&registration)?;
    message::updated(format!("Registered and logged in as {}", record.username));
    Ok(())
}

#[instrument(name = "logout", skip_all)]
pub(crate) fn logout(session: &mut SessionStore) -> Result<()> {
    if !session.is_logged_in() {
        message::warning("You are not logged in");
        return Ok(());
    }
    session.logout()?;
    message::updated("Logged out");
    Ok(())
}

pub(crate) fn status_message(session: Option<&SessionRecord>) -> String {
    let Some(record) = session else {
        return "You are not logged in".to_string();
    };

    match (&record.name, &record.email) {
        (Some(name), Some(email)) => formatdoc! {"
            Logged in as {username}
              Name:  {name}
              Email: {email}",
            username = record.username,
        },
        _ => format!("Logged in as {}", record.username),
    }
}

//! Interactive credential collection.
//!
//! Prompts for whichever of username/password the flags and config merge
//! did not supply. Uses dialoguer for terminal UI prompts; an interrupted
//! prompt (Ctrl-C / closed stdin) maps to [`Error::PromptInterrupted`].

use dialoguer::{Input, Password, theme::ColorfulTheme};

use stevedore_core::prelude::{Credentials, Error};

/// Resolve credentials from pre-supplied values, prompting for the rest.
pub fn acquire_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<Credentials, Error> {
    let theme = ColorfulTheme::default();

    let username = match username {
        Some(u) if !u.is_empty() => u,
        _ => Input::with_theme(&theme)
            .with_prompt("Username (Ctrl-C to exit)")
            .interact_text()
            .map_err(|_| Error::PromptInterrupted)?,
    };

    let password = match password {
        Some(p) if !p.is_empty() => p,
        _ => Password::with_theme(&theme)
            .with_prompt("Password (Ctrl-C to exit)")
            .interact()
            .map_err(|_| Error::PromptInterrupted)?,
    };

    Ok(Credentials { username, password })
}

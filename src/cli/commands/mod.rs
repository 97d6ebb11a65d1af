mod account;
mod advice;
mod catalog;
mod desk;
mod loans;

pub use account::{cmd_register, cmd_whoami};
pub use advice::{cmd_describe, cmd_recommend};
pub use catalog::{cmd_add_book, cmd_books};
pub use desk::{cmd_reconcile, cmd_return, cmd_returns};
pub use loans::{cmd_borrow, cmd_loans};

use crate::cli::Credentials;
use crate::config::Config;
use crate::db::Store;
use crate::domain::Session;
use crate::services::{AuthService, JsonAuthService, JsonLibraryService, ProfileImageService};
use anyhow::{Context, bail};

fn auth_service(config: &Config, store: Store) -> JsonAuthService {
    JsonAuthService::new(
        store,
        ProfileImageService::new(config.profiles_dir()),
        config.security.clone(),
    )
}

fn library_service(config: &Config, store: Store) -> JsonLibraryService {
    JsonLibraryService::new(store, config.loans.clone())
}

async fn login(config: &Config, store: &Store, credentials: Credentials<'_>) -> anyhow::Result<Session> {
    let (Some(user), Some(password)) = (credentials.user, credentials.password) else {
        bail!("This command needs --user and --password (or LIBRIS_USER / LIBRIS_PASSWORD)");
    };

    auth_service(config, store.clone())
        .login(user, password)
        .await
        .with_context(|| format!("Login failed for '{user}'"))
}

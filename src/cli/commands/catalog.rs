//! Catalog command handlers

use crate::cli::Credentials;
use crate::config::Config;
use crate::db::Store;
use crate::services::{LibraryError, LibraryService, NewBook};

use super::{library_service, login};

pub async fn cmd_books(config: &Config) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let books = library_service(config, store).catalog().await?;

    if books.is_empty() {
        println!("The catalog is empty.");
        return Ok(());
    }

    println!("Books ({} total)", books.len());
    println!("{:-<70}", "");

    for book in books {
        let status = if book.available { "Available" } else { "Borrowed" };
        println!("{} {}", book.book_id, book.title);
        println!(
            "  Author: {} | Genre: {} | Status: {status}",
            book.author, book.genre
        );
    }

    Ok(())
}

pub async fn cmd_add_book(
    config: &Config,
    credentials: Credentials<'_>,
    book: NewBook,
) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;

    match library_service(config, store).add_book(&session, book).await {
        Ok(entry) => {
            println!("✓ Added {}: '{}' by {}", entry.book_id, entry.title, entry.author);
            Ok(())
        }
        Err(
            e @ (LibraryError::Validation(_)
            | LibraryError::DuplicateBook(_)
            | LibraryError::Forbidden(_)),
        ) => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

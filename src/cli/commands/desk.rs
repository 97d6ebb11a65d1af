//! Admin returns desk

use crate::cli::Credentials;
use crate::config::Config;
use crate::db::Store;
use crate::services::{LibraryError, LibraryService};

use super::{library_service, login};

pub async fn cmd_returns(config: &Config, credentials: Credentials<'_>) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;

    let loans = match library_service(config, store).open_loans(&session).await {
        Ok(loans) => loans,
        Err(e @ LibraryError::Forbidden(_)) => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if loans.is_empty() {
        println!("No books are currently borrowed.");
        return Ok(());
    }

    println!("Open Loans ({} total)", loans.len());
    println!("{:-<70}", "");

    for loan in loans {
        println!("{} {} -> {}", loan.book_id, loan.title, loan.username);
        println!("  Issued: {} | Due: {}", loan.issue_date, loan.due_date);
    }

    Ok(())
}

pub async fn cmd_return(
    config: &Config,
    credentials: Credentials<'_>,
    username: &str,
    book_id: &str,
) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;

    match library_service(config, store)
        .return_book(&session, username, book_id)
        .await
    {
        Ok(summary) => {
            println!(
                "✓ {} returned by {} on {}",
                summary.book_id, summary.username, summary.return_date
            );
            if summary.fine > 0 {
                println!("Fine: {} {}", summary.fine, config.loans.currency);
            } else {
                println!("No fine.");
            }
            Ok(())
        }
        Err(
            e @ (LibraryError::Forbidden(_)
            | LibraryError::Validation(_)
            | LibraryError::NoSuchIssue { .. }
            | LibraryError::AlreadyReturned { .. }),
        ) => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_reconcile(config: &Config, credentials: Credentials<'_>) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;

    match library_service(config, store).reconcile(&session).await {
        Ok(changed) if changed.is_empty() => {
            println!("✓ Availability flags already consistent.");
            Ok(())
        }
        Ok(changed) => {
            println!("✓ Repaired {} book(s):", changed.len());
            for id in changed {
                println!("  {id}");
            }
            Ok(())
        }
        Err(e @ LibraryError::Forbidden(_)) => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

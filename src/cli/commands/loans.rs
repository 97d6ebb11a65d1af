use crate::cli::Credentials;
use crate::config::Config;
use crate::db::Store;
use crate::services::{LibraryError, LibraryService};

use super::{library_service, login};

pub async fn cmd_borrow(
    config: &Config,
    credentials: Credentials<'_>,
    book_id: &str,
) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;

    match library_service(config, store).borrow(&session, book_id).await {
        Ok(receipt) => {
            println!("✓ Borrowed '{}' ({})", receipt.title, receipt.book_id);
            println!("Due date: {}", receipt.due_date);
            Ok(())
        }
        Err(LibraryError::Unavailable(id)) => {
            println!("Book {id} is not available for borrowing.");
            println!("Use 'libris books' to see what is on the shelf.");
            Ok(())
        }
        Err(e @ (LibraryError::UnknownBook(_) | LibraryError::Validation(_))) => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_loans(config: &Config, credentials: Credentials<'_>) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;
    let loans = library_service(config, store).my_loans(&session).await?;

    if loans.is_empty() {
        println!("You haven't borrowed any books.");
        return Ok(());
    }

    println!("Borrowed Books ({})", session.username);
    println!("{:-<70}", "");

    for loan in loans {
        let status = if loan.returned { "Returned" } else { "Borrowed" };
        let marker = if loan.overdue { " ⚠ OVERDUE" } else { "" };

        println!("{} {} [{status}]{marker}", loan.book_id, loan.title);
        println!("  Issued: {} | Due: {}", loan.issue_date, loan.due_date);
        if let Some(returned) = loan.return_date {
            println!(
                "  Returned: {returned} | Fine: {} {}",
                loan.fine.unwrap_or_default(),
                config.loans.currency
            );
        }
    }

    Ok(())
}

//! Borrow and return transactions.
//!
//! These are the only code paths that write `issues.json`, and the only ones
//! that flip a book's `available` flag after it is created. A book is
//! available exactly when no open issue references it.

use crate::db::{Collection, DataFiles, StoreError};
use crate::domain::{BookId, Username};
use crate::models::{ArchivedIssue, Books, History, IssueRecord, Issues};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CirculationError {
    #[error("Book not found: {0}")]
    UnknownBook(BookId),

    #[error("Book {0} is not available for borrowing")]
    Unavailable(BookId),

    #[error("No issue record for book {book_id} held by {username}")]
    NoSuchIssue { username: Username, book_id: BookId },

    #[error("Book {book_id} was already returned by {username}")]
    AlreadyReturned { username: Username, book_id: BookId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An unreturned issue, as listed on the returns desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLoan {
    pub username: Username,
    pub book_id: BookId,
    pub record: IssueRecord,
}

/// Outcome of a processed return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnReceipt {
    pub username: Username,
    pub book_id: BookId,
    pub record: IssueRecord,
    pub fine: u32,
}

pub struct CirculationRepository {
    files: DataFiles,
}

impl CirculationRepository {
    #[must_use]
    pub const fn new(files: DataFiles) -> Self {
        Self { files }
    }

    async fn books(&self) -> Result<Books, StoreError> {
        self.files.load(Collection::Books).await
    }

    async fn issues(&self) -> Result<Issues, StoreError> {
        self.files.load(Collection::Issues).await
    }

    pub async fn history(&self) -> Result<History, StoreError> {
        self.files.load(Collection::History).await
    }

    pub async fn borrow(
        &self,
        username: &Username,
        book_id: &BookId,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<IssueRecord, CirculationError> {
        let mut books = self.books().await?;
        let mut issues = self.issues().await?;

        let book = books
            .get_mut(book_id)
            .ok_or_else(|| CirculationError::UnknownBook(book_id.clone()))?;

        let held_elsewhere = issues
            .values()
            .filter_map(|held| held.get(book_id))
            .any(IssueRecord::is_open);

        if !book.available || held_elsewhere {
            if book.available {
                warn!(book_id = %book_id, "Book flagged available but has an open issue");
            }
            return Err(CirculationError::Unavailable(book_id.clone()));
        }

        // The previous issue under this key is closed (checked above); keep it
        // before the new one replaces it.
        if let Some(previous) = issues.get(username).and_then(|held| held.get(book_id)) {
            let mut history = self.history().await?;
            history.push(ArchivedIssue::new(
                username.clone(),
                book_id.clone(),
                previous.clone(),
            ));
            self.files.save(Collection::History, &history).await?;
            info!(username = %username, book_id = %book_id, "Archived previous issue before re-borrow");
        }

        book.available = false;
        self.files.save(Collection::Books, &books).await?;

        let record = IssueRecord::open(issue_date, due_date);
        issues
            .entry(username.clone())
            .or_default()
            .insert(book_id.clone(), record.clone());
        self.files.save(Collection::Issues, &issues).await?;

        info!(username = %username, book_id = %book_id, due = %due_date, "Book borrowed");
        Ok(record)
    }

    pub async fn return_book<F>(
        &self,
        username: &Username,
        book_id: &BookId,
        returned_on: NaiveDate,
        fine_for: F,
    ) -> Result<ReturnReceipt, CirculationError>
    where
        F: FnOnce(NaiveDate) -> u32 + Send,
    {
        let mut issues = self.issues().await?;

        let record = issues
            .get_mut(username)
            .and_then(|held| held.get_mut(book_id))
            .ok_or_else(|| CirculationError::NoSuchIssue {
                username: username.clone(),
                book_id: book_id.clone(),
            })?;

        if record.returned {
            return Err(CirculationError::AlreadyReturned {
                username: username.clone(),
                book_id: book_id.clone(),
            });
        }

        let fine = fine_for(record.due_date);
        record.returned = true;
        record.return_date = Some(returned_on);
        record.fine = Some(fine);
        let record = record.clone();

        let mut books = self.books().await?;
        match books.get_mut(book_id) {
            Some(book) => book.available = true,
            None => warn!(book_id = %book_id, "Returned book is missing from the catalog"),
        }

        self.files.save(Collection::Books, &books).await?;
        self.files.save(Collection::Issues, &issues).await?;

        info!(username = %username, book_id = %book_id, fine, "Book returned");
        Ok(ReturnReceipt {
            username: username.clone(),
            book_id: book_id.clone(),
            record,
            fine,
        })
    }

    pub async fn for_user(&self, username: &str) -> Result<BTreeMap<BookId, IssueRecord>, StoreError> {
        let mut issues = self.issues().await?;
        Ok(issues.remove(username).unwrap_or_default())
    }

    pub async fn open_loans(&self) -> Result<Vec<OpenLoan>, StoreError> {
        let issues = self.issues().await?;

        Ok(issues
            .into_iter()
            .flat_map(|(username, held)| {
                held.into_iter()
                    .filter(|(_, record)| record.is_open())
                    .map(move |(book_id, record)| OpenLoan {
                        username: username.clone(),
                        book_id,
                        record,
                    })
            })
            .collect())
    }

    pub async fn reconcile(&self) -> Result<Vec<BookId>, StoreError> {
        let mut books = self.books().await?;
        let issues = self.issues().await?;

        let on_loan: BTreeSet<&BookId> = issues
            .values()
            .flat_map(|held| held.iter())
            .filter(|(_, record)| record.is_open())
            .map(|(book_id, _)| book_id)
            .collect();

        let mut changed = Vec::new();
        for (book_id, book) in &mut books {
            let available = !on_loan.contains(book_id);
            if book.available != available {
                warn!(book_id = %book_id, available, "Repairing availability flag");
                book.available = available;
                changed.push(book_id.clone());
            }
        }

        if !changed.is_empty() {
            self.files.save(Collection::Books, &books).await?;
        }

        Ok(changed)
    }
}

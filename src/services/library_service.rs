//! Domain service for circulation: catalog, borrowing, returns and stock.
//!
//! Every call that acts for a user takes the caller's [`Session`]. Admin-only
//! operations check the session role before touching the store.

use crate::db::{CirculationError, StoreError};
use crate::domain::{BookId, Session, Username};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Domain errors for circulation operations. None of the rejections mutate
/// stored state.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Only administrators may {0}")]
    Forbidden(&'static str),

    #[error("Book not found: {0}")]
    UnknownBook(BookId),

    #[error("Book ID already exists: {0}")]
    DuplicateBook(BookId),

    #[error("Book {0} is not available for borrowing")]
    Unavailable(BookId),

    #[error("{username} has no issue record for book {book_id}")]
    NoSuchIssue { username: Username, book_id: BookId },

    #[error("Book {book_id} was already returned by {username}")]
    AlreadyReturned { username: Username, book_id: BookId },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<CirculationError> for LibraryError {
    fn from(err: CirculationError) -> Self {
        match err {
            CirculationError::UnknownBook(id) => Self::UnknownBook(id),
            CirculationError::Unavailable(id) => Self::Unavailable(id),
            CirculationError::NoSuchIssue { username, book_id } => {
                Self::NoSuchIssue { username, book_id }
            }
            CirculationError::AlreadyReturned { username, book_id } => {
                Self::AlreadyReturned { username, book_id }
            }
            CirculationError::Store(e) => Self::Store(e),
        }
    }
}

/// One catalog row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub available: bool,
}

/// Input for [`LibraryService::add_book`].
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BorrowReceipt {
    pub book_id: BookId,
    pub title: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// A loan as shown to its borrower.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoanView {
    pub book_id: BookId,
    pub title: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub returned: bool,
    pub return_date: Option<NaiveDate>,
    pub fine: Option<u32>,
    pub overdue: bool,
}

/// An unreturned loan as shown on the returns desk.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OpenLoanView {
    pub username: Username,
    pub book_id: BookId,
    pub title: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReturnSummary {
    pub username: Username,
    pub book_id: BookId,
    pub due_date: NaiveDate,
    pub return_date: NaiveDate,
    pub fine: u32,
}

/// Domain service trait for circulation.
#[async_trait::async_trait]
pub trait LibraryService: Send + Sync {
    /// All books, ordered by id.
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, LibraryError>;

    /// Lends a book to the session user.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Unavailable`] if the book is out; nothing is written.
    async fn borrow(&self, session: &Session, book_id: &str) -> Result<BorrowReceipt, LibraryError>;

    /// The session user's issue records, current and returned.
    async fn my_loans(&self, session: &Session) -> Result<Vec<LoanView>, LibraryError>;

    /// Every unreturned issue. Admin only.
    async fn open_loans(&self, session: &Session) -> Result<Vec<OpenLoanView>, LibraryError>;

    /// Closes an issue, charging any late fine. Admin only.
    async fn return_book(
        &self,
        session: &Session,
        username: &str,
        book_id: &str,
    ) -> Result<ReturnSummary, LibraryError>;

    /// Adds a book to the catalog as available. Admin only.
    async fn add_book(&self, session: &Session, book: NewBook) -> Result<CatalogEntry, LibraryError>;

    /// Recomputes availability flags from open issues. Admin only.
    async fn reconcile(&self, session: &Session) -> Result<Vec<BookId>, LibraryError>;
}

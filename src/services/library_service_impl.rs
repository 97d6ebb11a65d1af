//! JSON-store implementation of the `LibraryService` trait.

use crate::config::LoanConfig;
use crate::db::Store;
use crate::domain::{BookId, Session, Username};
use crate::models::BookRecord;
use crate::services::fine::{calculate_fine, due_instant};
use crate::services::library_service::{
    BorrowReceipt, CatalogEntry, LibraryError, LibraryService, LoanView, NewBook, OpenLoanView,
    ReturnSummary,
};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDateTime};
use std::sync::Arc;
use tracing::info;

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct JsonLibraryService {
    store: Store,
    loans: LoanConfig,
    clock: Clock,
}

impl JsonLibraryService {
    #[must_use]
    pub fn new(store: Store, loans: LoanConfig) -> Self {
        Self::with_clock(store, loans, Arc::new(|| Local::now().naive_local()))
    }

    #[must_use]
    pub fn with_clock(store: Store, loans: LoanConfig, clock: Clock) -> Self {
        Self {
            store,
            loans,
            clock,
        }
    }

    const fn require_admin(session: &Session, action: &'static str) -> Result<(), LibraryError> {
        if session.is_admin() {
            Ok(())
        } else {
            Err(LibraryError::Forbidden(action))
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, LibraryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LibraryError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[async_trait]
impl LibraryService for JsonLibraryService {
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, LibraryError> {
        let books = self.store.list_books().await?;

        Ok(books
            .into_iter()
            .map(|(book_id, book)| CatalogEntry {
                book_id,
                title: book.title,
                author: book.author,
                genre: book.genre,
                available: book.available,
            })
            .collect())
    }

    async fn borrow(&self, session: &Session, book_id: &str) -> Result<BorrowReceipt, LibraryError> {
        let book_id = BookId::new(required(book_id, "Book ID")?);

        let issue_date = (self.clock)().date();
        let days = u64::try_from(self.loans.loan_days).unwrap_or_default();
        let due_date = issue_date
            .checked_add_days(Days::new(days))
            .ok_or_else(|| LibraryError::Validation("Due date out of range".to_string()))?;

        let record = self
            .store
            .borrow_book(&session.username, &book_id, issue_date, due_date)
            .await?;

        let title = self
            .store
            .get_book(book_id.as_str())
            .await?
            .map(|b| b.title)
            .unwrap_or_default();

        Ok(BorrowReceipt {
            book_id,
            title,
            issue_date: record.issue_date,
            due_date: record.due_date,
        })
    }

    async fn my_loans(&self, session: &Session) -> Result<Vec<LoanView>, LibraryError> {
        let books = self.store.list_books().await?;
        let issues = self.store.issues_for(session.username.as_str()).await?;
        let today = (self.clock)().date();

        Ok(issues
            .into_iter()
            .filter_map(|(book_id, record)| {
                let title = books.get(&book_id)?.title.clone();
                Some(LoanView {
                    overdue: record.is_overdue(today),
                    book_id,
                    title,
                    issue_date: record.issue_date,
                    due_date: record.due_date,
                    returned: record.returned,
                    return_date: record.return_date,
                    fine: record.fine,
                })
            })
            .collect())
    }

    async fn open_loans(&self, session: &Session) -> Result<Vec<OpenLoanView>, LibraryError> {
        Self::require_admin(session, "view open loans")?;

        let books = self.store.list_books().await?;
        let loans = self.store.open_loans().await?;

        Ok(loans
            .into_iter()
            .filter_map(|loan| {
                let title = books.get(&loan.book_id)?.title.clone();
                Some(OpenLoanView {
                    username: loan.username,
                    book_id: loan.book_id,
                    title,
                    issue_date: loan.record.issue_date,
                    due_date: loan.record.due_date,
                })
            })
            .collect())
    }

    async fn return_book(
        &self,
        session: &Session,
        username: &str,
        book_id: &str,
    ) -> Result<ReturnSummary, LibraryError> {
        Self::require_admin(session, "process returns")?;

        let username = Username::new(required(username, "Username")?);
        let book_id = BookId::new(required(book_id, "Book ID")?);

        let now = (self.clock)();
        let per_day = self.loans.fine_per_day;
        let receipt = self
            .store
            .return_book(&username, &book_id, now.date(), |due| {
                calculate_fine(now, due_instant(due), per_day)
            })
            .await?;

        Ok(ReturnSummary {
            username: receipt.username,
            book_id: receipt.book_id,
            due_date: receipt.record.due_date,
            return_date: now.date(),
            fine: receipt.fine,
        })
    }

    async fn add_book(&self, session: &Session, book: NewBook) -> Result<CatalogEntry, LibraryError> {
        Self::require_admin(session, "add books")?;

        let book_id = BookId::new(required(&book.book_id, "Book ID")?);
        let record = BookRecord::new(
            &required(&book.title, "Title")?,
            &required(&book.author, "Author")?,
            &required(&book.genre, "Genre")?,
        );

        if !self.store.add_book(&book_id, record.clone()).await? {
            return Err(LibraryError::DuplicateBook(book_id));
        }

        Ok(CatalogEntry {
            book_id,
            title: record.title,
            author: record.author,
            genre: record.genre,
            available: record.available,
        })
    }

    async fn reconcile(&self, session: &Session) -> Result<Vec<BookId>, LibraryError> {
        Self::require_admin(session, "repair availability")?;

        let changed = self.store.reconcile_availability().await?;
        info!(repaired = changed.len(), "Availability reconciled");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::domain::Role;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("libris-library-{label}-{}", uuid::Uuid::new_v4()))
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    struct Harness {
        service: JsonLibraryService,
        store: Store,
        now: Arc<Mutex<NaiveDateTime>>,
    }

    impl Harness {
        async fn new(label: &str) -> Self {
            let store = Store::with_options(&scratch_dir(label), StorageConfig::default())
                .await
                .unwrap();
            let now = Arc::new(Mutex::new(at(2024, 3, 1, 10)));
            let clock_now = Arc::clone(&now);
            let service = JsonLibraryService::with_clock(
                store.clone(),
                LoanConfig::default(),
                Arc::new(move || *clock_now.lock().unwrap()),
            );
            Self { service, store, now }
        }

        fn set_now(&self, value: NaiveDateTime) {
            *self.now.lock().unwrap() = value;
        }
    }

    fn admin() -> Session {
        Session::new(Username::from("admin"), Role::Admin)
    }

    fn member(name: &str) -> Session {
        Session::new(Username::from(name), Role::User)
    }

    #[tokio::test]
    async fn catalog_lists_seed_books_in_id_order() {
        let h = Harness::new("catalog").await;
        let ids: Vec<String> = h
            .service
            .catalog()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.book_id.to_string())
            .collect();
        assert_eq!(ids, ["B001", "B002", "B003", "B004", "B005"]);
    }

    #[tokio::test]
    async fn borrow_sets_fourteen_day_due_date() {
        let h = Harness::new("borrow").await;
        let receipt = h.service.borrow(&member("alice"), "B001").await.unwrap();

        assert_eq!(receipt.title, "To Kill a Mockingbird");
        assert_eq!(receipt.issue_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(receipt.due_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(!h.store.get_book("B001").await.unwrap().unwrap().available);
    }

    #[tokio::test]
    async fn second_borrow_of_same_book_is_rejected() {
        let h = Harness::new("twice").await;
        h.service.borrow(&member("alice"), "B002").await.unwrap();

        let err = h.service.borrow(&member("bob"), "B002").await.unwrap_err();
        assert!(matches!(err, LibraryError::Unavailable(_)));
        assert!(h.store.issues_for("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_book_cannot_be_borrowed() {
        let h = Harness::new("unknown").await;
        let err = h.service.borrow(&member("alice"), "Z999").await.unwrap_err();
        assert!(matches!(err, LibraryError::UnknownBook(_)));
    }

    #[tokio::test]
    async fn my_loans_reports_overdue_until_returned() {
        let h = Harness::new("myloans").await;
        h.service.borrow(&member("alice"), "B003").await.unwrap();

        h.set_now(at(2024, 3, 20, 9));
        let loans = h.service.my_loans(&member("alice")).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert!(loans[0].overdue);
        assert!(!loans[0].returned);

        h.service.return_book(&admin(), "alice", "B003").await.unwrap();
        let loans = h.service.my_loans(&member("alice")).await.unwrap();
        assert!(loans[0].returned);
        assert!(!loans[0].overdue);
        assert_eq!(loans[0].fine, Some(25));
    }

    #[tokio::test]
    async fn on_time_return_has_no_fine() {
        let h = Harness::new("ontime").await;
        h.service.borrow(&member("alice"), "B001").await.unwrap();

        h.set_now(at(2024, 3, 10, 18));
        let summary = h.service.return_book(&admin(), "alice", "B001").await.unwrap();
        assert_eq!(summary.fine, 0);
        assert!(h.store.get_book("B001").await.unwrap().unwrap().available);
    }

    #[tokio::test]
    async fn late_return_charges_per_whole_day() {
        let h = Harness::new("late").await;
        h.service.borrow(&member("alice"), "B004").await.unwrap();

        h.set_now(at(2024, 3, 25, 12));
        let summary = h.service.return_book(&admin(), "alice", "B004").await.unwrap();
        assert_eq!(summary.fine, 50);
        assert_eq!(summary.return_date, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
    }

    #[tokio::test]
    async fn returning_twice_is_rejected() {
        let h = Harness::new("again").await;
        h.service.borrow(&member("alice"), "B005").await.unwrap();
        h.service.return_book(&admin(), "alice", "B005").await.unwrap();

        let err = h
            .service
            .return_book(&admin(), "alice", "B005")
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::AlreadyReturned { .. }));
    }

    #[tokio::test]
    async fn admin_operations_are_forbidden_for_members() {
        let h = Harness::new("forbidden").await;
        let alice = member("alice");

        assert!(matches!(
            h.service.open_loans(&alice).await,
            Err(LibraryError::Forbidden(_))
        ));
        assert!(matches!(
            h.service.return_book(&alice, "alice", "B001").await,
            Err(LibraryError::Forbidden(_))
        ));
        assert!(matches!(
            h.service.add_book(&alice, NewBook::default()).await,
            Err(LibraryError::Forbidden(_))
        ));
        assert!(matches!(
            h.service.reconcile(&alice).await,
            Err(LibraryError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn add_book_rejects_blanks_and_duplicates() {
        let h = Harness::new("addbook").await;
        let book = NewBook {
            book_id: "B006".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Science Fiction".to_string(),
        };

        let entry = h.service.add_book(&admin(), book.clone()).await.unwrap();
        assert!(entry.available);

        assert!(matches!(
            h.service.add_book(&admin(), book.clone()).await,
            Err(LibraryError::DuplicateBook(_))
        ));

        let blank = NewBook {
            genre: "  ".to_string(),
            book_id: "B007".to_string(),
            ..book
        };
        assert!(matches!(
            h.service.add_book(&admin(), blank).await,
            Err(LibraryError::Validation(_))
        ));
        assert!(h.store.get_book("B007").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_loans_lists_only_unreturned() {
        let h = Harness::new("open").await;
        h.service.borrow(&member("alice"), "B001").await.unwrap();
        h.service.borrow(&member("bob"), "B002").await.unwrap();
        h.service.return_book(&admin(), "alice", "B001").await.unwrap();

        let open = h.service.open_loans(&admin()).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].username.as_str(), "bob");
        assert_eq!(open[0].title, "1984");
    }
}

//! JSON document store.
//!
//! Every collection is one file under the data directory, read whole into
//! memory, mutated, and written whole back. Writes go to a sibling temp file
//! first and are renamed over the target.

use crate::config::{Config, StorageConfig};
use crate::domain::{BookId, Username};
use crate::models::{BookRecord, Books, IssueRecord, Issues, UserRecord, Users};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod repositories;

pub use repositories::circulation::{CirculationError, OpenLoan, ReturnReceipt};

/// Default administrator seeded on first run.
pub const SEED_ADMIN: (&str, &str) = ("admin", "admin123");

const SEED_BOOKS: [(&str, &str, &str, &str); 5] = [
    ("B001", "To Kill a Mockingbird", "Harper Lee", "Classic"),
    ("B002", "1984", "George Orwell", "Dystopian"),
    ("B003", "The Hobbit", "J.R.R. Tolkien", "Fantasy"),
    ("B004", "Pride and Prejudice", "Jane Austen", "Romance"),
    ("B005", "The Alchemist", "Paulo Coelho", "Fiction"),
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt collection file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {collection}: {source}")]
    Encode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
}

/// The on-disk collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Books,
    Issues,
    History,
}

impl Collection {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Users => "users.json",
            Self::Books => "books.json",
            Self::Issues => "issues.json",
            Self::History => "history.json",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Raw file access shared by the repositories.
#[derive(Debug, Clone)]
pub struct DataFiles {
    dir: PathBuf,
    options: StorageConfig,
}

impl DataFiles {
    #[must_use]
    pub const fn new(dir: PathBuf, options: StorageConfig) -> Self {
        Self { dir, options }
    }

    #[must_use]
    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Reads a whole collection.
    ///
    /// A missing file is an empty collection. An unreadable or unparsable file
    /// is also treated as empty unless `strict_load` is set.
    pub async fn load<T>(&self, collection: Collection) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(collection);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Collection file missing, using empty collection");
                return Ok(T::default());
            }
            Err(source) => {
                if self.options.strict_load {
                    return Err(StoreError::Io { path, source });
                }
                warn!(path = %path.display(), error = %source, "Failed to read collection, using empty collection");
                return Ok(T::default());
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(value),
            Err(source) => {
                if self.options.strict_load {
                    return Err(StoreError::Corrupt { path, source });
                }
                warn!(path = %path.display(), error = %source, "Failed to parse collection, using empty collection");
                Ok(T::default())
            }
        }
    }

    /// Replaces a whole collection on disk.
    pub async fn save<T>(&self, collection: Collection, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let path = self.path(collection);

        let encoded = if self.options.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|source| StoreError::Encode { collection, source })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &encoded)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = encoded.len(), "Collection saved");
        Ok(())
    }

    async fn exists(&self, collection: Collection) -> bool {
        tokio::fs::try_exists(self.path(collection))
            .await
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    files: DataFiles,
}

impl Store {
    /// Opens the store described by `config`, creating and seeding the data
    /// directory on first run.
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        Self::with_options(&config.data_dir(), config.storage.clone()).await
    }

    pub async fn with_options(dir: &Path, options: StorageConfig) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let store = Self {
            files: DataFiles::new(dir.to_path_buf(), options),
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Writes the seed admin, sample catalog and empty issue table for any
    /// collection file that does not exist yet.
    async fn initialize(&self) -> Result<(), StoreError> {
        if !self.files.exists(Collection::Users).await {
            let mut users = Users::new();
            users.insert(Username::from(SEED_ADMIN.0), UserRecord::admin(SEED_ADMIN.1));
            self.files.save(Collection::Users, &users).await?;
            info!("Seeded users with default administrator");
        }

        if !self.files.exists(Collection::Books).await {
            let books: Books = SEED_BOOKS
                .iter()
                .map(|(id, title, author, genre)| {
                    (BookId::from(*id), BookRecord::new(title, author, genre))
                })
                .collect();
            self.files.save(Collection::Books, &books).await?;
            info!(count = books.len(), "Seeded sample catalog");
        }

        if !self.files.exists(Collection::Issues).await {
            self.files.save(Collection::Issues, &Issues::new()).await?;
        }

        Ok(())
    }

    #[must_use]
    pub const fn files(&self) -> &DataFiles {
        &self.files
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.files.clone())
    }

    fn book_repo(&self) -> repositories::book::BookRepository {
        repositories::book::BookRepository::new(self.files.clone())
    }

    fn circulation_repo(&self) -> repositories::circulation::CirculationRepository {
        repositories::circulation::CirculationRepository::new(self.files.clone())
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        self.user_repo().get(username).await
    }

    pub async fn list_users(&self) -> Result<Users, StoreError> {
        self.user_repo().list().await
    }

    /// Inserts a new user. Returns `false` and leaves the file untouched if the
    /// name is taken.
    pub async fn add_user(
        &self,
        username: &Username,
        record: UserRecord,
    ) -> Result<bool, StoreError> {
        self.user_repo().insert(username, record).await
    }

    pub async fn list_books(&self) -> Result<Books, StoreError> {
        self.book_repo().list().await
    }

    pub async fn get_book(&self, id: &str) -> Result<Option<BookRecord>, StoreError> {
        self.book_repo().get(id).await
    }

    /// Inserts a new book. Returns `false` and leaves the file untouched if the
    /// id is taken.
    pub async fn add_book(&self, id: &BookId, record: BookRecord) -> Result<bool, StoreError> {
        self.book_repo().insert(id, record).await
    }

    pub async fn borrow_book(
        &self,
        username: &Username,
        book_id: &BookId,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<IssueRecord, CirculationError> {
        self.circulation_repo()
            .borrow(username, book_id, issue_date, due_date)
            .await
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
        self.circulation_repo()
            .return_book(username, book_id, returned_on, fine_for)
            .await
    }

    pub async fn issues_for(
        &self,
        username: &str,
    ) -> Result<BTreeMap<BookId, IssueRecord>, StoreError> {
        self.circulation_repo().for_user(username).await
    }

    pub async fn open_loans(&self) -> Result<Vec<OpenLoan>, StoreError> {
        self.circulation_repo().open_loans().await
    }

    pub async fn archived_issues(&self) -> Result<crate::models::History, StoreError> {
        self.circulation_repo().history().await
    }

    /// Recomputes every book's `available` flag from open issues.
    /// Returns the ids whose flag changed.
    pub async fn reconcile_availability(&self) -> Result<Vec<BookId>, StoreError> {
        self.circulation_repo().reconcile().await
    }
}

use crate::db::{Collection, DataFiles, StoreError};
use crate::domain::BookId;
use crate::models::{BookRecord, Books};
use tracing::info;

/// Repository for `books.json`
pub struct BookRepository {
    files: DataFiles,
}

impl BookRepository {
    #[must_use]
    pub const fn new(files: DataFiles) -> Self {
        Self { files }
    }

    pub async fn list(&self) -> Result<Books, StoreError> {
        self.files.load(Collection::Books).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<BookRecord>, StoreError> {
        let mut books = self.list().await?;
        Ok(books.remove(id))
    }

    pub async fn insert(&self, id: &BookId, record: BookRecord) -> Result<bool, StoreError> {
        let mut books = self.list().await?;
        if books.contains_key(id) {
            return Ok(false);
        }

        info!(book_id = %id, title = %record.title, "Added book");
        books.insert(id.clone(), record);
        self.files.save(Collection::Books, &books).await?;
        Ok(true)
    }
}

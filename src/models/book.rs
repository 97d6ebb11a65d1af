use crate::domain::BookId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `books.json`: book id to catalog entry.
pub type Books = BTreeMap<BookId, BookRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub available: bool,
}

impl BookRecord {
    #[must_use]
    pub fn new(title: &str, author: &str, genre: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            available: true,
        }
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        if self.available { "Available" } else { "Borrowed" }
    }
}

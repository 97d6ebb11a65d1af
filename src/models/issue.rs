use crate::domain::{BookId, Username};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Contents of `issues.json`: username to book id to the latest issue of that book.
pub type Issues = BTreeMap<Username, BTreeMap<BookId, IssueRecord>>;

/// Contents of `history.json`: closed issues displaced by a later borrow.
pub type History = Vec<ArchivedIssue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub returned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine: Option<u32>,
}

impl IssueRecord {
    #[must_use]
    pub const fn open(issue_date: NaiveDate, due_date: NaiveDate) -> Self {
        Self {
            issue_date,
            due_date,
            returned: false,
            return_date: None,
            fine: None,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.returned
    }

    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && today > self.due_date
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        if self.returned { "Returned" } else { "Borrowed" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedIssue {
    pub id: Uuid,
    pub username: Username,
    pub book_id: BookId,
    #[serde(flatten)]
    pub record: IssueRecord,
    pub archived_at: DateTime<Utc>,
}

impl ArchivedIssue {
    #[must_use]
    pub fn new(username: Username, book_id: BookId, record: IssueRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            book_id,
            record,
            archived_at: Utc::now(),
        }
    }
}

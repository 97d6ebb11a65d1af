pub mod book;
pub mod issue;
pub mod user;

pub use book::{BookRecord, Books};
pub use issue::{ArchivedIssue, History, IssueRecord, Issues};
pub use user::{UserRecord, Users};

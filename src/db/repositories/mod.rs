pub mod book;
pub mod circulation;
pub mod user;

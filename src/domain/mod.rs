//! Domain types for library circulation with strong typing.
//!
//! Identifiers are newtypes so a book id can never be passed where a username
//! is expected. [`Session`] is the authenticated caller handed to every
//! operation that acts on behalf of a user.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Catalog key of a book, e.g. `B001`.
///
/// # Examples
///
/// ```rust
/// use libris::domain::BookId;
///
/// let id = BookId::new("B001");
/// assert_eq!(id.as_str(), "B001");
/// assert_eq!(id.to_string(), "B001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for BookId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Unique account name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::User => f.write_str("user"),
        }
    }
}

/// The logged-in caller. Produced by a successful login and passed explicitly
/// to every operation; there is no process-wide current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: Username,
    pub role: Role,
}

impl Session {
    #[must_use]
    pub const fn new(username: Username, role: Role) -> Self {
        Self { username, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

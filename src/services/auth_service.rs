//! Domain service for accounts: registration and login.

use crate::db::StoreError;
use crate::domain::{Role, Session, Username};
use std::path::PathBuf;
use thiserror::Error;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Username already exists: {0}")]
    UsernameTaken(Username),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input for [`AuthService::register`].
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Picture to copy into the profiles directory.
    pub profile_pic: Option<PathBuf>,
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub profile_pic: Option<PathBuf>,
    /// Set when a picture was supplied but could not be stored. The account
    /// is created regardless.
    pub picture_error: Option<String>,
}

/// Public view of an account.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub username: Username,
    pub role: Role,
    pub profile_pic: Option<PathBuf>,
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a regular user account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for blank fields and
    /// [`AuthError::UsernameTaken`] for duplicates; the user table is left
    /// unchanged in both cases.
    async fn register(&self, request: RegisterRequest) -> Result<Registration, AuthError>;

    /// Checks credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError>;

    /// Account details of the session's user.
    async fn profile(&self, session: &Session) -> Result<UserProfile, AuthError>;
}

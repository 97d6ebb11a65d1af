use crate::domain::{Role, Username};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `users.json`: username to account.
pub type Users = BTreeMap<Username, UserRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Plaintext, or an Argon2 PHC string when password hashing is enabled.
    pub password: String,
    /// Path of the stored profile picture, empty when none was saved.
    #[serde(default)]
    pub profile_pic: String,
    #[serde(default)]
    pub role: Role,
}

impl UserRecord {
    #[must_use]
    pub fn admin(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            profile_pic: String::new(),
            role: Role::Admin,
        }
    }

    #[must_use]
    pub fn has_profile_pic(&self) -> bool {
        !self.profile_pic.is_empty()
    }
}

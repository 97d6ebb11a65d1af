use crate::db::{Collection, DataFiles, StoreError};
use crate::domain::Username;
use crate::models::{UserRecord, Users};
use tracing::info;

/// Repository for `users.json`
pub struct UserRepository {
    files: DataFiles,
}

impl UserRepository {
    #[must_use]
    pub const fn new(files: DataFiles) -> Self {
        Self { files }
    }

    pub async fn list(&self) -> Result<Users, StoreError> {
        self.files.load(Collection::Users).await
    }

    pub async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.list().await?;
        Ok(users.remove(username))
    }

    pub async fn insert(&self, username: &Username, record: UserRecord) -> Result<bool, StoreError> {
        let mut users = self.list().await?;
        if users.contains_key(username) {
            return Ok(false);
        }

        let role = record.role;
        users.insert(username.clone(), record);
        self.files.save(Collection::Users, &users).await?;
        info!(username = %username, role = %role, "Added user");
        Ok(true)
    }
}

//! JSON-store implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::{Role, Session, Username};
use crate::models::UserRecord;
use crate::services::auth_service::{
    AuthError, AuthService, RegisterRequest, Registration, UserProfile,
};
use crate::services::image::ProfileImageService;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::task;
use tracing::{info, warn};

pub struct JsonAuthService {
    store: Store,
    images: ProfileImageService,
    security: SecurityConfig,
}

impl JsonAuthService {
    #[must_use]
    pub const fn new(store: Store, images: ProfileImageService, security: SecurityConfig) -> Self {
        Self {
            store,
            images,
            security,
        }
    }

    async fn stored_password(&self, password: &str) -> Result<String, AuthError> {
        if !self.security.hash_passwords {
            return Ok(password.to_string());
        }

        let password = password.to_string();
        let config = self.security.clone();
        task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
    }
}

#[async_trait]
impl AuthService for JsonAuthService {
    async fn register(&self, request: RegisterRequest) -> Result<Registration, AuthError> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        if request.username.contains(['/', '\\']) {
            return Err(AuthError::Validation(
                "Username cannot contain path separators".to_string(),
            ));
        }

        let username = Username::new(request.username);

        if self.store.get_user(username.as_str()).await?.is_some() {
            return Err(AuthError::UsernameTaken(username));
        }

        let mut profile_pic = None;
        let mut picture_error = None;
        if let Some(source) = &request.profile_pic {
            match self.images.save_profile_picture(&username, source).await {
                Ok(path) => profile_pic = Some(path),
                Err(e) => {
                    warn!(username = %username, error = %e, "Failed to save profile picture");
                    picture_error = Some(format!("{e:#}"));
                }
            }
        }

        let record = UserRecord {
            password: self.stored_password(&request.password).await?,
            profile_pic: profile_pic
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            role: Role::User,
        };

        if !self.store.add_user(&username, record).await? {
            return Err(AuthError::UsernameTaken(username));
        }

        info!(username = %username, "Registered user");
        Ok(Registration {
            username,
            profile_pic,
            picture_error,
        })
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let Some(user) = self.store.get_user(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored = user.password.clone();
        let candidate = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password(&candidate, &stored))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Session::new(Username::from(username), user.role))
    }

    async fn profile(&self, session: &Session) -> Result<UserProfile, AuthError> {
        let user = self
            .store
            .get_user(session.username.as_str())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(UserProfile {
            username: session.username.clone(),
            role: user.role,
            profile_pic: user.has_profile_pic().then(|| PathBuf::from(&user.profile_pic)),
        })
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {e}")))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Checks `candidate` against a stored password, which is either an Argon2
/// PHC string or plaintext from accounts created without hashing.
#[must_use]
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    if stored.starts_with("$argon2") {
        return PasswordHash::new(stored).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
        });
    }

    candidate == stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("libris-auth-{label}-{}", uuid::Uuid::new_v4()))
    }

    async fn service(label: &str, security: SecurityConfig) -> (JsonAuthService, Store) {
        let dir = scratch_dir(label);
        let store = Store::with_options(&dir, StorageConfig::default())
            .await
            .unwrap();
        let images = ProfileImageService::new(dir.join("profiles"));
        (JsonAuthService::new(store.clone(), images, security), store)
    }

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            profile_pic: None,
        }
    }

    #[tokio::test]
    async fn seeded_admin_can_log_in() {
        let (auth, _) = service("admin", SecurityConfig::default()).await;
        let session = auth.login("admin", "admin123").await.unwrap();
        assert!(session.is_admin());
        assert_eq!(session.username.as_str(), "admin");
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_is_rejected() {
        let (auth, _) = service("badlogin", SecurityConfig::default()).await;
        assert!(matches!(
            auth.login("admin", "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ghost", "admin123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_then_login_as_regular_user() {
        let (auth, store) = service("register", SecurityConfig::default()).await;
        let registration = auth.register(request("alice", "pw")).await.unwrap();
        assert_eq!(registration.username.as_str(), "alice");
        assert!(registration.profile_pic.is_none());

        let stored = store.get_user("alice").await.unwrap().unwrap();
        assert_eq!(stored.password, "pw");
        assert_eq!(stored.role, Role::User);

        let session = auth.login("alice", "pw").await.unwrap();
        assert!(!session.is_admin());
    }

    #[tokio::test]
    async fn duplicate_username_leaves_users_unchanged() {
        let (auth, store) = service("dup", SecurityConfig::default()).await;
        auth.register(request("alice", "pw")).await.unwrap();
        let before = store.list_users().await.unwrap();

        let err = auth.register(request("alice", "other")).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(_)));
        assert_eq!(store.list_users().await.unwrap(), before);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let (auth, store) = service("blank", SecurityConfig::default()).await;
        assert!(matches!(
            auth.register(request("", "pw")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.register(request("bob", "")).await,
            Err(AuthError::Validation(_))
        ));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn broken_picture_does_not_block_registration() {
        let (auth, store) = service("pic", SecurityConfig::default()).await;
        let mut req = request("dave", "pw");
        req.profile_pic = Some(PathBuf::from("/definitely/not/here.png"));

        let registration = auth.register(req).await.unwrap();
        assert!(registration.profile_pic.is_none());
        assert!(registration.picture_error.is_some());

        let stored = store.get_user("dave").await.unwrap().unwrap();
        assert!(!stored.has_profile_pic());
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let security = SecurityConfig {
            hash_passwords: true,
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let (auth, store) = service("hash", security).await;
        auth.register(request("erin", "secret")).await.unwrap();

        let stored = store.get_user("erin").await.unwrap().unwrap();
        assert!(stored.password.starts_with("$argon2id$"));
        assert!(auth.login("erin", "secret").await.is_ok());
        assert!(auth.login("erin", "wrong").await.is_err());
    }

    #[test]
    fn plaintext_passwords_compare_exactly() {
        assert!(verify_password("admin123", "admin123"));
        assert!(!verify_password("Admin123", "admin123"));
    }
}

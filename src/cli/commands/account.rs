use crate::cli::Credentials;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, RegisterRequest};
use std::path::PathBuf;

use super::{auth_service, login};

pub async fn cmd_register(
    config: &Config,
    username: &str,
    password: &str,
    picture: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let auth = auth_service(config, store);

    let request = RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        profile_pic: picture,
    };

    match auth.register(request).await {
        Ok(registration) => {
            if let Some(error) = &registration.picture_error {
                println!("⚠ Profile picture not saved: {error}");
            }
            if let Some(path) = &registration.profile_pic {
                println!("Profile picture: {}", path.display());
            }
            println!("✓ Registration successful for {}", registration.username);
            Ok(())
        }
        Err(AuthError::UsernameTaken(name)) => {
            println!("Username already exists: {name}");
            Ok(())
        }
        Err(AuthError::Validation(message)) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_whoami(config: &Config, credentials: Credentials<'_>) -> anyhow::Result<()> {
    let store = Store::open(config).await?;
    let session = login(config, &store, credentials).await?;
    let profile = auth_service(config, store).profile(&session).await?;

    println!("Account");
    println!("{:-<60}", "");
    println!("Username: {}", profile.username);
    println!("Role:     {}", profile.role);
    println!(
        "Picture:  {}",
        profile
            .profile_pic
            .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
    );

    Ok(())
}

//! Authentication and account bootstrap

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult},
    models::user::{Capability, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check credentials; `None` for an unknown user, a bad password or an inactive account
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let Some(user) = self.repository.users.find_by_username(username).await? else {
            return Ok(None);
        };

        if !user.is_active || !verify_password(&user.password_hash, password)? {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Active user behind a session
    pub async fn get_active(&self, id: i32) -> AppResult<Option<User>> {
        let user = self.repository.users.find_by_id(id).await?;
        Ok(user.filter(|u| u.is_active))
    }

    /// Create the configured librarian account unless it already exists
    pub async fn ensure_librarian(&self, username: &str, password: &str) -> AppResult<()> {
        if self.repository.users.find_by_username(username).await?.is_some() {
            tracing::debug!("Librarian account '{}' already present", username);
            return Ok(());
        }

        let hash = hash_password(password)?;
        let user = self.repository.users.create(username, &hash).await?;
        self.repository
            .users
            .grant(user.id, Capability::CanMarkReturned.codename())
            .await?;

        tracing::info!("Created librarian account '{}'", username);
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

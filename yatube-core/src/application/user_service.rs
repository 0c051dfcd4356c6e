use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::form::{FieldErrors, REQUIRED};
use crate::domain::user::{AuthenticatedUser, User};

const USERNAME_MAX: usize = 150;

/// Gate for write paths: anonymous requests never reach the handlers.
pub fn require_identity(
    viewer: Option<&AuthenticatedUser>,
) -> Result<&AuthenticatedUser, DomainError> {
    viewer.ok_or(DomainError::Unauthorized)
}

/// Read access to the user directory plus the account administration the
/// CLI needs.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    /// Resolves a username into the identity a request would carry.
    pub async fn identity(&self, username: &str) -> Result<AuthenticatedUser, DomainError> {
        Ok(AuthenticatedUser::from(&self.get_by_username(username).await?))
    }

    #[instrument(skip(self))]
    pub async fn create_user(&self, username: &str) -> Result<User, DomainError> {
        let username = username.trim();
        let mut errors = FieldErrors::default();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX} characters."),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        self.repo.create(User::new(username.to_string())).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<(), DomainError> {
        let user = self.get_by_username(username).await?;
        self.repo.delete(user.id).await?;
        Ok(())
    }
}

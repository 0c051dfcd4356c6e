use std::sync::Arc;

use tracing::{debug, instrument};

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{AuthenticatedUser, User};

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    async fn author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    /// Subscribes `follower` to `author_username`. Following yourself is
    /// skipped without error. Returns whether a new edge was stored.
    #[instrument(skip(self, follower), fields(follower = %follower.username))]
    pub async fn follow(
        &self,
        author_username: &str,
        follower: &AuthenticatedUser,
    ) -> Result<bool, DomainError> {
        let author = self.author(author_username).await?;
        if author.id == follower.id {
            debug!("self-follow ignored");
            return Ok(false);
        }
        self.follows.insert(follower.id, author.id).await
    }

    /// Returns whether an edge was removed; a missing edge is not an error.
    #[instrument(skip(self, follower), fields(follower = %follower.username))]
    pub async fn unfollow(
        &self,
        author_username: &str,
        follower: &AuthenticatedUser,
    ) -> Result<bool, DomainError> {
        let author = self.author(author_username).await?;
        self.follows.delete(follower.id, author.id).await
    }

    pub async fn is_following(
        &self,
        viewer: Option<&AuthenticatedUser>,
        author: &User,
    ) -> Result<bool, DomainError> {
        match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follows.exists(viewer.id, author.id).await
            }
            _ => Ok(false),
        }
    }
}

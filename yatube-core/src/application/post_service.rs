use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { repo, comments }
    }

    pub async fn find_post(&self, id: i64) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// The post with its comments, oldest comment first.
    pub async fn get_post(&self, id: i64) -> Result<PostDetail, DomainError> {
        let post = self.find_post(id).await?;
        let comments = self.comments.list_for_post(id).await?;
        Ok(PostDetail { post, comments })
    }

    /// Deletes the post and, with it, all of its comments.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: i64) -> Result<(), DomainError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::PostNotFound(id))
        }
    }
}

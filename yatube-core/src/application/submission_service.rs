use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::form::{CleanPost, CommentForm, FieldErrors, INVALID_CHOICE, PostForm};
use crate::domain::post::{NewPost, Post, PostChanges};
use crate::domain::user::AuthenticatedUser;
use crate::infrastructure::media::MediaStorage;

/// Where the caller should send the user after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum Redirect {
    Profile { username: String },
    PostDetail { post_id: i64 },
}

/// Result of a form submission. Validation failures are ordinary outcomes,
/// not errors: the form comes back so it can be shown again with messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T, F> {
    Accepted { value: T, redirect: Redirect },
    Rejected { form: F, errors: FieldErrors },
}

impl<T, F> Submission<T, F> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted { .. })
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Submission::Accepted { value, .. } => Some(value),
            Submission::Rejected { .. } => None,
        }
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            Submission::Accepted { .. } => None,
            Submission::Rejected { errors, .. } => Some(errors),
        }
    }
}

pub type PostSubmission = Submission<Post, PostForm>;
pub type CommentSubmission = Submission<Comment, CommentForm>;

/// Write side for posts and comments. Authorship is always taken from the
/// requesting identity, never from submitted fields.
#[derive(Clone)]
pub struct SubmissionService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
    media: MediaStorage,
}

impl SubmissionService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
        media: MediaStorage,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
            media,
        }
    }

    /// Field validation plus the group lookup, merged into one error set.
    async fn clean_post(
        &self,
        form: &PostForm,
    ) -> Result<Result<CleanPost, FieldErrors>, DomainError> {
        let (clean, mut errors) = match form.validate() {
            Ok(clean) => (Some(clean), FieldErrors::default()),
            Err(errors) => (None, errors),
        };
        if let Some(group_id) = form.group {
            if self.groups.find_by_id(group_id).await?.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
        }
        Ok(match clean {
            Some(clean) if errors.is_empty() => Ok(clean),
            _ => Err(errors),
        })
    }

    async fn store_image(&self, clean: &CleanPost) -> Result<Option<String>, DomainError> {
        match &clean.image {
            Some(upload) => self.media.save(upload).await.map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, form, author), fields(author = %author.username))]
    pub async fn create_post(
        &self,
        form: PostForm,
        author: &AuthenticatedUser,
    ) -> Result<PostSubmission, DomainError> {
        let clean = match self.clean_post(&form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(Submission::Rejected { form, errors }),
        };

        let image = self.store_image(&clean).await?;
        let created = self
            .posts
            .create(NewPost {
                text: clean.text,
                author_id: author.id,
                group_id: clean.group_id,
                image: image.clone(),
            })
            .await;

        let post = match created {
            Ok(post) => post,
            Err(e) => {
                if let Some(path) = image {
                    self.media.remove(&path).await;
                }
                return Err(e);
            }
        };

        info!(post_id = post.id, "post submitted");
        Ok(Submission::Accepted {
            value: post,
            redirect: Redirect::Profile {
                username: author.username.clone(),
            },
        })
    }

    /// Form pre-filled with the stored values, for the edit page.
    pub async fn edit_form(&self, post_id: i64) -> Result<PostForm, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        Ok(PostForm::from_post(&post))
    }

    /// Applies an edit. The editor becomes the stored author of the post;
    /// id and publication date never change.
    #[instrument(skip(self, form, editor), fields(editor = %editor.username))]
    pub async fn edit_post(
        &self,
        post_id: i64,
        form: PostForm,
        editor: &AuthenticatedUser,
    ) -> Result<PostSubmission, DomainError> {
        let existing = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;

        let clean = match self.clean_post(&form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(Submission::Rejected { form, errors }),
        };

        if existing.author_id != editor.id {
            warn!(post_id, previous_author = %existing.author_id, "post re-attributed to editor");
        }

        let image = self.store_image(&clean).await?;
        let updated = self
            .posts
            .update(
                post_id,
                PostChanges {
                    text: clean.text,
                    author_id: editor.id,
                    group_id: clean.group_id,
                    image: image.clone(),
                },
            )
            .await;

        let post = match updated {
            Ok(Some(post)) => post,
            other => {
                if let Some(path) = image {
                    self.media.remove(&path).await;
                }
                return Err(other.err().unwrap_or(DomainError::PostNotFound(post_id)));
            }
        };

        Ok(Submission::Accepted {
            value: post,
            redirect: Redirect::PostDetail { post_id },
        })
    }

    #[instrument(skip(self, form, author), fields(author = %author.username))]
    pub async fn add_comment(
        &self,
        post_id: i64,
        form: CommentForm,
        author: &AuthenticatedUser,
    ) -> Result<CommentSubmission, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }

        let text = match form.validate() {
            Ok(text) => text,
            Err(errors) => return Ok(Submission::Rejected { form, errors }),
        };

        let comment = self
            .comments
            .create(NewComment {
                post_id,
                author_id: author.id,
                text,
            })
            .await?;

        Ok(Submission::Accepted {
            value: comment,
            redirect: Redirect::PostDetail { post_id },
        })
    }
}

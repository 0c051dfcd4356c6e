use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::comment_repository::CommentRepository;
use super::follow_repository::FollowRepository;
use super::group_repository::{GroupRepository, duplicate_group};
use super::post_repository::PostRepository;
use super::user_repository::UserRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{NewPost, Post, PostChanges, PostFilter};
use crate::domain::user::User;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: BTreeSet<Follow>,
    last_group_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl State {
    fn foreign_key(&self, post: &NewPost) -> Result<(), DomainError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(fk_violation("posts_author_id_fkey"));
        }
        if let Some(group_id) = post.group_id {
            if !self.groups.contains_key(&group_id) {
                return Err(fk_violation("posts_group_id_fkey"));
            }
        }
        Ok(())
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&Follow {
                user_id,
                author_id: post.author_id,
            }),
        }
    }

    fn remove_post(&mut self, id: i64) -> bool {
        let removed = self.posts.remove(&id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != id);
        }
        removed
    }
}

fn fk_violation(constraint: &str) -> DomainError {
    DomainError::Internal(format!("foreign key violation: {constraint}"))
}

/// In-memory store for development and tests. Enforces the same uniqueness
/// and cascade rules as the SQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        state.users.insert(user.id, user.clone());
        debug!("Created user: {} with id {}", user.username, user.id);
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        let authored: Vec<i64> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            state.remove_post(post_id);
        }
        state.comments.retain(|_, c| c.author_id != id);
        state.follows.retain(|f| f.user_id != id && f.author_id != id);
        debug!("Deleted user {}", id);
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        let mut state = self.state.lock().await;
        if group.title.is_some() && state.groups.values().any(|g| g.title == group.title) {
            return Err(duplicate_group("title"));
        }
        if state.groups.values().any(|g| g.slug == group.slug) {
            return Err(duplicate_group("slug"));
        }
        state.last_group_id += 1;
        let group = Group {
            id: state.last_group_id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        state.groups.insert(group.id, group.clone());
        debug!("Created group: {} with id {}", group.slug, group.id);
        Ok(group)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        Ok(self.state.lock().await.groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.state.lock().await.groups.values().cloned().collect())
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        let Some(id) = state.groups.values().find(|g| g.slug == slug).map(|g| g.id) else {
            return Ok(false);
        };
        state.groups.remove(&id);
        for post in state.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        debug!("Deleted group {}", slug);
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.lock().await;
        state.foreign_key(&post)?;
        state.last_post_id += 1;
        let post = Post {
            id: state.last_post_id,
            text: post.text,
            pub_date: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        state.posts.insert(post.id, post.clone());
        debug!("Created post {} by {}", post.id, post.author_id);
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, DomainError> {
        let mut state = self.state.lock().await;
        state.foreign_key(&NewPost {
            text: String::new(),
            author_id: changes.author_id,
            group_id: changes.group_id,
            image: None,
        })?;
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        post.author_id = changes.author_id;
        if let Some(image) = changes.image {
            post.image = Some(image);
        }
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state.lock().await.remove_post(id))
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, DomainError> {
        let state = self.state.lock().await;
        Ok(state.posts.values().filter(|p| state.matches(p, filter)).count() as u64)
    }

    async fn list(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let state = self.state.lock().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| state.matches(p, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(fk_violation("comments_post_id_fkey"));
        }
        if !state.users.contains_key(&comment.author_id) {
            return Err(fk_violation("comments_author_id_fkey"));
        }
        state.last_comment_id += 1;
        let comment = Comment {
            id: state.last_comment_id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: Utc::now(),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user_id) || !state.users.contains_key(&author_id) {
            return Err(fk_violation("follows_user_fkey"));
        }
        Ok(state.follows.insert(Follow { user_id, author_id }))
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        Ok(state.follows.remove(&Follow { user_id, author_id }))
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let state = self.state.lock().await;
        Ok(state.follows.contains(&Follow { user_id, author_id }))
    }
}

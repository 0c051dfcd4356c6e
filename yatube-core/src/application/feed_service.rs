use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::follow_service::FollowService;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::page::{Page, PageRequest, Paginator};
use crate::domain::post::{Post, PostFilter};
use crate::domain::user::{AuthenticatedUser, User};
use crate::infrastructure::cache::{FeedCache, IndexKey};

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    /// Total number of posts by the author, across all pages.
    pub count: u64,
    pub page: Page<Post>,
    pub following: bool,
}

/// Read side: paginated, newest-first views over the posts.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: FollowService,
    index_cache: Arc<FeedCache>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        follows: FollowService,
        index_cache: Arc<FeedCache>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            index_cache,
        }
    }

    async fn paginate(
        &self,
        filter: PostFilter,
        request: &PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        let count = self.posts.count(filter).await?;
        let paginator = Paginator::new(count, request.page_size);
        let number = paginator.resolve(request.page.as_deref());
        self.slice(filter, paginator, number).await
    }

    async fn slice(
        &self,
        filter: PostFilter,
        paginator: Paginator,
        number: u64,
    ) -> Result<Page<Post>, DomainError> {
        let items = self
            .posts
            .list(filter, paginator.page_size(), paginator.offset(number))
            .await?;
        Ok(paginator.page(number, items))
    }

    /// All posts. The page number is resolved first and the slice is served
    /// from the index cache while an entry is fresh, so recent writes may not
    /// show up until it expires or is cleared.
    #[instrument(skip(self))]
    pub async fn list_index(&self, request: &PageRequest) -> Result<Page<Post>, DomainError> {
        let count = self.posts.count(PostFilter::All).await?;
        let paginator = Paginator::new(count, request.page_size);
        let key = IndexKey {
            page_size: paginator.page_size(),
            number: paginator.resolve(request.page.as_deref()),
        };
        if let Some(page) = self.index_cache.get(&key) {
            debug!(page = key.number, "index served from cache");
            return Ok(page);
        }
        let page = self.slice(PostFilter::All, paginator, key.number).await?;
        self.index_cache.put(key, page.clone());
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn list_group(
        &self,
        slug: &str,
        request: &PageRequest,
    ) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self.paginate(PostFilter::Group(group.id), request).await?;
        Ok(GroupFeed { group, page })
    }

    #[instrument(skip(self, viewer))]
    pub async fn list_profile(
        &self,
        username: &str,
        request: &PageRequest,
        viewer: Option<&AuthenticatedUser>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;
        let page = self.paginate(PostFilter::Author(author.id), request).await?;
        let following = self.follows.is_following(viewer, &author).await?;
        Ok(ProfileFeed {
            count: page.count,
            author,
            page,
            following,
        })
    }

    /// Posts by the authors `follower` is subscribed to.
    #[instrument(skip(self, follower), fields(follower = %follower.username))]
    pub async fn list_following_feed(
        &self,
        follower: &AuthenticatedUser,
        request: &PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        self.paginate(PostFilter::FollowedBy(follower.id), request)
            .await
    }

    /// Drops every cached index page. Nothing on the write side calls this.
    pub fn clear_cache(&self) {
        self.index_cache.clear();
    }

    pub fn cached_pages(&self) -> usize {
        self.index_cache.len()
    }
}

pub mod feed_service;
pub mod follow_service;
pub mod group_service;
pub mod post_service;
pub mod submission_service;
pub mod user_service;

use std::sync::Arc;

use crate::data::Repositories;
use crate::infrastructure::cache::FeedCache;
use crate::infrastructure::media::MediaStorage;
use feed_service::FeedService;
use follow_service::FollowService;
use group_service::GroupService;
use post_service::PostService;
use submission_service::SubmissionService;
use user_service::UserService;

/// Everything the request layer calls into, built over one set of
/// repositories.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub groups: GroupService,
    pub posts: PostService,
    pub feeds: FeedService,
    pub follows: FollowService,
    pub submissions: SubmissionService,
}

impl Services {
    pub fn new(repos: Repositories, media: MediaStorage, index_cache: FeedCache) -> Self {
        let follows = FollowService::new(Arc::clone(&repos.users), Arc::clone(&repos.follows));
        Self {
            users: UserService::new(Arc::clone(&repos.users)),
            groups: GroupService::new(Arc::clone(&repos.groups)),
            posts: PostService::new(Arc::clone(&repos.posts), Arc::clone(&repos.comments)),
            feeds: FeedService::new(
                Arc::clone(&repos.posts),
                Arc::clone(&repos.groups),
                Arc::clone(&repos.users),
                follows.clone(),
                Arc::new(index_cache),
            ),
            follows,
            submissions: SubmissionService::new(
                Arc::clone(&repos.posts),
                Arc::clone(&repos.groups),
                Arc::clone(&repos.comments),
                media,
            ),
        }
    }
}

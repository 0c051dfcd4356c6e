#![allow(dead_code)]

use std::time::Duration;

use tempfile::TempDir;
use yatube_core::data::memory::InMemoryStore;
use yatube_core::domain::form::{GroupForm, PostForm};
use yatube_core::domain::group::Group;
use yatube_core::domain::post::Post;
use yatube_core::domain::user::AuthenticatedUser;
use yatube_core::infrastructure::cache::FeedCache;
use yatube_core::infrastructure::media::MediaStorage;
use yatube_core::{Repositories, Services};

pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF!\xF9\x04\x00\x00\x00\x00\x00,\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\n\x00;";

pub struct Fixture {
    pub services: Services,
    pub store: InMemoryStore,
    pub media: TempDir,
}

pub fn fixture() -> Fixture {
    build(FeedCache::disabled())
}

pub fn cached_fixture() -> Fixture {
    build(FeedCache::new(Duration::from_secs(300)))
}

fn build(cache: FeedCache) -> Fixture {
    let media = tempfile::tempdir().expect("temp media dir");
    let store = InMemoryStore::new();
    let services = Services::new(
        Repositories::in_memory(store.clone()),
        MediaStorage::new(media.path()),
        cache,
    );
    Fixture {
        services,
        store,
        media,
    }
}

impl Fixture {
    pub async fn user(&self, username: &str) -> AuthenticatedUser {
        let user = self.services.users.create_user(username).await.unwrap();
        AuthenticatedUser::from(&user)
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.services
            .groups
            .create_group(&GroupForm {
                title: format!("Group {slug}"),
                slug: slug.to_string(),
                description: "Test group".into(),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &AuthenticatedUser, text: &str) -> Post {
        self.submit(author, PostForm::new(text)).await
    }

    pub async fn submit(&self, author: &AuthenticatedUser, form: PostForm) -> Post {
        self.services
            .submissions
            .create_post(form, author)
            .await
            .unwrap()
            .accepted()
            .expect("valid post")
    }
}

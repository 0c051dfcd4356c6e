mod common;

use common::fixture;
use yatube_core::DomainError;
use yatube_core::data::follow_repository::FollowRepository;
use yatube_core::domain::form::{CommentForm, GroupForm, PostForm};
use yatube_core::domain::page::PageRequest;

#[tokio::test]
async fn deleting_group_detaches_posts() {
    let f = fixture();
    let author = f.user("author").await;
    let group = f.group("cats").await;
    let post = f.submit(&author, PostForm::new("meow").with_group(group.id)).await;

    f.services.groups.delete_group("cats").await.unwrap();

    let stored = f.services.posts.find_post(post.id).await.unwrap();
    assert_eq!(stored.group_id, None);
    assert_eq!(stored.text, post.text);
    assert!(
        f.services
            .feeds
            .list_group("cats", &PageRequest::default())
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(matches!(
        f.services.groups.delete_group("cats").await,
        Err(DomainError::GroupNotFound(_))
    ));
}

#[tokio::test]
async fn deleting_post_removes_its_comments() {
    let f = fixture();
    let author = f.user("author").await;
    let kept = f.post(&author, "kept").await;
    let doomed = f.post(&author, "doomed").await;
    for post_id in [kept.id, doomed.id] {
        f.services
            .submissions
            .add_comment(post_id, CommentForm::new("comment"), &author)
            .await
            .unwrap();
    }

    f.services.posts.delete_post(doomed.id).await.unwrap();

    assert!(matches!(
        f.services.posts.get_post(doomed.id).await,
        Err(DomainError::PostNotFound(_))
    ));
    assert_eq!(f.services.posts.get_post(kept.id).await.unwrap().comments.len(), 1);
    assert!(f.services.posts.delete_post(doomed.id).await.is_err());
}

#[tokio::test]
async fn deleting_user_removes_their_comments() {
    let f = fixture();
    let author = f.user("author").await;
    let commenter = f.user("commenter").await;
    let post = f.post(&author, "post").await;
    f.services
        .submissions
        .add_comment(post.id, CommentForm::new("bye"), &commenter)
        .await
        .unwrap();

    f.services.users.delete_user("commenter").await.unwrap();

    let detail = f.services.posts.get_post(post.id).await.unwrap();
    assert!(detail.comments.is_empty());
}

#[tokio::test]
async fn follow_is_idempotent() {
    let f = fixture();
    let reader = f.user("reader").await;
    let author = f.user("author").await;
    f.post(&author, "post").await;

    assert!(f.services.follows.follow("author", &reader).await.unwrap());
    assert!(!f.services.follows.follow("author", &reader).await.unwrap());

    // one edge means one copy of each post in the timeline
    let timeline = f
        .services
        .feeds
        .list_following_feed(&reader, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(timeline.count, 1);
}

#[tokio::test]
async fn unfollow_without_edge_is_noop() {
    let f = fixture();
    let reader = f.user("reader").await;
    f.user("author").await;

    assert!(!f.services.follows.unfollow("author", &reader).await.unwrap());
    f.services.follows.follow("author", &reader).await.unwrap();
    assert!(f.services.follows.unfollow("author", &reader).await.unwrap());
    assert!(!f.services.follows.unfollow("author", &reader).await.unwrap());
}

#[tokio::test]
async fn self_follow_is_skipped() {
    let f = fixture();
    let author = f.user("author").await;
    f.post(&author, "mine").await;

    assert!(!f.services.follows.follow("author", &author).await.unwrap());
    let timeline = f
        .services
        .feeds
        .list_following_feed(&author, &PageRequest::default())
        .await
        .unwrap();
    assert!(timeline.is_empty());
}

#[tokio::test]
async fn follow_unknown_author_is_not_found() {
    let f = fixture();
    let reader = f.user("reader").await;
    assert!(matches!(
        f.services.follows.follow("ghost", &reader).await,
        Err(DomainError::UserNotFound(_))
    ));
    assert!(matches!(
        f.services.follows.unfollow("ghost", &reader).await,
        Err(DomainError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn is_following_ignores_anonymous_and_self() {
    let f = fixture();
    let reader = f.user("reader").await;
    f.user("author").await;
    f.services.follows.follow("author", &reader).await.unwrap();

    let author = f.services.users.get_by_username("author").await.unwrap();
    let reader_user = f.services.users.get_user(reader.id).await.unwrap();
    let follows = &f.services.follows;

    assert!(follows.is_following(Some(&reader), &author).await.unwrap());
    assert!(!follows.is_following(None, &author).await.unwrap());
    assert!(!follows.is_following(Some(&reader), &reader_user).await.unwrap());

    // storage accepts a self edge; the viewer's own profile still reads false
    assert!(f.store.insert(reader.id, reader.id).await.unwrap());
    assert!(f.store.exists(reader.id, reader.id).await.unwrap());
    assert!(!follows.is_following(Some(&reader), &reader_user).await.unwrap());
}

#[tokio::test]
async fn group_slug_must_be_unique() {
    let f = fixture();
    f.group("cats").await;
    let err = f
        .services
        .groups
        .create_group(&GroupForm {
            title: String::new(),
            slug: "cats".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    let DomainError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert!(errors.contains("slug"));
    assert_eq!(f.services.groups.list_groups().await.unwrap().len(), 1);
}

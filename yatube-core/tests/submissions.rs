mod common;

use common::{SMALL_GIF, fixture};
use yatube_core::DomainError;
use yatube_core::application::submission_service::{Redirect, Submission};
use yatube_core::domain::form::{
    CommentForm, INVALID_CHOICE, INVALID_IMAGE, ImageUpload, PostForm, REQUIRED,
};

#[tokio::test]
async fn created_post_belongs_to_requester() {
    let f = fixture();
    let author = f.user("author").await;
    let group = f.group("cats").await;

    let outcome = f
        .services
        .submissions
        .create_post(PostForm::new("Hello").with_group(group.id), &author)
        .await
        .unwrap();

    let Submission::Accepted { value, redirect } = outcome else {
        panic!("post should be accepted");
    };
    assert_eq!(value.author_id, author.id);
    assert_eq!(value.group_id, Some(group.id));
    assert_eq!(value.text, "Hello");
    assert_eq!(
        redirect,
        Redirect::Profile {
            username: "author".into()
        }
    );

    let stored = f.services.posts.find_post(value.id).await.unwrap();
    assert_eq!(stored, value);
}

#[tokio::test]
async fn invalid_post_is_returned_with_errors() {
    let f = fixture();
    let author = f.user("author").await;
    let form = PostForm::new("  ").with_group(404);

    let outcome = f
        .services
        .submissions
        .create_post(form.clone(), &author)
        .await
        .unwrap();

    let Submission::Rejected {
        form: returned,
        errors,
    } = outcome
    else {
        panic!("post should be rejected");
    };
    assert_eq!(returned, form);
    assert_eq!(errors.get("text"), Some(&[REQUIRED.to_string()][..]));
    assert_eq!(errors.get("group"), Some(&[INVALID_CHOICE.to_string()][..]));

    let profile = f
        .services
        .feeds
        .list_profile("author", &Default::default(), None)
        .await
        .unwrap();
    assert_eq!(profile.count, 0);
}

#[tokio::test]
async fn image_is_stored_under_media_root() {
    let f = fixture();
    let author = f.user("author").await;
    let form = PostForm::new("with picture")
        .with_image(ImageUpload::new("small.gif", SMALL_GIF.to_vec()));

    let post = f.submit(&author, form).await;

    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));
    let stored = std::fs::read(f.media.path().join("posts/small.gif")).unwrap();
    assert_eq!(stored, SMALL_GIF);
}

#[tokio::test]
async fn rejected_image_leaves_nothing_behind() {
    let f = fixture();
    let author = f.user("author").await;
    let form = PostForm::new("bad").with_image(ImageUpload::new("bad.gif", b"nope".to_vec()));

    let outcome = f
        .services
        .submissions
        .create_post(form, &author)
        .await
        .unwrap();

    assert_eq!(
        outcome.errors().and_then(|e| e.get("image")),
        Some(&[INVALID_IMAGE.to_string()][..])
    );
    assert!(!f.media.path().join("posts").exists());
}

#[tokio::test]
async fn edit_keeps_identity_and_restamps_author() {
    let f = fixture();
    let author = f.user("author").await;
    let editor = f.user("editor").await;
    let group = f.group("cats").await;
    let post = f.post(&author, "original").await;

    let outcome = f
        .services
        .submissions
        .edit_post(post.id, PostForm::new("edited").with_group(group.id), &editor)
        .await
        .unwrap();

    let Submission::Accepted { value, redirect } = outcome else {
        panic!("edit should be accepted");
    };
    assert_eq!(redirect, Redirect::PostDetail { post_id: post.id });
    assert_eq!(value.id, post.id);
    assert_eq!(value.pub_date, post.pub_date);
    assert_eq!(value.text, "edited");
    assert_eq!(value.group_id, Some(group.id));
    assert_eq!(value.author_id, editor.id);
}

#[tokio::test]
async fn edit_without_upload_keeps_image() {
    let f = fixture();
    let author = f.user("author").await;
    let post = f
        .submit(
            &author,
            PostForm::new("pic").with_image(ImageUpload::new("small.gif", SMALL_GIF.to_vec())),
        )
        .await;

    let form = f.services.submissions.edit_form(post.id).await.unwrap();
    assert_eq!(form.text, "pic");
    assert_eq!(form.group, None);

    let edited = f
        .services
        .submissions
        .edit_post(post.id, PostForm { text: "still a pic".into(), ..form }, &author)
        .await
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(edited.image, post.image);
}

#[tokio::test]
async fn invalid_edit_changes_nothing() {
    let f = fixture();
    let author = f.user("author").await;
    let editor = f.user("editor").await;
    let post = f.post(&author, "original").await;

    let outcome = f
        .services
        .submissions
        .edit_post(post.id, PostForm::new(""), &editor)
        .await
        .unwrap();
    assert!(!outcome.is_accepted());

    let stored = f.services.posts.find_post(post.id).await.unwrap();
    assert_eq!(stored, post);
}

#[tokio::test]
async fn editing_missing_post_is_not_found() {
    let f = fixture();
    let editor = f.user("editor").await;
    let err = f
        .services
        .submissions
        .edit_post(77, PostForm::new("text"), &editor)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PostNotFound(77)));
    assert!(f.services.submissions.edit_form(77).await.is_err());
}

#[tokio::test]
async fn comment_is_attached_to_post() {
    let f = fixture();
    let author = f.user("author").await;
    let reader = f.user("reader").await;
    let post = f.post(&author, "post").await;

    let outcome = f
        .services
        .submissions
        .add_comment(post.id, CommentForm::new("Nice!"), &reader)
        .await
        .unwrap();
    let Submission::Accepted { value, redirect } = outcome else {
        panic!("comment should be accepted");
    };
    assert_eq!(redirect, Redirect::PostDetail { post_id: post.id });
    assert_eq!(value.author_id, reader.id);
    assert_eq!(value.post_id, post.id);

    let detail = f.services.posts.get_post(post.id).await.unwrap();
    assert_eq!(detail.post, post);
    assert_eq!(detail.comments, vec![value]);
}

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let f = fixture();
    let author = f.user("author").await;
    let post = f.post(&author, "post").await;
    for text in ["one", "two", "three"] {
        f.services
            .submissions
            .add_comment(post.id, CommentForm::new(text), &author)
            .await
            .unwrap();
    }
    let detail = f.services.posts.get_post(post.id).await.unwrap();
    let texts: Vec<_> = detail.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["one", "two", "three"]);
}

#[tokio::test]
async fn empty_comment_is_not_saved() {
    let f = fixture();
    let author = f.user("author").await;
    let post = f.post(&author, "post").await;

    let outcome = f
        .services
        .submissions
        .add_comment(post.id, CommentForm::new("   "), &author)
        .await
        .unwrap();
    assert_eq!(
        outcome.errors().and_then(|e| e.get("text")),
        Some(&[REQUIRED.to_string()][..])
    );
    assert!(f.services.posts.get_post(post.id).await.unwrap().comments.is_empty());
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let f = fixture();
    let reader = f.user("reader").await;
    let err = f
        .services
        .submissions
        .add_comment(5, CommentForm::new("hello"), &reader)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PostNotFound(5)));
}

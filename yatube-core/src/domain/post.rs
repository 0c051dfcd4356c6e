use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PREVIEW_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Post {
    /// Short label used in listings and logs.
    pub fn preview(&self) -> String {
        self.text.chars().take(PREVIEW_CHARS).collect()
    }
}

/// Post as handed to the store; id and `pub_date` are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Replacement values for an edit. `image: None` keeps the stored image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Subset of posts a feed is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts whose author is followed by the given user.
    FollowedBy(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let post = Post {
            id: 1,
            text: "Тестовый пост с длинным текстом".into(),
            pub_date: Utc::now(),
            author_id: Uuid::new_v4(),
            group_id: None,
            image: None,
        };
        assert_eq!(post.preview(), "Тестовый пост с");
    }
}

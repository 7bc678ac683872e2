use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Display format for `Post::published`, e.g. "Monday, January 2, 2006".
pub const PUBLISHED_FORMAT: &str = "%A, %B %-d, %Y";

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Insert payload for a post; id and timestamps are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: String,
}

impl NewPost {
    /// Build a post stamped with today's display date.
    pub fn new(
        user_id: i64,
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            slug: slug.into(),
            content: content.into(),
            published: Utc::now().format(PUBLISHED_FORMAT).to_string(),
        }
    }
}

/// Fields replaced by `edit_post`. `tags: None` leaves the tag links alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostEdit {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub tags: Option<Vec<String>>,
}

/// A post together with its tags, as served by the single-post page.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithTags {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
}

use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::db::{Post, PostWithTags, QueryOptions, Tag};
use crate::{BlogError, router::BlogState};

/// How many posts the home page shows.
pub const HOME_POST_COUNT: u32 = 3;

/// `GET /blog?q=rust&q=web&sort=title&dir=asc&limit=10`
#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    /// Tag names; a post matches if it has any of them.
    #[serde(default)]
    pub q: Vec<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub limit: Option<u32>,
}

impl BlogQuery {
    fn options(&self) -> QueryOptions {
        let mut options = QueryOptions::default();
        if let (Some(sort), Some(dir)) = (self.sort.as_deref(), self.dir.as_deref()) {
            options = options.with_order_str(sort, dir);
        }
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        options
    }
}

pub async fn home(State(state): State<BlogState>) -> Result<Json<Vec<Post>>, BlogError> {
    let posts = state
        .storage
        .get_all_posts(QueryOptions::default().with_limit(HOME_POST_COUNT))
        .await?;
    Ok(Json(posts))
}

pub async fn list_posts(
    State(state): State<BlogState>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Vec<Post>>, BlogError> {
    let filters: Vec<String> = query
        .q
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let posts = state
        .storage
        .get_filtered_posts(&filters, query.options())
        .await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<BlogState>,
    Path(slug): Path<String>,
) -> Result<Json<PostWithTags>, BlogError> {
    let post = state.storage.get_post_by_slug(&slug).await?;
    let tags = state.storage.get_tags(post.id).await?;
    Ok(Json(PostWithTags { post, tags }))
}

pub async fn list_tags(State(state): State<BlogState>) -> Result<Json<Vec<Tag>>, BlogError> {
    Ok(Json(state.storage.all_tags().await?))
}

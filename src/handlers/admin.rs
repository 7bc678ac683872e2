use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::db::{NewPost, Post, PostEdit, QueryOptions};
use crate::markdown::{self, MarkdownUpload};
use crate::middleware::auth::RequireAdmin;
use crate::{BlogError, router::BlogState};

/// Multipart field carrying the uploaded document.
const MARKDOWN_FIELD: &str = "markdown";

/// Fields of the authoring form.
#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(rename = "post-title", default)]
    pub title: String,
    #[serde(rename = "post-slug", default)]
    pub slug: String,
    #[serde(rename = "post-content", default)]
    pub content: String,
    /// Space-separated tag names. Absent on edit means "keep current tags".
    pub tags: Option<String>,
}

/// GET /admin -> every post, newest first.
pub async fn dashboard(
    _admin: RequireAdmin,
    State(state): State<BlogState>,
) -> Result<Json<Vec<Post>>, BlogError> {
    Ok(Json(state.storage.get_all_posts(QueryOptions::default()).await?))
}

/// POST /post -> create a post owned by the logged-in admin.
pub async fn create_post(
    admin: RequireAdmin,
    State(state): State<BlogState>,
    Form(form): Form<PostForm>,
) -> Result<(StatusCode, Json<Value>), BlogError> {
    let tags = markdown::split_tags(form.tags.as_deref().unwrap_or_default());
    let post = NewPost::new(admin.user_id, form.title, form.slug, form.content);
    let id = state.storage.create_post_with_tags(&post, &tags).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id, "slug": post.slug }))))
}

/// PATCH /post/{id}
pub async fn edit_post(
    _admin: RequireAdmin,
    State(state): State<BlogState>,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<StatusCode, BlogError> {
    let edit = PostEdit {
        title: form.title,
        slug: form.slug,
        content: form.content,
        tags: form.tags.as_deref().map(markdown::split_tags),
    };
    state.storage.edit_post(id, &edit).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /post/{id}
pub async fn delete_post(
    _admin: RequireAdmin,
    State(state): State<BlogState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, BlogError> {
    state.storage.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /markdown -> preview of an uploaded `.md` file. Nothing is stored.
pub async fn upload_markdown(
    _admin: RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<MarkdownUpload>, BlogError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BlogError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(MARKDOWN_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .text()
            .await
            .map_err(|e| BlogError::BadRequest(e.body_text()))?;

        let upload = markdown::ingest(&filename, &content)?;
        info!(title = %upload.title, slug = %upload.slug, "markdown preview rendered");
        return Ok(Json(upload));
    }
    Err(BlogError::BadRequest(format!(
        "missing `{MARKDOWN_FIELD}` file field"
    )))
}

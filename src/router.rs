use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::Key;

use crate::db::BlogStorage;
use crate::handlers::{admin, blog, session};

/// Matches the multipart allowance of the authoring form (32 MiB).
pub const MARKDOWN_BODY_LIMIT: usize = 32 << 20;

#[derive(Clone)]
pub struct BlogState {
    pub storage: BlogStorage,
    pub cookie_key: Key,
    /// Mark the session cookie `Secure`.
    pub secure_cookie: bool,
}

impl BlogState {
    pub fn new(storage: BlogStorage, cookie_key: Key, secure_cookie: bool) -> Self {
        Self {
            storage,
            cookie_key,
            secure_cookie,
        }
    }
}

impl FromRef<BlogState> for Key {
    fn from_ref(state: &BlogState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<BlogState> for BlogStorage {
    fn from_ref(state: &BlogState) -> Self {
        state.storage.clone()
    }
}

pub fn blog_router(state: BlogState) -> Router {
    let public = Router::new()
        .route("/", get(blog::home))
        .route("/blog", get(blog::list_posts))
        .route("/blog/{slug}", get(blog::get_post))
        .route("/tags", get(blog::list_tags))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout));

    let admin = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/post", post(admin::create_post))
        .route(
            "/post/{id}",
            patch(admin::edit_post).delete(admin::delete_post),
        )
        .route(
            "/markdown",
            post(admin::upload_markdown).layer(DefaultBodyLimit::max(MARKDOWN_BODY_LIMIT)),
        );

    public.merge(admin).with_state(state)
}

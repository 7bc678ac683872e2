use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::User;
use crate::middleware::auth::{Session, clear_session_cookie, session_cookie};
use crate::{BlogError, router::BlogState};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /login -> verifies the admin credentials and sets the session cookie.
pub async fn login(
    State(state): State<BlogState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(PrivateCookieJar, Json<User>), BlogError> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(BlogError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let user = state
        .storage
        .get_user_by_credentials(&form.username, &form.password)
        .await
        .inspect_err(|e| {
            if matches!(e, BlogError::Unauthorized) {
                warn!(username = %form.username, "rejected login");
            }
        })?;
    if !user.is_admin {
        warn!(user_id = user.id, "non-admin login refused");
        return Err(BlogError::Unauthorized);
    }

    let session = Session::issue(user.id);
    let jar = jar.add(session_cookie(&session, state.secure_cookie));
    info!(user_id = user.id, "admin logged in");
    Ok((jar, Json(user)))
}

/// POST /logout -> drops the session cookie.
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (jar.remove(clear_session_cookie()), StatusCode::NO_CONTENT)
}

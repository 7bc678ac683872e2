use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use time::Duration;
use tracing::debug;

use crate::db::BlogStorage;
use crate::error::BlogError;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_TTL_HOURS: i64 = 24;

/// Value stored inside the encrypted session cookie: `<user_id>.<expires_unix>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub expires_at: i64,
}

impl Session {
    pub fn issue(user_id: i64) -> Self {
        Self {
            user_id,
            expires_at: Utc::now().timestamp() + SESSION_TTL_HOURS * 3600,
        }
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.user_id, self.expires_at)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let (user_id, expires_at) = value.split_once('.')?;
        Some(Self {
            user_id: user_id.parse().ok()?,
            expires_at: expires_at.parse().ok()?,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }
}

pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, session.encode()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(SESSION_TTL_HOURS))
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Extractor that admits only requests carrying a live admin session.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin {
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    Key: FromRef<S>,
    BlogStorage: FromRef<S>,
{
    type Rejection = BlogError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        let Some(session) = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Session::decode(c.value()))
        else {
            return Err(BlogError::Unauthorized);
        };
        if session.is_expired() {
            debug!(user_id = session.user_id, "session expired");
            return Err(BlogError::Unauthorized);
        }

        let storage = BlogStorage::from_ref(state);
        let user = match storage.get_user(session.user_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Err(BlogError::Unauthorized),
            Err(e) => return Err(e),
        };
        if !user.is_admin {
            return Err(BlogError::Unauthorized);
        }
        Ok(Self { user_id: user.id })
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum BlogError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl BlogError {
    /// Turn sqlx's `RowNotFound` into a typed not-found for `entity`,
    /// leaving every other store failure as a database error.
    pub fn not_found_or(entity: &'static str) -> impl FnOnce(SqlxError) -> BlogError {
        move |e| match e {
            SqlxError::RowNotFound => BlogError::NotFound(entity),
            other => BlogError::DatabaseError(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound(_))
    }
}

impl From<argon2::password_hash::Error> for BlogError {
    fn from(e: argon2::password_hash::Error) -> Self {
        BlogError::PasswordHash(e.to_string())
    }
}

impl IntoResponse for BlogError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            BlogError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{entity} not found."),
                },
            ),
            BlogError::MalformedInput(reason) | BlogError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "BAD_REQUEST".to_string(),
                    message: reason,
                },
            ),
            BlogError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Authentication required.".to_string(),
                },
            ),
            err @ (BlogError::DatabaseError(_) | BlogError::PasswordHash(_)) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                    },
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

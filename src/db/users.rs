use crate::db::models::User;
use crate::db::sqlite::BlogStorage;
use crate::error::BlogError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use tracing::warn;

impl BlogStorage {
    pub async fn get_user(&self, id: i64) -> Result<User, BlogError> {
        sqlx::query_as::<_, User>("SELECT id, username, password, is_admin FROM user WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(BlogError::not_found_or("user"))
    }

    /// Look up `username` and check `password` against the stored hash.
    /// A wrong password and an unknown user both come back as `Unauthorized`.
    pub async fn get_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, BlogError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, is_admin FROM user WHERE username = ? ORDER BY id LIMIT 1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?
        .ok_or(BlogError::Unauthorized)?;

        let parsed = PasswordHash::new(&user.password).inspect_err(|e| {
            warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
        })?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| BlogError::Unauthorized)?;
        Ok(user)
    }
}

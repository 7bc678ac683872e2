use crate::db::schema::{SENTINEL_TABLE, SQLITE_INIT};
use crate::error::BlogError;
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::str::FromStr;
use tracing::{debug, info};

pub type SqlitePool = Pool<Sqlite>;

/// Write transactions take the write lock up front, so concurrent writers
/// queue on the busy timeout instead of failing with SQLITE_BUSY on upgrade.
pub(crate) const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Credentials for the admin account created on first run.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Owns the pool; repositories are implemented as methods on this type in
/// `posts.rs`, `tags.rs` and `users.rs`.
#[derive(Clone)]
pub struct BlogStorage {
    pool: SqlitePool,
}

impl BlogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open (creating if missing) the store at `database_url` and initialize
    /// it when the schema is absent.
    pub async fn connect(database_url: &str, admin: &AdminSeed) -> Result<Self, BlogError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);

        if storage.is_initialized().await? {
            debug!(database_url, "existing blog store found");
        } else {
            storage.init_schema(admin).await?;
            info!(database_url, admin = %admin.username, "initialized blog store");
        }
        Ok(storage)
    }

    pub async fn is_initialized(&self) -> Result<bool, BlogError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(SENTINEL_TABLE)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Create the tables and the admin account in one transaction.
    pub async fn init_schema(&self, admin: &AdminSeed) -> Result<(), BlogError> {
        let hash = hash_password(&admin.password)?;
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        // sqlx::query runs a single statement, so feed the DDL one at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&mut *tx).await?;
        }
        insert_user(&mut tx, &admin.username, &hash, true).await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_user(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<i64, BlogError> {
    let res = sqlx::query("INSERT INTO user (username, password, is_admin) VALUES (?, ?, ?)")
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .execute(conn)
        .await?;
    Ok(res.last_insert_rowid())
}

pub(crate) fn hash_password(password: &str) -> Result<String, BlogError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

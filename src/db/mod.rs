//! Database module: the SQLite-backed blog store.
//!
//! Layout:
//! - `schema.rs`: SQL DDL run on first start
//! - `models.rs`: row structs and insert/edit payloads
//! - `query.rs`: ORDER BY / LIMIT options for listings
//! - `sqlite.rs`: `BlogStorage`, connection and first-run seeding
//! - `posts.rs`, `tags.rs`, `users.rs`: repository methods on `BlogStorage`

pub mod models;
pub mod query;
pub mod schema;
pub mod sqlite;

mod posts;
mod tags;
mod users;

pub use models::{NewPost, Post, PostEdit, PostWithTags, Tag, User};
pub use query::{OrderColumn, OrderDirection, QueryOptions};
pub use schema::SQLITE_INIT;
pub use sqlite::{AdminSeed, BlogStorage, SqlitePool};

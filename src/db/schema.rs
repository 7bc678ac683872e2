//! SQL DDL for initializing the blog store.

/// Tables created on first run:
/// - `user`: the admin account, `password` holds an Argon2 PHC string
/// - `post`: authored posts, `published` is a display date string
/// - `tag` / `post_tags`: many-to-many tagging, no uniqueness on either side
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(255),
    password VARCHAR(255),
    is_admin BOOLEAN
);

CREATE TABLE IF NOT EXISTS post (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    title TEXT,
    slug TEXT,
    content TEXT,
    published TEXT,
    created_at TIMESTAMP,
    updated_at TIMESTAMP,
    FOREIGN KEY(user_id) REFERENCES user(id)
);

CREATE TABLE IF NOT EXISTS tag (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    name TEXT
);

CREATE TABLE IF NOT EXISTS post_tags (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER,
    tag_id INTEGER,
    FOREIGN KEY(post_id) REFERENCES post(id),
    FOREIGN KEY(tag_id) REFERENCES tag(id)
);

CREATE INDEX IF NOT EXISTS idx_post_tags_post_id ON post_tags(post_id);
CREATE INDEX IF NOT EXISTS idx_post_tags_tag_id ON post_tags(tag_id)
"#;

/// Table whose presence marks an initialized store.
pub const SENTINEL_TABLE: &str = "post";

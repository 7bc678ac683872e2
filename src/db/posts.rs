use crate::db::models::{NewPost, Post, PostEdit};
use crate::db::query::QueryOptions;
use crate::db::sqlite::{BEGIN_WRITE, BlogStorage};
use crate::db::tags::{delete_orphaned_tags, link_tags, linked_tag_ids};
use crate::error::BlogError;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

const POST_COLUMNS: &str =
    "id, user_id, title, slug, content, published, created_at, updated_at";

impl BlogStorage {
    /// All posts shaped by `options`. No rows is an empty vec, not an error.
    pub async fn get_all_posts(&self, options: QueryOptions) -> Result<Vec<Post>, BlogError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM post{options}");
        let posts = sqlx::query_as::<_, Post>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(posts)
    }

    /// Posts carrying at least one of `tag_names`, shaped by `options`.
    /// Each post appears once however many of the names it carries.
    pub async fn get_filtered_posts(
        &self,
        tag_names: &[String],
        options: QueryOptions,
    ) -> Result<Vec<Post>, BlogError> {
        if tag_names.is_empty() {
            return self.get_all_posts(options).await;
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM post WHERE id IN (\
             SELECT pt.post_id FROM post_tags pt \
             JOIN tag t ON t.id = pt.tag_id \
             WHERE t.name IN ("
        ));
        let mut names = qb.separated(", ");
        for name in tag_names {
            names.push_bind(name.as_str());
        }
        names.push_unseparated("))");
        qb.push(options);

        let posts = qb.build_query_as::<Post>().fetch_all(self.pool()).await?;
        debug!(filters = ?tag_names, count = posts.len(), "filtered posts by tag");
        Ok(posts)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, BlogError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM post WHERE id = ?");
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(BlogError::not_found_or("post"))
    }

    /// Slugs are not unique; when several posts share one, the newest wins.
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Post, BlogError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM post WHERE slug = ? ORDER BY id DESC LIMIT 1");
        sqlx::query_as::<_, Post>(&sql)
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(BlogError::not_found_or("post"))
    }

    /// Insert a post and return its id. Title and slug are stored as given.
    pub async fn create_post(&self, post: &NewPost) -> Result<i64, BlogError> {
        let mut conn = self.pool().acquire().await?;
        let id = insert_post(&mut conn, post).await?;
        info!(id, slug = %post.slug, "created post");
        Ok(id)
    }

    /// Insert a post and link its tags atomically.
    pub async fn create_post_with_tags(
        &self,
        post: &NewPost,
        tags: &[String],
    ) -> Result<i64, BlogError> {
        let mut tx = self.pool().begin_with(BEGIN_WRITE).await?;
        let id = insert_post(&mut tx, post).await?;
        let linked = link_tags(&mut tx, id, tags).await?;
        tx.commit().await?;

        info!(id, slug = %post.slug, tags = linked, "created post");
        Ok(id)
    }

    /// Replace title, slug and content, and the tag set when `edit.tags` is
    /// given. Tags left without any post are removed.
    pub async fn edit_post(&self, id: i64, edit: &PostEdit) -> Result<(), BlogError> {
        let mut tx = self.pool().begin_with(BEGIN_WRITE).await?;

        let res = sqlx::query(
            "UPDATE post SET title = ?, slug = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&edit.title)
        .bind(&edit.slug)
        .bind(&edit.content)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(BlogError::NotFound("post"));
        }

        if let Some(tags) = edit.tags.as_deref() {
            let previous = linked_tag_ids(&mut tx, id).await?;
            sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_tags(&mut tx, id, tags).await?;
            let removed = delete_orphaned_tags(&mut tx, &previous).await?;
            debug!(id, removed, "replaced post tags");
        }

        tx.commit().await?;
        info!(id, slug = %edit.slug, "edited post");
        Ok(())
    }

    /// Delete a post, its tag links and any tag no other post uses, as one
    /// transaction.
    pub async fn delete_post(&self, id: i64) -> Result<(), BlogError> {
        let mut tx = self.pool().begin_with(BEGIN_WRITE).await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM post WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(BlogError::NotFound("post"));
        }

        // links go first so the orphan check sees this post as gone
        let tag_ids = linked_tag_ids(&mut tx, id).await?;
        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = delete_orphaned_tags(&mut tx, &tag_ids).await?;
        sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(id, orphaned_tags = removed, "deleted post");
        Ok(())
    }
}

async fn insert_post(conn: &mut SqliteConnection, post: &NewPost) -> Result<i64, BlogError> {
    let now = Utc::now();
    let res = sqlx::query(
        r#"INSERT INTO post (user_id, title, slug, content, published, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(post.user_id)
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.content)
    .bind(&post.published)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(res.last_insert_rowid())
}

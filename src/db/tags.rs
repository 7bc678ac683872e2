use crate::db::models::Tag;
use crate::db::sqlite::{BEGIN_WRITE, BlogStorage};
use crate::error::BlogError;
use sqlx::SqliteConnection;
use std::collections::HashSet;
use tracing::debug;

impl BlogStorage {
    /// Tags linked to `post_id`: link rows first, then each tag row.
    pub async fn get_tags(&self, post_id: i64) -> Result<Vec<Tag>, BlogError> {
        let mut conn = self.pool().acquire().await?;
        let ids = linked_tag_ids(&mut conn, post_id).await?;

        let mut tags = Vec::with_capacity(ids.len());
        for id in ids {
            let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tag WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *conn)
                .await
                .map_err(BlogError::not_found_or("tag"))?;
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Link `names` to `post_id`, creating tags that don't exist yet.
    pub async fn create_tags(&self, post_id: i64, names: &[String]) -> Result<(), BlogError> {
        let mut tx = self.pool().begin_with(BEGIN_WRITE).await?;
        link_tags(&mut tx, post_id, names).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn all_tags(&self) -> Result<Vec<Tag>, BlogError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tag ORDER BY name, id")
            .fetch_all(self.pool())
            .await?;
        Ok(tags)
    }
}

pub(crate) async fn linked_tag_ids(
    conn: &mut SqliteConnection,
    post_id: i64,
) -> Result<Vec<i64>, BlogError> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT tag_id FROM post_tags WHERE post_id = ? GROUP BY tag_id ORDER BY MIN(id)",
    )
    .bind(post_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Resolve each name to a tag id (inserting when missing) and link it.
/// Blank and repeated names are skipped. Returns the number of links made.
pub(crate) async fn link_tags(
    conn: &mut SqliteConnection,
    post_id: i64,
    names: &[String],
) -> Result<usize, BlogError> {
    let mut seen = HashSet::new();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !seen.insert(name) {
            continue;
        }
        let tag_id = find_or_create_tag(&mut *conn, name).await?;
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(seen.len())
}

async fn find_or_create_tag(conn: &mut SqliteConnection, name: &str) -> Result<i64, BlogError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tag WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let res = sqlx::query("INSERT INTO tag (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;
    debug!(tag = name, id = res.last_insert_rowid(), "created tag");
    Ok(res.last_insert_rowid())
}

/// Delete every tag in `tag_ids` that no link row references anymore.
pub(crate) async fn delete_orphaned_tags(
    conn: &mut SqliteConnection,
    tag_ids: &[i64],
) -> Result<u64, BlogError> {
    let mut removed = 0;
    for tag_id in tag_ids {
        let res = sqlx::query(
            "DELETE FROM tag WHERE id = ? AND NOT EXISTS (SELECT 1 FROM post_tags WHERE tag_id = ?)",
        )
        .bind(tag_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;
        removed += res.rows_affected();
    }
    Ok(removed)
}

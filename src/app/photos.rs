use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::app::access::Access;
use crate::domain::page::{PageParams, Paginated};
use crate::domain::photo::Photo;
use crate::infra::db::Db;
use crate::infra::storage::ObjectStorage;

const PHOTO_COLUMNS: &str = "p.id, p.username, p.url, p.title, p.description, p.tags, p.created_at, \
     u.display_name AS author_display_name, u.avatar_url AS author_avatar_url, \
     (SELECT COUNT(*) FROM likes l WHERE l.photo_id = p.id) AS like_count, \
     (SELECT COUNT(*) FROM comments c WHERE c.photo_id = p.id) AS comment_count, \
     (SELECT COUNT(*) FROM saves s WHERE s.photo_id = p.id) AS save_count";

#[derive(Debug, Default)]
pub struct PhotoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct PhotoService {
    db: Db,
}

impl PhotoService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        username: &str,
        url: String,
        title: String,
        description: String,
        tags: Vec<String>,
    ) -> Result<Photo> {
        let row = sqlx::query(
            "INSERT INTO photos (username, url, title, description, tags) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, username, url, title, description, tags, created_at",
        )
        .bind(username)
        .bind(url)
        .bind(title)
        .bind(description)
        .bind(tags)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Photo {
            id: row.get("id"),
            username: row.get("username"),
            url: row.get("url"),
            title: row.get("title"),
            description: row.get("description"),
            tags: row.get("tags"),
            created_at: row.get("created_at"),
            author_display_name: None,
            author_avatar_url: None,
            like_count: Some(0),
            comment_count: Some(0),
            save_count: Some(0),
        })
    }

    pub async fn get(&self, photo_id: Uuid) -> Result<Option<Photo>> {
        let row = sqlx::query(&format!(
            "SELECT {PHOTO_COLUMNS} \
             FROM photos p JOIN users u ON u.username = p.username \
             WHERE p.id = $1"
        ))
        .bind(photo_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(photo_from_row))
    }

    /// Partial update, owner only. Shape validation happens in the handler
    /// before any row is loaded; fields absent from the patch keep their value.
    pub async fn update(
        &self,
        photo_id: Uuid,
        actor: &str,
        patch: PhotoPatch,
    ) -> Result<Access<Photo>> {
        let owner: Option<String> = sqlx::query_scalar("SELECT username FROM photos WHERE id = $1")
            .bind(photo_id)
            .fetch_optional(self.db.pool())
            .await?;

        let owner = match owner {
            Some(owner) => owner,
            None => return Ok(Access::NotFound),
        };
        if owner != actor {
            return Ok(Access::Forbidden);
        }

        let row = sqlx::query(
            "UPDATE photos \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 tags = COALESCE($4, tags) \
             WHERE id = $1 \
             RETURNING id, username, url, title, description, tags, created_at",
        )
        .bind(photo_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.tags)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Access::Granted(Photo {
                id: row.get("id"),
                username: row.get("username"),
                url: row.get("url"),
                title: row.get("title"),
                description: row.get("description"),
                tags: row.get("tags"),
                created_at: row.get("created_at"),
                author_display_name: None,
                author_avatar_url: None,
                like_count: None,
                comment_count: None,
                save_count: None,
            })),
            // Deleted between the ownership read and the update.
            None => Ok(Access::NotFound),
        }
    }

    /// Owner-only delete. The image blob is removed best-effort: a storage
    /// failure is logged and the row delete proceeds, since an orphaned blob
    /// is acceptable where an orphaned row is not. Likes, saves, and comments
    /// go with the row via the schema's cascades.
    pub async fn delete(
        &self,
        photo_id: Uuid,
        actor: &str,
        storage: &ObjectStorage,
    ) -> Result<Access<()>> {
        let row = sqlx::query("SELECT username, url FROM photos WHERE id = $1")
            .bind(photo_id)
            .fetch_optional(self.db.pool())
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(Access::NotFound),
        };
        let owner: String = row.get("username");
        if owner != actor {
            return Ok(Access::Forbidden);
        }

        let url: String = row.get("url");
        if let Some(object_key) = storage.object_key_for(&url) {
            if let Err(err) = storage.delete_blob(&object_key).await {
                tracing::warn!(error = ?err, %photo_id, object_key, "failed to delete photo blob");
            }
        }

        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(photo_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() > 0 {
            Ok(Access::Granted(()))
        } else {
            Ok(Access::NotFound)
        }
    }

    pub async fn list_recent(&self, params: PageParams) -> Result<Paginated<Photo>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos")
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {PHOTO_COLUMNS} \
             FROM photos p JOIN users u ON u.username = p.username \
             ORDER BY p.created_at DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let photos = rows.into_iter().map(photo_from_row).collect();
        Ok(Paginated::new(photos, total, params))
    }

    pub async fn list_by_tag(&self, tag: &str, params: PageParams) -> Result<Paginated<Photo>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE $1 = ANY(tags)")
            .bind(tag)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {PHOTO_COLUMNS} \
             FROM photos p JOIN users u ON u.username = p.username \
             WHERE $1 = ANY(p.tags) \
             ORDER BY p.created_at DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(tag)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let photos = rows.into_iter().map(photo_from_row).collect();
        Ok(Paginated::new(photos, total, params))
    }

    /// A user's photos, newest first. None when the user does not exist.
    pub async fn list_by_user(
        &self,
        username: &str,
        params: PageParams,
    ) -> Result<Option<Paginated<Photo>>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.db.pool())
                .await?;
        if !exists {
            return Ok(None);
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE username = $1")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {PHOTO_COLUMNS} \
             FROM photos p JOIN users u ON u.username = p.username \
             WHERE p.username = $1 \
             ORDER BY p.created_at DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(username)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let photos = rows.into_iter().map(photo_from_row).collect();
        Ok(Some(Paginated::new(photos, total, params)))
    }
}

pub(crate) fn photo_from_row(row: sqlx::postgres::PgRow) -> Photo {
    Photo {
        id: row.get("id"),
        username: row.get("username"),
        url: row.get("url"),
        title: row.get("title"),
        description: row.get("description"),
        tags: row.get("tags"),
        created_at: row.get("created_at"),
        author_display_name: Some(row.get("author_display_name")),
        author_avatar_url: row.get("author_avatar_url"),
        like_count: Some(row.get("like_count")),
        comment_count: Some(row.get("comment_count")),
        save_count: Some(row.get("save_count")),
    }
}

use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::app::access::Access;
use crate::domain::engagement::Comment;
use crate::domain::page::{PageParams, Paginated};
use crate::infra::db::{is_fk_violation, Db};

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// None when the parent photo does not exist.
    pub async fn create(
        &self,
        username: &str,
        photo_id: Uuid,
        content: String,
    ) -> Result<Option<Comment>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM photos WHERE id = $1)")
            .bind(photo_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Ok(None);
        }

        let row = match sqlx::query(
            "WITH inserted AS ( \
                INSERT INTO comments (photo_id, username, content) \
                VALUES ($1, $2, $3) \
                RETURNING id, photo_id, username, content, created_at, updated_at \
             ) \
             SELECT i.*, u.display_name AS author_display_name, u.avatar_url AS author_avatar_url \
             FROM inserted i JOIN users u ON u.username = i.username",
        )
        .bind(photo_id)
        .bind(username)
        .bind(content)
        .fetch_one(self.db.pool())
        .await
        {
            Ok(row) => row,
            // Photo or author deleted between the existence check and the insert.
            Err(err) if is_fk_violation(&err) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(comment_from_row(row)))
    }

    /// Comments on a photo, newest first. None when the photo does not exist.
    pub async fn list(
        &self,
        photo_id: Uuid,
        params: PageParams,
    ) -> Result<Option<Paginated<Comment>>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM photos WHERE id = $1)")
            .bind(photo_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Ok(None);
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE photo_id = $1")
            .bind(photo_id)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(
            "SELECT c.id, c.photo_id, c.username, c.content, c.created_at, c.updated_at, \
                    u.display_name AS author_display_name, u.avatar_url AS author_avatar_url \
             FROM comments c \
             JOIN users u ON u.username = c.username \
             WHERE c.photo_id = $1 \
             ORDER BY c.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(photo_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let comments = rows.into_iter().map(comment_from_row).collect();
        Ok(Some(Paginated::new(comments, total, params)))
    }

    /// Only the author may edit.
    pub async fn update(
        &self,
        comment_id: Uuid,
        actor: &str,
        content: String,
    ) -> Result<Access<Comment>> {
        let author: Option<String> =
            sqlx::query_scalar("SELECT username FROM comments WHERE id = $1")
                .bind(comment_id)
                .fetch_optional(self.db.pool())
                .await?;

        let author = match author {
            Some(author) => author,
            None => return Ok(Access::NotFound),
        };
        if author != actor {
            return Ok(Access::Forbidden);
        }

        let row = sqlx::query(
            "WITH updated AS ( \
                UPDATE comments SET content = $2, updated_at = now() \
                WHERE id = $1 \
                RETURNING id, photo_id, username, content, created_at, updated_at \
             ) \
             SELECT uc.*, u.display_name AS author_display_name, u.avatar_url AS author_avatar_url \
             FROM updated uc JOIN users u ON u.username = uc.username",
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Access::Granted(comment_from_row(row))),
            None => Ok(Access::NotFound),
        }
    }

    /// Two-party rule: the comment's author and the parent photo's owner may
    /// both delete; anyone else is refused.
    pub async fn delete(&self, comment_id: Uuid, actor: &str) -> Result<Access<()>> {
        let row = sqlx::query(
            "SELECT c.username AS author, p.username AS photo_owner \
             FROM comments c \
             JOIN photos p ON p.id = c.photo_id \
             WHERE c.id = $1",
        )
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(Access::NotFound),
        };
        let author: String = row.get("author");
        let photo_owner: String = row.get("photo_owner");
        if actor != author && actor != photo_owner {
            return Ok(Access::Forbidden);
        }

        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() > 0 {
            Ok(Access::Granted(()))
        } else {
            Ok(Access::NotFound)
        }
    }
}

fn comment_from_row(row: sqlx::postgres::PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        photo_id: row.get("photo_id"),
        username: row.get("username"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        author_display_name: Some(row.get("author_display_name")),
        author_avatar_url: row.get("author_avatar_url"),
    }
}

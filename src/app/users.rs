use anyhow::Result;
use sqlx::Row;

use crate::app::photos::photo_from_row;
use crate::domain::page::{PageParams, Paginated};
use crate::domain::photo::Photo;
use crate::domain::user::{Profile, User};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT username, display_name, avatar_url, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| User {
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            created_at: row.get("created_at"),
        }))
    }

    pub async fn get_profile(&self, username: &str) -> Result<Option<Profile>> {
        let row = sqlx::query(
            "SELECT u.username, u.display_name, u.avatar_url, u.created_at, \
                    (SELECT COUNT(*) FROM follows f WHERE f.following = u.username) AS followers_count, \
                    (SELECT COUNT(*) FROM follows f WHERE f.follower = u.username) AS following_count, \
                    (SELECT COUNT(*) FROM photos p WHERE p.username = u.username) AS photos_count \
             FROM users u WHERE u.username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Profile {
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            created_at: row.get("created_at"),
            followers_count: row.get("followers_count"),
            following_count: row.get("following_count"),
            photos_count: row.get("photos_count"),
        }))
    }

    /// Partial profile update; the username itself is immutable.
    pub async fn update_profile(
        &self,
        username: &str,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            "UPDATE users \
             SET display_name = COALESCE($2, display_name), \
                 avatar_url = COALESCE($3, avatar_url) \
             WHERE username = $1 \
             RETURNING username, display_name, avatar_url, created_at",
        )
        .bind(username)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| User {
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            created_at: row.get("created_at"),
        }))
    }

    /// The caller's saved photos, most recently saved first.
    pub async fn list_saved(
        &self,
        username: &str,
        params: PageParams,
    ) -> Result<Paginated<Photo>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saves WHERE username = $1")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(
            "SELECT p.id, p.username, p.url, p.title, p.description, p.tags, p.created_at, \
                    u.display_name AS author_display_name, u.avatar_url AS author_avatar_url, \
                    (SELECT COUNT(*) FROM likes l WHERE l.photo_id = p.id) AS like_count, \
                    (SELECT COUNT(*) FROM comments c WHERE c.photo_id = p.id) AS comment_count, \
                    (SELECT COUNT(*) FROM saves s2 WHERE s2.photo_id = p.id) AS save_count \
             FROM saves s \
             JOIN photos p ON p.id = s.photo_id \
             JOIN users u ON u.username = p.username \
             WHERE s.username = $1 \
             ORDER BY s.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(username)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let photos = rows.into_iter().map(photo_from_row).collect();
        Ok(Paginated::new(photos, total, params))
    }
}

use anyhow::Result;
use sqlx::Row;

use crate::domain::page::{PageParams, Paginated};
use crate::domain::user::User;
use crate::infra::db::{is_fk_violation, Db};
use uuid::Uuid;

/// Outcome of creating a two-state association. A duplicate pair is reported,
/// not silently absorbed; the unique constraint on the pair is the source of
/// truth and the existence probe is only a fast path.
#[derive(Debug, PartialEq, Eq)]
pub enum ToggleCreate {
    Created,
    AlreadyPresent,
    TargetMissing,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ToggleRemove {
    Removed,
    NotPresent,
}

/// Idempotent-rejecting create/delete over the many-to-many relations:
/// likes and saves pair a user with a photo, follows pair two users.
#[derive(Clone)]
pub struct RelationService {
    db: Db,
}

impl RelationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn like(&self, username: &str, photo_id: Uuid) -> Result<ToggleCreate> {
        if !self.photo_exists(photo_id).await? {
            return Ok(ToggleCreate::TargetMissing);
        }

        let result = match sqlx::query(
            "INSERT INTO likes (username, photo_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(username)
        .bind(photo_id)
        .execute(self.db.pool())
        .await
        {
            Ok(result) => result,
            // Target deleted between the fast-path check and the insert.
            Err(err) if is_fk_violation(&err) => return Ok(ToggleCreate::TargetMissing),
            Err(err) => return Err(err.into()),
        };

        Ok(if result.rows_affected() > 0 {
            ToggleCreate::Created
        } else {
            ToggleCreate::AlreadyPresent
        })
    }

    pub async fn unlike(&self, username: &str, photo_id: Uuid) -> Result<ToggleRemove> {
        let result = sqlx::query("DELETE FROM likes WHERE username = $1 AND photo_id = $2")
            .bind(username)
            .bind(photo_id)
            .execute(self.db.pool())
            .await?;

        Ok(if result.rows_affected() > 0 {
            ToggleRemove::Removed
        } else {
            ToggleRemove::NotPresent
        })
    }

    /// Never fails on an absent pair.
    pub async fn has_liked(&self, username: &str, photo_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE username = $1 AND photo_id = $2)",
        )
        .bind(username)
        .bind(photo_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    pub async fn save(&self, username: &str, photo_id: Uuid) -> Result<ToggleCreate> {
        if !self.photo_exists(photo_id).await? {
            return Ok(ToggleCreate::TargetMissing);
        }

        let result = match sqlx::query(
            "INSERT INTO saves (username, photo_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(username)
        .bind(photo_id)
        .execute(self.db.pool())
        .await
        {
            Ok(result) => result,
            Err(err) if is_fk_violation(&err) => return Ok(ToggleCreate::TargetMissing),
            Err(err) => return Err(err.into()),
        };

        Ok(if result.rows_affected() > 0 {
            ToggleCreate::Created
        } else {
            ToggleCreate::AlreadyPresent
        })
    }

    pub async fn unsave(&self, username: &str, photo_id: Uuid) -> Result<ToggleRemove> {
        let result = sqlx::query("DELETE FROM saves WHERE username = $1 AND photo_id = $2")
            .bind(username)
            .bind(photo_id)
            .execute(self.db.pool())
            .await?;

        Ok(if result.rows_affected() > 0 {
            ToggleRemove::Removed
        } else {
            ToggleRemove::NotPresent
        })
    }

    pub async fn has_saved(&self, username: &str, photo_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM saves WHERE username = $1 AND photo_id = $2)",
        )
        .bind(username)
        .bind(photo_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    /// Self-follow is refused by the caller before reaching here and again by
    /// the schema CHECK; the WHERE guard keeps a racy or buggy caller from
    /// inserting the pair anyway.
    pub async fn follow(&self, follower: &str, following: &str) -> Result<ToggleCreate> {
        if !self.user_exists(following).await? {
            return Ok(ToggleCreate::TargetMissing);
        }

        let result = match sqlx::query(
            "INSERT INTO follows (follower, following) \
             SELECT $1, $2 WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower)
        .bind(following)
        .execute(self.db.pool())
        .await
        {
            Ok(result) => result,
            Err(err) if is_fk_violation(&err) => return Ok(ToggleCreate::TargetMissing),
            Err(err) => return Err(err.into()),
        };

        Ok(if result.rows_affected() > 0 {
            ToggleCreate::Created
        } else {
            ToggleCreate::AlreadyPresent
        })
    }

    pub async fn unfollow(&self, follower: &str, following: &str) -> Result<ToggleRemove> {
        let result = sqlx::query("DELETE FROM follows WHERE follower = $1 AND following = $2")
            .bind(follower)
            .bind(following)
            .execute(self.db.pool())
            .await?;

        Ok(if result.rows_affected() > 0 {
            ToggleRemove::Removed
        } else {
            ToggleRemove::NotPresent
        })
    }

    pub async fn is_following(&self, follower: &str, following: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower = $1 AND following = $2)",
        )
        .bind(follower)
        .bind(following)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    /// Users who liked a photo, newest first. None when the photo is gone.
    pub async fn list_likers(
        &self,
        photo_id: Uuid,
        params: PageParams,
    ) -> Result<Option<Paginated<User>>> {
        if !self.photo_exists(photo_id).await? {
            return Ok(None);
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE photo_id = $1")
            .bind(photo_id)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(
            "SELECT u.username, u.display_name, u.avatar_url, u.created_at \
             FROM likes l \
             JOIN users u ON u.username = l.username \
             WHERE l.photo_id = $1 \
             ORDER BY l.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(photo_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let users = rows.into_iter().map(user_from_row).collect();
        Ok(Some(Paginated::new(users, total, params)))
    }

    pub async fn list_followers(
        &self,
        username: &str,
        params: PageParams,
    ) -> Result<Option<Paginated<User>>> {
        if !self.user_exists(username).await? {
            return Ok(None);
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following = $1")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(
            "SELECT u.username, u.display_name, u.avatar_url, u.created_at \
             FROM follows f \
             JOIN users u ON u.username = f.follower \
             WHERE f.following = $1 \
             ORDER BY f.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(username)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let users = rows.into_iter().map(user_from_row).collect();
        Ok(Some(Paginated::new(users, total, params)))
    }

    pub async fn list_following(
        &self,
        username: &str,
        params: PageParams,
    ) -> Result<Option<Paginated<User>>> {
        if !self.user_exists(username).await? {
            return Ok(None);
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower = $1")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(
            "SELECT u.username, u.display_name, u.avatar_url, u.created_at \
             FROM follows f \
             JOIN users u ON u.username = f.following \
             WHERE f.follower = $1 \
             ORDER BY f.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(username)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.db.pool())
        .await?;

        let users = rows.into_iter().map(user_from_row).collect();
        Ok(Some(Paginated::new(users, total, params)))
    }

    async fn photo_exists(&self, photo_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM photos WHERE id = $1)")
            .bind(photo_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    async fn user_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.db.pool())
                .await?;
        Ok(exists)
    }
}

fn user_from_row(row: sqlx::postgres::PgRow) -> User {
    User {
        username: row.get("username"),
        display_name: row.get("display_name"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
    }
}

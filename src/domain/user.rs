use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A registered user. The password hash lives only in the users table and is
/// never carried on this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Public profile shape returned for `GET /api/users/:username`.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub followers_count: i64,
    pub following_count: i64,
    pub photos_count: i64,
}

pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::infra::{cache::RedisCache, db::Db, mailer::Mailer, storage::ObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: RedisCache,
    pub storage: ObjectStorage,
    pub mailer: Mailer,
    pub token_key: [u8; 32],
    pub token_ttl_hours: u64,
    pub otp_ttl_minutes: u64,
    pub upload_url_ttl_seconds: u64,
}

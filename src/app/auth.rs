use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use sqlx::Row;
use time::{Duration, OffsetDateTime};

use crate::domain::user::User;
use crate::infra::db::Db;

const TOKEN_ISSUER: &str = "pinboard";

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    token_key: [u8; 32],
    token_ttl_hours: u64,
}

impl AuthService {
    pub fn new(db: Db, token_key: [u8; 32], token_ttl_hours: u64) -> Self {
        Self {
            db,
            token_key,
            token_ttl_hours,
        }
    }

    pub async fn signup(
        &self,
        username: String,
        password: String,
        display_name: String,
        avatar_url: Option<String>,
    ) -> Result<User> {
        let password_hash = hash_password(&password)?;
        let row = sqlx::query(
            "INSERT INTO users (username, password_hash, display_name, avatar_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING username, display_name, avatar_url, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_one(self.db.pool())
        .await?;

        Ok(User {
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            created_at: row.get("created_at"),
        })
    }

    pub async fn signin(&self, username: &str, password: &str) -> Result<Option<IssuedToken>> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        Ok(Some(self.issue_token(username)?))
    }

    pub fn issue_token(&self, username: &str) -> Result<IssuedToken> {
        self.issue_token_with_ttl(
            username,
            std::time::Duration::from_secs(self.token_ttl_hours * 3600),
        )
    }

    fn issue_token_with_ttl(&self, username: &str, ttl: std::time::Duration) -> Result<IssuedToken> {
        let mut claims = Claims::new_expires_in(&ttl)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(username)?;

        let key = SymmetricKey::<V4>::from(&self.token_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        let expires_at = OffsetDateTime::now_utc() + Duration::seconds(ttl.as_secs() as i64);

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a bearer token and return its subject. None covers expiry,
    /// malformed signature, and malformed payload alike.
    pub fn verify_token(&self, token: &str) -> Result<Option<String>> {
        let key = SymmetricKey::<V4>::from(&self.token_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };

        let subject = trusted
            .payload_claims()
            .and_then(|claims| claims.get_claim("sub"))
            .and_then(|value| value.as_str())
            .map(|value| value.to_string());

        Ok(subject)
    }

    /// A token's subject must still exist: a deleted user's otherwise-valid
    /// token is rejected at the middleware.
    pub async fn subject_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.db.pool())
                .await?;
        Ok(exists)
    }

    pub async fn reset_password(&self, username: &str, new_password: &str) -> Result<bool> {
        let password_hash = hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE username = $1")
            .bind(username)
            .bind(password_hash)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

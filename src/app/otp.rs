use anyhow::Result;
use rand::Rng;
use redis::AsyncCommands;

use crate::infra::cache::RedisCache;

/// Redis-backed store for password-reset codes. Keys expire on their own; a
/// successful consume deletes the code so it can never be replayed. Sharing
/// the store through Redis keeps multiple service instances consistent.
#[derive(Clone)]
pub struct OtpStore {
    cache: RedisCache,
    ttl_minutes: u64,
}

impl OtpStore {
    pub fn new(cache: RedisCache, ttl_minutes: u64) -> Self {
        Self { cache, ttl_minutes }
    }

    pub fn generate_code() -> String {
        let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        code.to_string()
    }

    pub async fn put(&self, username: &str, code: &str) -> Result<()> {
        let mut conn = self.cache.connection().await?;
        conn.set_ex::<_, _, ()>(otp_key(username), code, self.ttl_minutes * 60)
            .await?;
        Ok(())
    }

    /// Atomically compare and delete: returns true exactly once for a correct,
    /// unexpired code. A wrong guess leaves the stored code in place.
    pub async fn consume(&self, username: &str, code: &str) -> Result<bool> {
        let script = redis::Script::new(
            "if redis.call('GET', KEYS[1]) == ARGV[1] then \
                 redis.call('DEL', KEYS[1]) \
                 return 1 \
             else \
                 return 0 \
             end",
        );

        let mut conn = self.cache.connection().await?;
        let consumed: i64 = script
            .key(otp_key(username))
            .arg(code)
            .invoke_async(&mut conn)
            .await?;

        Ok(consumed == 1)
    }
}

fn otp_key(username: &str) -> String {
    format!("otp:{}", username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = OtpStore::generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}

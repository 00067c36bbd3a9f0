use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::Client;

/// Redis handle backing the one-time reset codes and the health probe.
///
/// Connections are multiplexed, so cloning the cache and grabbing a
/// connection per operation is cheap.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let cache = Self {
            client: Client::open(redis_url)?,
        };
        cache.ping().await?;
        Ok(cache)
    }

    pub async fn connection(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};

use skylane_core::cache::TokenStore;
use skylane_core::{CoreError, CoreResult};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn get_value(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(key).await
    }

    pub async fn set_value_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await
    }

    pub async fn delete_value(&self, key: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await
    }

    /// Fixed-window rate limit: INCR + EXPIRE in one atomic pipeline.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

#[async_trait]
impl TokenStore for RedisClient {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        self.get_value(key).await.map_err(redis_err)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> CoreResult<()> {
        self.set_value_ex(key, value, ttl_seconds)
            .await
            .map_err(redis_err)
    }

    async fn delete(&self, key: &str) -> CoreResult<()> {
        self.delete_value(key).await.map_err(redis_err)
    }
}

fn redis_err(err: redis::RedisError) -> CoreError {
    CoreError::Internal(format!("redis error: {err}"))
}

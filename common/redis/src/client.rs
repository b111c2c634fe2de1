use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::debug;

use crate::{Client, CustomRedisError};

pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// Create a new RedisClient and open its multiplexed connection.
    ///
    /// # Arguments
    /// * `addr` - Redis connection string, `redis://` or `rediss://`
    /// * `response_timeout` - Optional timeout for command responses. `None` means no timeout.
    /// * `connection_timeout` - Optional timeout for establishing the connection. `None` means no timeout.
    ///
    /// # Errors
    /// Returns `CustomRedisError::InvalidConfiguration` if `Some(Duration::ZERO)` is passed - use `None` for no timeout instead.
    ///
    /// # Examples
    /// ```no_run
    /// use common_redis::RedisClient;
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let client = RedisClient::with_config(
    ///     "redis://localhost:6379".to_string(),
    ///     Some(Duration::from_secs(10)),
    ///     Some(Duration::from_secs(10)),
    /// ).await.unwrap();
    /// # }
    /// ```
    pub async fn with_config(
        addr: String,
        response_timeout: Option<Duration>,
        connection_timeout: Option<Duration>,
    ) -> Result<RedisClient, CustomRedisError> {
        let client = redis::Client::open(addr)?;

        // Validate that Duration::ZERO is not passed - use None instead
        if let Some(timeout) = response_timeout {
            if timeout.is_zero() {
                return Err(CustomRedisError::InvalidConfiguration(
                    "Redis response timeout cannot be Duration::ZERO - use None for no timeout"
                        .to_string(),
                ));
            }
        }
        if let Some(timeout) = connection_timeout {
            if timeout.is_zero() {
                return Err(CustomRedisError::InvalidConfiguration(
                    "Redis connection timeout cannot be Duration::ZERO - use None for no timeout"
                        .to_string(),
                ));
            }
        }

        let mut config = redis::AsyncConnectionConfig::new();

        if let Some(timeout) = response_timeout {
            config = config.set_response_timeout(timeout);
        }

        if let Some(timeout) = connection_timeout {
            config = config.set_connection_timeout(timeout);
        }

        let connection = client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;

        Ok(RedisClient { connection })
    }
}

#[async_trait]
impl Client for RedisClient {
    async fn ping(&self) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!(response = %pong, "redis ping");
        Ok(())
    }

    async fn get(&self, k: String) -> Result<Option<String>, CustomRedisError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(k).await?;
        Ok(value)
    }

    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(k, v, seconds).await?;
        Ok(())
    }

    async fn del(&self, k: String) -> Result<bool, CustomRedisError> {
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(k).await?;
        Ok(removed > 0)
    }

    async fn close(&self) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        let result: Result<(), RedisError> = redis::cmd("QUIT").query_async(&mut conn).await;

        match result {
            Ok(()) => Ok(()),
            // The server may hang up before the reply is read, which is what we asked for
            Err(e) if e.is_connection_dropped() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

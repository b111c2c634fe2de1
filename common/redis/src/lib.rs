use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// Re-export ErrorKind so consumers can construct CustomRedisError in tests
pub use redis::ErrorKind as RedisErrorKind;

#[derive(Error, Debug, Clone)]
pub enum CustomRedisError {
    #[error("Timeout error")]
    Timeout,
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Connection error: {0}")]
    Transport(Arc<redis::RedisError>),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Redis(#[from] Arc<redis::RedisError>),
}

impl From<redis::RedisError> for CustomRedisError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            CustomRedisError::Timeout
        } else if err.kind() == redis::ErrorKind::AuthenticationFailed {
            CustomRedisError::Authentication(err.to_string())
        } else if err.kind() == redis::ErrorKind::InvalidClientConfig {
            CustomRedisError::InvalidConfiguration(err.to_string())
        } else if err.kind() == redis::ErrorKind::IoError
            || err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
        {
            CustomRedisError::Transport(Arc::new(err))
        } else {
            CustomRedisError::Redis(Arc::new(err))
        }
    }
}

impl From<tokio::time::error::Elapsed> for CustomRedisError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CustomRedisError::Timeout
    }
}

impl CustomRedisError {
    /// Create a Redis error from an ErrorKind (primarily for testing)
    pub fn from_redis_kind(kind: redis::ErrorKind, description: &'static str) -> Self {
        redis::RedisError::from((kind, description)).into()
    }

    /// Stable, low-cardinality label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CustomRedisError::Timeout => "timeout",
            CustomRedisError::Authentication(_) => "auth",
            CustomRedisError::Transport(_) => "transport",
            CustomRedisError::InvalidConfiguration(_) => "invalid_configuration",
            CustomRedisError::Redis(_) => "redis",
        }
    }
}

/// The cache operations the service needs. Values are UTF-8 strings.
#[async_trait]
pub trait Client {
    /// Round-trip PING, used as the liveness probe.
    async fn ping(&self) -> Result<(), CustomRedisError>;
    /// Returns `None` when the key does not exist.
    async fn get(&self, k: String) -> Result<Option<String>, CustomRedisError>;
    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError>;
    /// Returns true if a key was removed.
    async fn del(&self, k: String) -> Result<bool, CustomRedisError>;
    /// Politely ends the session. The client must not be used afterwards.
    async fn close(&self) -> Result<(), CustomRedisError>;
}

// Module declarations
mod client;
mod mock;

// Re-export public APIs
pub use client::RedisClient;
pub use mock::{MockRedisCall, MockRedisClient, MockRedisValue};

#[cfg(test)]
mod tests {
    use super::*;

    mod error_classification {
        use super::*;

        #[test]
        fn test_io_error_is_transport() {
            let err = CustomRedisError::from_redis_kind(RedisErrorKind::IoError, "Connection refused");
            assert!(matches!(err, CustomRedisError::Transport(_)));
            assert_eq!(err.kind(), "transport");
        }

        #[test]
        fn test_authentication_failed_is_auth() {
            let err = CustomRedisError::from_redis_kind(
                RedisErrorKind::AuthenticationFailed,
                "WRONGPASS invalid username-password pair",
            );
            assert!(matches!(err, CustomRedisError::Authentication(_)));
            assert_eq!(err.kind(), "auth");
        }

        #[test]
        fn test_invalid_client_config_is_configuration() {
            let err = CustomRedisError::from_redis_kind(
                RedisErrorKind::InvalidClientConfig,
                "Redis URL did not parse",
            );
            assert!(matches!(err, CustomRedisError::InvalidConfiguration(_)));
        }

        #[test]
        fn test_server_response_error_stays_redis() {
            let err = CustomRedisError::from_redis_kind(RedisErrorKind::ResponseError, "WRONGTYPE");
            assert!(matches!(err, CustomRedisError::Redis(_)));
            assert_eq!(err.kind(), "redis");
        }

        #[tokio::test]
        async fn test_elapsed_is_timeout() {
            let elapsed = tokio::time::timeout(
                std::time::Duration::from_millis(1),
                std::future::pending::<()>(),
            )
            .await
            .unwrap_err();
            let err: CustomRedisError = elapsed.into();
            assert!(matches!(err, CustomRedisError::Timeout));
            assert_eq!(err.kind(), "timeout");
        }
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Client, CustomRedisError};

/// In-memory stand-in for `RedisClient`.
///
/// Values written with `setex` can be read back with `get`, so handlers can be
/// exercised end to end. Any operation can be forced to fail with `*_error`,
/// and every call is recorded for assertions.
#[derive(Clone, Default)]
pub struct MockRedisClient {
    store: Arc<Mutex<HashMap<String, (String, u64)>>>,
    ping_error: Option<CustomRedisError>,
    get_error: Option<CustomRedisError>,
    set_error: Option<CustomRedisError>,
    del_error: Option<CustomRedisError>,
    close_error: Option<CustomRedisError>,
    close_hangs: bool,
    calls: Arc<Mutex<Vec<MockRedisCall>>>,
}

impl MockRedisClient {
    pub fn new() -> Self {
        Self::default()
    }

    // Helper method to safely lock the calls mutex
    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockRedisCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, u64)>> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, op: &str, key: &str, value: MockRedisValue) {
        self.lock_calls().push(MockRedisCall {
            op: op.to_string(),
            key: key.to_string(),
            value,
        });
    }

    /// Seed a value without recording a call.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.lock_store()
            .insert(key.to_owned(), (value.to_owned(), 0));
        self
    }

    pub fn ping_error(mut self, err: CustomRedisError) -> Self {
        self.ping_error = Some(err);
        self
    }

    pub fn get_error(mut self, err: CustomRedisError) -> Self {
        self.get_error = Some(err);
        self
    }

    pub fn set_error(mut self, err: CustomRedisError) -> Self {
        self.set_error = Some(err);
        self
    }

    pub fn del_error(mut self, err: CustomRedisError) -> Self {
        self.del_error = Some(err);
        self
    }

    pub fn close_error(mut self, err: CustomRedisError) -> Self {
        self.close_error = Some(err);
        self
    }

    /// Make `close` never complete, like a server that stopped answering.
    pub fn close_hangs(mut self) -> Self {
        self.close_hangs = true;
        self
    }

    pub fn get_calls(&self) -> Vec<MockRedisCall> {
        self.lock_calls().clone()
    }

    /// TTL recorded by the last `setex` for `key`, if the key is present.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.lock_store().get(key).map(|(_, ttl)| *ttl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRedisValue {
    None,
    StringWithTTL(String, u64),
}

#[derive(Debug, Clone)]
pub struct MockRedisCall {
    pub op: String,
    pub key: String,
    pub value: MockRedisValue,
}

#[async_trait]
impl Client for MockRedisClient {
    async fn ping(&self) -> Result<(), CustomRedisError> {
        self.record("ping", "", MockRedisValue::None);

        match &self.ping_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn get(&self, key: String) -> Result<Option<String>, CustomRedisError> {
        self.record("get", &key, MockRedisValue::None);

        if let Some(err) = &self.get_error {
            return Err(err.clone());
        }
        Ok(self.lock_store().get(&key).map(|(v, _)| v.clone()))
    }

    async fn setex(
        &self,
        key: String,
        value: String,
        seconds: u64,
    ) -> Result<(), CustomRedisError> {
        self.record(
            "setex",
            &key,
            MockRedisValue::StringWithTTL(value.clone(), seconds),
        );

        if let Some(err) = &self.set_error {
            return Err(err.clone());
        }
        self.lock_store().insert(key, (value, seconds));
        Ok(())
    }

    async fn del(&self, key: String) -> Result<bool, CustomRedisError> {
        self.record("del", &key, MockRedisValue::None);

        if let Some(err) = &self.del_error {
            return Err(err.clone());
        }
        Ok(self.lock_store().remove(&key).is_some())
    }

    async fn close(&self) -> Result<(), CustomRedisError> {
        self.record("close", "", MockRedisValue::None);

        if self.close_hangs {
            std::future::pending::<()>().await;
        }
        match &self.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setex_then_get_returns_value() {
        let client = MockRedisClient::new();

        client
            .setex("foo".to_string(), "bar".to_string(), 60)
            .await
            .unwrap();

        assert_eq!(
            client.get("foo".to_string()).await.unwrap(),
            Some("bar".to_string())
        );
        assert_eq!(client.ttl_of("foo"), Some(60));
    }

    #[tokio::test]
    async fn test_del_reports_whether_key_existed() {
        let client = MockRedisClient::new().with_value("foo", "bar");

        assert!(client.del("foo".to_string()).await.unwrap());
        assert!(!client.del("foo".to_string()).await.unwrap());
        assert_eq!(client.get("foo".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_errors_are_returned() {
        let client = MockRedisClient::new()
            .ping_error(CustomRedisError::Timeout)
            .set_error(CustomRedisError::Timeout);

        assert!(matches!(
            client.ping().await,
            Err(CustomRedisError::Timeout)
        ));
        assert!(client
            .setex("k".to_string(), "v".to_string(), 1)
            .await
            .is_err());
        // A failed write leaves nothing behind
        assert_eq!(client.get("k".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let client = MockRedisClient::new();

        client.ping().await.unwrap();
        client
            .setex("k".to_string(), "v".to_string(), 5)
            .await
            .unwrap();
        client.get("k".to_string()).await.unwrap();

        let calls = client.get_calls();
        let ops: Vec<&str> = calls.iter().map(|c| c.op.as_str()).collect();
        assert_eq!(ops, vec!["ping", "setex", "get"]);
        assert_eq!(
            calls[1].value,
            MockRedisValue::StringWithTTL("v".to_string(), 5)
        );
    }
}

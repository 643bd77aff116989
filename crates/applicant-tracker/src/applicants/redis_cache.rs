//! Redis-backed [`PageCache`].
//!
//! The connection is established lazily with a single connect attempt per
//! call. While Redis is down every call fails fast and the next one tries again.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::OnceCell;
use tracing::info;

use super::cache::{CacheError, PageCache};
use crate::config::CacheConfig;

const SCAN_BATCH: usize = 100;
/// Reconnect attempts after a failed connect within one call.
const CONNECT_RETRIES: usize = 0;

pub struct RedisPageCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    connect_timeout: Duration,
}

impl From<RedisError> for CacheError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

impl RedisPageCache {
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url())
            .map_err(|err| CacheError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            connect_timeout: config.connect_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(CONNECT_RETRIES)
                    .set_connection_timeout(self.connect_timeout);
                let manager = self
                    .client
                    .get_connection_manager_with_config(config)
                    .await?;
                info!("redis connected");
                Ok::<_, RedisError>(manager)
            })
            .await?;

        Ok(manager.clone())
    }

    /// Round-trip check used at startup to log cache availability.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, payload, seconds).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: usize = conn.del(&keys).await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }
}

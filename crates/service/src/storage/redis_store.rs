use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::GroupStore;
use crate::errors::ServiceError;

/// Group store backed by one Redis hash per group (`<prefix><group>`).
///
/// The connection is opened by the first operation and shared by every
/// later one. Connecting is a single attempt and failures are returned as-is;
/// a failed connect leaves nothing cached, so the next operation tries once more.
pub struct RedisGroupStore {
    client: RedisClient,
    conn: OnceCell<MultiplexedConnection>,
    key_prefix: String,
}

impl RedisGroupStore {
    /// Parse `url` without connecting.
    pub fn new(url: &str, key_prefix: impl Into<String>) -> Result<Self, ServiceError> {
        let client = RedisClient::open(url)?;
        Ok(Self { client, conn: OnceCell::new(), key_prefix: key_prefix.into() })
    }

    pub fn hash_key(&self, group: &str) -> String {
        format!("{}{}", self.key_prefix, group)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, ServiceError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = self.client.get_multiplexed_async_connection().await?;
                info!(addr = %self.client.get_connection_info().addr, "redis connection established");
                Ok::<_, redis::RedisError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl GroupStore for RedisGroupStore {
    async fn put(&self, group: &str, id: &str, value: &str) -> Result<(), ServiceError> {
        let mut conn = self.connection().await?;
        let key = self.hash_key(group);
        let _: i64 = conn.hset(&key, id, value).await?;
        debug!(%key, field = %id, "hset");
        Ok(())
    }

    async fn remove(&self, group: &str, id: &str) -> Result<u64, ServiceError> {
        let mut conn = self.connection().await?;
        let key = self.hash_key(group);
        let removed: u64 = conn.hdel(&key, id).await?;
        debug!(%key, field = %id, removed, "hdel");
        Ok(removed)
    }

    async fn list(&self, group: &str) -> Result<HashMap<String, String>, ServiceError> {
        let mut conn = self.connection().await?;
        let key = self.hash_key(group);
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        debug!(%key, count = fields.len(), "hgetall");
        Ok(fields)
    }
}

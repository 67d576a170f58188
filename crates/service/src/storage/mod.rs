//! Per-group hash storage.
//!
//! Every group is one hash map on the store: field = item fingerprint,
//! value = item JSON text. Implementations only have to provide the three
//! field-level operations below; each must be atomic on its own.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use configs::{StoreBackend, StoreConfig};

use crate::errors::ServiceError;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryGroupStore;
pub use redis_store::RedisGroupStore;

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Set field `id` of `group` to `value`, creating the group if needed.
    async fn put(&self, group: &str, id: &str, value: &str) -> Result<(), ServiceError>;
    /// Delete field `id` of `group`; returns how many fields were removed (0 or 1).
    async fn remove(&self, group: &str, id: &str) -> Result<u64, ServiceError>;
    /// All fields of `group`; empty when the group does not exist.
    async fn list(&self, group: &str) -> Result<HashMap<String, String>, ServiceError>;
}

/// Build the store selected by configuration. The Redis store does not
/// connect here; the connection is opened by its first operation.
pub fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn GroupStore>, ServiceError> {
    match cfg.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisGroupStore::new(cfg.url(), cfg.key_prefix.clone())?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryGroupStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_memory_store_is_usable() -> Result<(), anyhow::Error> {
        let cfg = StoreConfig { backend: StoreBackend::Memory, ..StoreConfig::default() };
        let store = build_store(&cfg)?;
        store.put("g", "id", "1").await?;
        assert_eq!(store.list("g").await?.len(), 1);
        Ok(())
    }

    #[test]
    fn build_redis_store_does_not_connect() {
        // Nothing listens on port 1; building must still succeed.
        let cfg = StoreConfig { url: Some("redis://127.0.0.1:1/0".into()), ..StoreConfig::default() };
        assert!(build_store(&cfg).is_ok());
    }

    #[test]
    fn build_redis_store_rejects_bad_url() {
        let cfg = StoreConfig { url: Some("not a url".into()), ..StoreConfig::default() };
        assert!(matches!(build_store(&cfg), Err(ServiceError::Store(_))));
    }
}

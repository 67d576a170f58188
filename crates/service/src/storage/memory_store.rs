use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::GroupStore;
use crate::errors::ServiceError;

/// In-process group store for tests and local runs without Redis.
///
/// Mirrors Redis hash semantics: a group disappears once its last field is
/// removed.
#[derive(Default)]
pub struct MemoryGroupStore {
    inner: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of groups currently holding at least one item.
    pub async fn group_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn put(&self, group: &str, id: &str, value: &str) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.entry(group.to_string())
            .or_default()
            .insert(id.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, group: &str, id: &str) -> Result<u64, ServiceError> {
        let mut map = self.inner.write().await;
        let Some(fields) = map.get_mut(group) else {
            return Ok(0);
        };
        let removed = fields.remove(id).is_some();
        if fields.is_empty() {
            map.remove(group);
        }
        Ok(u64::from(removed))
    }

    async fn list(&self, group: &str) -> Result<HashMap<String, String>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(group).cloned().unwrap_or_default())
    }
}

//! Item operations: validate a request, derive the item id and run exactly
//! one store operation.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::ServiceError;
use crate::fingerprint::{canonical_json, fingerprint};
use crate::storage::GroupStore;

pub const MSG_MISSING_GROUP_OR_VALUE: &str = "missing group or value";
pub const MSG_MISSING_GROUP_OR_VALUE_ID: &str = "missing group or value_id";
pub const MSG_MISSING_GROUP: &str = "missing group";

/// Body of `POST /set`. Fields stay optional so presence is checked here
/// rather than by the deserializer; `null` counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpsertItem {
    pub group: Option<String>,
    pub value: Option<Value>,
}

/// Body of `DELETE /del`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteItem {
    pub group: Option<String>,
    pub value_id: Option<Value>,
}

/// Query of `GET /list`.
#[derive(Debug, Default, Deserialize)]
pub struct ListItems {
    pub group: Option<String>,
}

#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn GroupStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    /// Store `value` under its fingerprint; returns the fingerprint.
    /// Storing the same content twice overwrites the same field.
    pub async fn upsert(&self, req: UpsertItem) -> Result<String, ServiceError> {
        let (group, value) = match (non_empty(req.group), req.value) {
            (Some(group), Some(value)) => (group, value),
            _ => return Err(ServiceError::Validation(MSG_MISSING_GROUP_OR_VALUE.into())),
        };

        let value_id = fingerprint(&value);
        self.store.put(&group, &value_id, &canonical_json(&value)).await?;
        info!(%group, %value_id, "item stored");
        Ok(value_id)
    }

    pub async fn delete(&self, req: DeleteItem) -> Result<(), ServiceError> {
        let (group, value_id) = match (non_empty(req.group), req.value_id.and_then(field_name)) {
            (Some(group), Some(value_id)) => (group, value_id),
            _ => return Err(ServiceError::Validation(MSG_MISSING_GROUP_OR_VALUE_ID.into())),
        };

        let removed = self.store.remove(&group, &value_id).await?;
        if removed == 0 {
            return Err(ServiceError::not_found_in_group(&group));
        }
        info!(%group, %value_id, "item deleted");
        Ok(())
    }

    /// All items of a group keyed by fingerprint, plus the group name.
    pub async fn list(&self, req: ListItems) -> Result<(String, Map<String, Value>), ServiceError> {
        let Some(group) = non_empty(req.group) else {
            return Err(ServiceError::Validation(MSG_MISSING_GROUP.into()));
        };

        let fields = self.store.list(&group).await?;
        let mut values = Map::new();
        for (value_id, text) in fields {
            let value = serde_json::from_str(&text).map_err(|source| ServiceError::Corrupt {
                group: group.clone(),
                value_id: value_id.clone(),
                source,
            })?;
            values.insert(value_id, value);
        }
        info!(%group, count = values.len(), "items listed");
        Ok((group, values))
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Hash field addressed by a `value_id`. Numbers are accepted in their text
/// form; anything else but a string is rejected.
fn field_name(value_id: Value) -> Option<String> {
    match value_id {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

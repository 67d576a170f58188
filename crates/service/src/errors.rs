use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),
    #[error("stored value {value_id} in group {group} is not valid JSON: {source}")]
    Corrupt {
        group: String,
        value_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn not_found_in_group(group: &str) -> Self {
        Self::NotFound(format!("value not found in group {}", group))
    }
}

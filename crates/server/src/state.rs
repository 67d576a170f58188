use std::sync::Arc;

use service::items::ItemService;
use service::storage::GroupStore;

/// Shared handler state. Cloned per request; the store behind it is shared.
#[derive(Clone)]
pub struct AppState {
    pub items: ItemService,
}

impl AppState {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { items: ItemService::new(store) }
    }
}

//! Shared application state for all routes. Holds no instance data; every
//! request reads through the store.

use crate::store::GraphStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GraphStore>,
    /// First path segment of the API, e.g. `api` in `/api/Drone/1`.
    pub api_name: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>, api_name: &str) -> Self {
        Self {
            store,
            api_name: Arc::from(api_name),
        }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }
}

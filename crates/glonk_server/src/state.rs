use std::sync::Arc;

use glonk_core::{RecordStore, Registry};

/// Shared by every request: the store façade and the immutable registry.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, registry: Arc<Registry>) -> Self {
        Self { store, registry }
    }
}

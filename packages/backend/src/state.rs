use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::store::{ContentProvider, RecordStore};

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    store: Arc<dyn RecordStore>,
    content: Arc<dyn ContentProvider>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        content: Arc<dyn ContentProvider>,
        config: Config,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            store,
            content,
            config: Arc::new(config),
        }
    }

    /// One backend serving both traits, e.g. [`crate::store::SqliteStore`]
    pub fn with_store<S>(store: Arc<S>, config: Config) -> Self
    where
        S: RecordStore + ContentProvider + 'static,
    {
        let content: Arc<dyn ContentProvider> = store.clone();
        Self::new(store, content, config)
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn content(&self) -> &dyn ContentProvider {
        self.content.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::hierarchy::TreeCache;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
    /// Memoized hierarchy builds
    pub trees: Arc<TreeCache>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let trees = TreeCache::new(config.hierarchy.cache_capacity);
        Self {
            db,
            config: Arc::new(config),
            trees: Arc::new(trees),
        }
    }

    /// Levels used when neither the request nor the settings table names one
    pub fn default_levels(&self) -> u32 {
        self.config.hierarchy.default_levels
    }
}

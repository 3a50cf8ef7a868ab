//! Memoized hierarchy builds
//!
//! Entries are keyed by the table fingerprint plus the build options, so a
//! change to any row produces a new key. Stale keys are never read again and
//! the whole map is dropped once it reaches capacity.

use dashmap::DashMap;
use std::sync::Arc;

use super::builder::{build_forest, BuildOptions};
use super::node::HierarchyNode;
use super::tables::OrgTables;

pub struct TreeCache {
    entries: DashMap<String, Arc<Vec<HierarchyNode>>>,
    capacity: usize,
}

impl TreeCache {
    /// A capacity of zero disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached forest for these inputs, building it on a miss
    pub fn get_or_build(&self, tables: &OrgTables, options: &BuildOptions) -> Arc<Vec<HierarchyNode>> {
        if self.capacity == 0 {
            return Arc::new(build_forest(tables.view(), options));
        }

        let key = match cache_key(tables, options) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Could not fingerprint hierarchy input: {}", e);
                return Arc::new(build_forest(tables.view(), options));
            }
        };

        if let Some(hit) = self.entries.get(&key) {
            return hit.clone();
        }

        let forest = Arc::new(build_forest(tables.view(), options));
        if self.entries.len() >= self.capacity {
            tracing::debug!("Tree cache full ({} entries), clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(key, forest.clone());
        forest
    }
}

fn cache_key(tables: &OrgTables, options: &BuildOptions) -> Result<String, serde_json::Error> {
    Ok(format!(
        "{}:{}",
        tables.fingerprint()?,
        serde_json::to_string(options)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::builder::tests::chain;

    #[test]
    fn test_hit_returns_same_forest() {
        let cache = TreeCache::new(8);
        let tables = chain();
        let options = BuildOptions::new(3);

        let a = cache.get_or_build(&tables, &options);
        let b = cache.get_or_build(&tables, &options);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_input_rebuilds() {
        let cache = TreeCache::new(8);
        let mut tables = chain();
        let options = BuildOptions::new(3);

        let before = cache.get_or_build(&tables, &options);
        tables.position_departments[0].vacancies = 4;
        let after = cache.get_or_build(&tables, &options);

        assert!(!Arc::ptr_eq(&before, &after));
        assert_ne!(before, after);
        assert_eq!(cache.len(), 2);

        let other_depth = cache.get_or_build(&tables, &BuildOptions::new(1));
        assert_ne!(after, other_depth);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let cache = TreeCache::new(2);
        let tables = chain();
        for levels in 1..=5 {
            cache.get_or_build(&tables, &BuildOptions::new(levels));
            assert!(cache.len() <= 2);
        }

        let disabled = TreeCache::new(0);
        disabled.get_or_build(&tables, &BuildOptions::new(2));
        assert!(disabled.is_empty());
    }
}

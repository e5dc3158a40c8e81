use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use log::trace;

use crate::{path::GlobalPath, types::ModuleDefinition};

/// Outcome of [`ModuleCache::register`].
#[derive(Debug, Clone)]
pub enum Registration {
    /// The record was inserted by this call
    Inserted(Arc<ModuleDefinition>),
    /// Another caller registered the path first; its record is returned
    Existing(Arc<ModuleDefinition>),
}

impl Registration {
    pub fn into_module(self) -> Arc<ModuleDefinition> {
        match self {
            Registration::Inserted(m) | Registration::Existing(m) => m,
        }
    }
}

/// Absolute path to module record. Every parsed file lives here exactly once.
///
/// Handles are shared (`Arc`), so a record finalized after registration is seen
/// by everyone holding it.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: DashMap<GlobalPath, Arc<ModuleDefinition>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, path: &GlobalPath) -> bool {
        self.modules.contains_key(path)
    }

    pub fn get(&self, path: &GlobalPath) -> Option<Arc<ModuleDefinition>> {
        self.modules.get(path).map(|m| Arc::clone(m.value()))
    }

    /// Inserts or replaces the record for `module.path()` and returns the stored handle.
    pub fn set(&self, module: ModuleDefinition) -> Arc<ModuleDefinition> {
        let module = Arc::new(module);
        self.modules.insert(module.path().clone(), Arc::clone(&module));
        module
    }

    /// Inserts `module` only if its path is absent. Check and insert are atomic.
    pub fn register(&self, module: ModuleDefinition) -> Registration {
        match self.modules.entry(module.path().clone()) {
            Entry::Occupied(e) => {
                trace!("Module already registered: {}", e.key());
                Registration::Existing(Arc::clone(e.get()))
            }
            Entry::Vacant(e) => {
                let module = Arc::new(module);
                e.insert(Arc::clone(&module));
                Registration::Inserted(module)
            }
        }
    }

    pub fn clear(&self) {
        self.modules.clear();
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All cached paths, sorted.
    pub fn paths(&self) -> Vec<GlobalPath> {
        let mut paths: Vec<GlobalPath> = self.modules.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// All cached records, sorted by path.
    pub fn modules(&self) -> Vec<Arc<ModuleDefinition>> {
        let mut modules: Vec<_> = self.modules.iter().map(|e| Arc::clone(e.value())).collect();
        modules.sort_by(|a, b| a.path().cmp(b.path()));
        modules
    }

    pub fn pending_count(&self) -> usize {
        self.modules.iter().filter(|e| !e.value().is_resolved()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str) -> ModuleDefinition {
        ModuleDefinition::pending(GlobalPath::new(path).unwrap(), None, String::new())
    }

    #[test]
    fn test_set_then_get_returns_same_record() {
        let cache = ModuleCache::new();
        let stored = cache.set(module("/repo/a.ts"));
        let fetched = cache.get(stored.path()).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert!(cache.has(stored.path()));
    }

    #[test]
    fn test_finalize_is_visible_through_cache() {
        let cache = ModuleCache::new();
        let stored = cache.set(module("/repo/a.ts"));
        assert!(!cache.get(stored.path()).unwrap().is_resolved());
        stored.finalize(Vec::new());
        assert!(cache.get(stored.path()).unwrap().is_resolved());
    }

    #[test]
    fn test_register_keeps_first_record() {
        let cache = ModuleCache::new();
        let first = cache.register(module("/repo/a.ts"));
        assert!(matches!(first, Registration::Inserted(_)));
        let second = cache.register(module("/repo/a.ts"));
        let Registration::Existing(existing) = second else {
            panic!("expected existing registration");
        };
        assert!(Arc::ptr_eq(&first.into_module(), &existing));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_replaces() {
        let cache = ModuleCache::new();
        let first = cache.set(module("/repo/a.ts"));
        let second = cache.set(module("/repo/a.ts"));
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&cache.get(first.path()).unwrap(), &second));
    }

    #[test]
    fn test_paths_sorted_and_clear() {
        let cache = ModuleCache::new();
        cache.set(module("/repo/b.ts"));
        cache.set(module("/repo/a.ts"));
        let paths: Vec<String> = cache.paths().into_iter().map(|p| p.into_string()).collect();
        assert_eq!(paths, vec!["/repo/a.ts", "/repo/b.ts"]);
        assert_eq!(cache.pending_count(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&GlobalPath::new("/repo/a.ts").unwrap()).is_none());
    }
}

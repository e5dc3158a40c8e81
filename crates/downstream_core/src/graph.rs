use std::{collections::HashSet, sync::Arc};

use log::trace;

use crate::{cache::ModuleCache, path::GlobalPath, types::ModuleDefinition};

/// Every cached module reachable from `entry` through resolved edges, `entry`
/// included, sorted by path. Edges to modules absent from the cache are skipped.
pub fn reachable_from(cache: &ModuleCache, entry: &GlobalPath) -> Vec<Arc<ModuleDefinition>> {
    let mut seen: HashSet<GlobalPath> = HashSet::new();
    let mut stack = vec![entry.clone()];
    let mut reachable = Vec::new();

    while let Some(path) = stack.pop() {
        if !seen.insert(path.clone()) {
            continue;
        }
        let Some(module) = cache.get(&path) else {
            trace!("Not cached, stopping at {}", path);
            continue;
        };
        for import in module.imports().iter().rev() {
            if !seen.contains(&import.path) {
                stack.push(import.path.clone());
            }
        }
        reachable.push(module);
    }

    reachable.sort_by(|a, b| a.path().cmp(b.path()));
    reachable
}

/// Cached modules with an edge pointing at `target`, sorted by path.
pub fn importers_of(cache: &ModuleCache, target: &GlobalPath) -> Vec<Arc<ModuleDefinition>> {
    cache
        .modules()
        .into_iter()
        .filter(|m| m.imports().iter().any(|i| &i.path == target))
        .collect()
}

/// Cached records for the edges of `path`, in edge order. Uncached targets are left out.
pub fn children_of(cache: &ModuleCache, path: &GlobalPath) -> Vec<Arc<ModuleDefinition>> {
    let Some(module) = cache.get(path) else {
        return Vec::new();
    };
    module.imports().iter().filter_map(|i| cache.get(&i.path)).collect()
}

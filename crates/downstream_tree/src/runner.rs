use anyhow::{Result, anyhow};
use log::{debug, info, warn};

use downstream_core::{GlobalPath, ImportResolver, ModuleCache, collect_entries};

use crate::{
    config::Config,
    types::{EntryFailure, TreeReport},
};

pub fn run_tree(mut cfg: Config) -> Result<TreeReport> {
    info!("Starting import tree resolution");

    cfg.initialize()?;
    let root = cfg.root()?.clone();

    let entries: Vec<GlobalPath> = if cfg.entries.is_empty() {
        debug!("Collecting entry files with glob: {:?}", cfg.entry_glob);
        collect_entries(&root, cfg.entry_glob.as_deref())?
    } else {
        cfg.entries.iter().map(|e| GlobalPath::from_path(e)).collect::<Result<_, _>>()?
    };
    if entries.is_empty() {
        warn!("No entry files found under {}", root.display());
        return Err(anyhow!("No entry files found under {}", root.display()));
    }
    info!("Resolving {} entry files", entries.len());

    let cache = ModuleCache::new();
    let (results, modules_parsed) = {
        let resolver = ImportResolver::new(&cfg.workspace, &cache)
            .with_options(cfg.resolver_options());
        let results = resolver.resolve_many(&entries, cfg.resolution_depth());
        (results, resolver.parsed_count())
    };

    let mut resolved = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();
    for (path, result) in entries.into_iter().zip(results) {
        match result {
            Ok(_) => resolved.push(path),
            Err(e) => {
                warn!("Failed to resolve entry {}: {}", path, e);
                failures.push(EntryFailure { path, error: e.to_string() });
            }
        }
    }

    info!(
        "Import tree resolution complete: {} modules cached, {} failed entries",
        cache.len(),
        failures.len()
    );
    Ok(TreeReport { root, entries: resolved, failures, cache, modules_parsed })
}

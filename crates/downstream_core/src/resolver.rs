//! Parse-and-resolve traversal over import statements.
//!
//! A module is registered in the [`ModuleCache`] as pending *before* any of its
//! imports are followed, so an import cycle reaching back to it hits the cache.
//! Traversal is breadth-first with an explicit frontier: every round loads the
//! newly discovered files in parallel, so graph depth never grows the stack.
//! Edges are kept in source order.

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use dashmap::DashMap;
use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::{
    cache::{ModuleCache, Registration},
    constants::{BARREL_STEM, DEFAULT_FAIL_THRESHOLD, DEFAULT_WARN_THRESHOLD, RESOLVE_EXTENSIONS},
    error::{Error, Result},
    fs::{FileSystem, OsFileSystem},
    package::{PackageJsonFile, WorkspacePackageMap, find_nearest_package_json},
    parser::parse_imports,
    path::{GlobalPath, LibraryPath, RelativePath},
    types::{ImportDefinition, ImportType, ModuleDefinition, RawImport},
};

/// How far below the starting module imports are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    #[default]
    Unlimited,
    /// `Levels(0)` parses only the starting module; its import targets are
    /// recorded as edges but not parsed.
    Levels(usize),
}

impl Depth {
    /// Depth for the imports of a module resolved at `self`, `None` once exhausted.
    fn descend(self) -> Option<Depth> {
        match self {
            Depth::Unlimited => Some(Depth::Unlimited),
            Depth::Levels(0) => None,
            Depth::Levels(n) => Some(Depth::Levels(n - 1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Extensions (with leading dot) tried in order when an import omits one
    pub extensions: Vec<String>,
    /// Parsed modules after which a runaway warning is logged
    pub warn_threshold: usize,
    /// Parsed modules after which the traversal fails
    pub fail_threshold: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            extensions: RESOLVE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            fail_threshold: DEFAULT_FAIL_THRESHOLD,
        }
    }
}

/// A freshly registered module whose imports have not been followed yet.
struct Parsed {
    module: Arc<ModuleDefinition>,
    raw_imports: Vec<RawImport>,
    /// Resolved target per raw import, `None` when unresolvable
    targets: Vec<Option<(GlobalPath, ImportType)>>,
}

enum Loaded {
    Parsed(Parsed),
    Cached(Arc<ModuleDefinition>),
}

/// One traversal over the import graph.
///
/// Borrows the workspace map and the module cache; everything else (visit
/// counter, memoized `package.json` lookups) is scoped to this value.
pub struct ImportResolver<'a, F: FileSystem = OsFileSystem> {
    workspace: &'a WorkspacePackageMap,
    cache: &'a ModuleCache,
    fs: F,
    options: ResolverOptions,
    parsed: AtomicUsize,
    warned: AtomicBool,
    manifests: DashMap<GlobalPath, Option<Arc<PackageJsonFile>>>,
}

impl<'a> ImportResolver<'a, OsFileSystem> {
    pub fn new(workspace: &'a WorkspacePackageMap, cache: &'a ModuleCache) -> Self {
        Self {
            workspace,
            cache,
            fs: OsFileSystem,
            options: ResolverOptions::default(),
            parsed: AtomicUsize::new(0),
            warned: AtomicBool::new(false),
            manifests: DashMap::new(),
        }
    }
}

impl<'a, F: FileSystem> ImportResolver<'a, F> {
    pub fn with_file_system<G: FileSystem>(self, fs: G) -> ImportResolver<'a, G> {
        ImportResolver {
            workspace: self.workspace,
            cache: self.cache,
            fs,
            options: self.options,
            parsed: self.parsed,
            warned: self.warned,
            manifests: self.manifests,
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of files parsed so far by this traversal.
    pub fn parsed_count(&self) -> usize {
        self.parsed.load(Ordering::Relaxed)
    }

    /// Resolves the module at `path` and, up to `depth`, everything it imports.
    ///
    /// Returns the cached record when `path` was seen before, which may still be
    /// pending if `path` is part of an import cycle being resolved. A failure to
    /// read `path` itself is returned; failures of imported files only drop the
    /// corresponding edge.
    pub fn resolve(&self, path: &GlobalPath, depth: Depth) -> Result<Arc<ModuleDefinition>> {
        match self.load(path)? {
            Loaded::Cached(module) => Ok(module),
            Loaded::Parsed(parsed) => {
                let module = Arc::clone(&parsed.module);
                self.settle(vec![parsed], depth)?;
                Ok(module)
            }
        }
    }

    /// Resolves several entry points in one traversal. Results are in input order.
    ///
    /// If the traversal hits the runaway limit, every entry that was read reports
    /// [`Error::RunawayRecursion`].
    pub fn resolve_many(
        &self,
        paths: &[GlobalPath],
        depth: Depth,
    ) -> Vec<Result<Arc<ModuleDefinition>>> {
        let loaded: Vec<Result<Loaded>> = paths.par_iter().map(|path| self.load(path)).collect();

        let mut parents = Vec::new();
        let results: Vec<Result<Arc<ModuleDefinition>>> = loaded
            .into_iter()
            .map(|result| {
                result.map(|loaded| match loaded {
                    Loaded::Cached(module) => module,
                    Loaded::Parsed(parsed) => {
                        let module = Arc::clone(&parsed.module);
                        parents.push(parsed);
                        module
                    }
                })
            })
            .collect();

        if let Err(e) = self.settle(parents, depth) {
            warn!("Traversal aborted: {}", e);
            let limit = self.options.fail_threshold;
            return results
                .into_iter()
                .map(|r| r.and_then(|_| Err(Error::RunawayRecursion { limit })))
                .collect();
        }
        results
    }

    /// Parses the direct imports of `path` one level deep, as a tree expand would.
    ///
    /// `path` itself is resolved first (one level) if it is not cached yet. Children
    /// that fail to resolve are logged and left out.
    pub fn expand(&self, path: &GlobalPath) -> Result<Vec<Arc<ModuleDefinition>>> {
        let module = match self.cache.get(path) {
            Some(module) => module,
            None => self.resolve(path, Depth::Levels(0))?,
        };
        let targets: Vec<GlobalPath> = module.imports().iter().map(|i| i.path.clone()).collect();
        debug!("Expanding {} ({} imports)", path, targets.len());

        let mut children = Vec::with_capacity(targets.len());
        for (target, result) in targets.iter().zip(self.resolve_many(&targets, Depth::Levels(0))) {
            match result {
                Ok(child) => children.push(child),
                Err(e) => warn!("Failed to expand {}: {}", target, e),
            }
        }
        Ok(children)
    }

    /// Maps an import specifier written in a file under `from_dir` to the file it
    /// names, or `None` when it is external, absolute or missing.
    pub fn resolve_specifier(
        &self,
        from_dir: &GlobalPath,
        request: &str,
    ) -> Option<(GlobalPath, ImportType)> {
        if request.starts_with('/') || Path::new(request).is_absolute() {
            trace!("Ignoring absolute import '{}'", request);
            return None;
        }

        let (candidate, import_type) = if request.starts_with('.') {
            let relative = RelativePath::new(request).ok()?;
            (from_dir.resolve(&relative), ImportType::Local)
        } else {
            let found = self.workspace.lookup(request)?;
            trace!("Matched workspace package '{}' for '{}'", found.package, request);
            (found.path, ImportType::Library)
        };

        self.infer_file(&candidate).map(|path| (path, import_type))
    }

    /// Reads, parses and registers `path`, and maps its specifiers to files.
    /// Imports are not followed.
    fn load(&self, path: &GlobalPath) -> Result<Loaded> {
        if let Some(module) = self.cache.get(path) {
            trace!("Module already cached: {}", path);
            return Ok(Loaded::Cached(module));
        }

        let count = self.track_parse()?;
        debug!("Parsing module: {} ({})", path, count);

        let contents =
            self.fs.read_to_string(path.as_path()).map_err(|e| Error::read(path.as_path(), e))?;
        let raw_imports = parse_imports(path.as_path(), &contents);
        let name = self.module_name(path);

        let pending = ModuleDefinition::pending(path.clone(), name, contents);
        let module = match self.cache.register(pending) {
            Registration::Inserted(module) => module,
            Registration::Existing(module) => {
                trace!("Module registered concurrently: {}", path);
                return Ok(Loaded::Cached(module));
            }
        };

        let from_dir = path.parent().unwrap_or_else(|| path.clone());
        let targets = raw_imports
            .iter()
            .map(|raw| {
                let target = self.resolve_specifier(&from_dir, &raw.request);
                if target.is_none() {
                    debug!("Unresolvable import '{}' from {}", raw.request, path);
                }
                target
            })
            .collect();

        Ok(Loaded::Parsed(Parsed { module, raw_imports, targets }))
    }

    /// Breadth-first over the imports of `parents`: each round loads every newly
    /// discovered target in parallel, then finalizes the previous round's modules
    /// now that all of their targets have either registered or failed.
    fn settle(&self, mut parents: Vec<Parsed>, mut depth: Depth) -> Result<()> {
        while !parents.is_empty() {
            let Some(child_depth) = depth.descend() else {
                // Not followed; an edge is kept only if its file exists
                for parent in parents {
                    self.finalize(parent, |path| self.fs.is_file(path.as_path()));
                }
                return Ok(());
            };

            let mut seen = HashSet::new();
            let frontier: Vec<GlobalPath> = parents
                .iter()
                .flat_map(|p| p.targets.iter().flatten())
                .map(|(target, _)| target)
                .filter(|target| !self.cache.has(target) && seen.insert(*target))
                .cloned()
                .collect();
            debug!("Loading {} newly discovered modules", frontier.len());

            let loaded: Vec<Result<Loaded>> =
                frontier.par_iter().map(|path| self.load(path)).collect();

            let mut next = Vec::new();
            for (path, result) in frontier.iter().zip(loaded) {
                match result {
                    Ok(Loaded::Parsed(parsed)) => next.push(parsed),
                    Ok(Loaded::Cached(_)) => {}
                    Err(e @ Error::RunawayRecursion { .. }) => return Err(e),
                    Err(e) => warn!("Dropping imports of {}: {}", path, e),
                }
            }

            for parent in parents {
                self.finalize(parent, |path| self.cache.has(path));
            }
            parents = next;
            depth = child_depth;
        }
        Ok(())
    }

    /// Records the edges whose target passes `keep`, in source order.
    fn finalize(&self, parsed: Parsed, keep: impl Fn(&GlobalPath) -> bool) {
        let Parsed { module, raw_imports, targets } = parsed;
        let imports: Vec<ImportDefinition> = raw_imports
            .iter()
            .zip(targets)
            .filter_map(|(raw, target)| {
                let (path, import_type) = target?;
                if !keep(&path) {
                    debug!("Dropping import '{}' from {}", raw.request, module.path());
                    return None;
                }
                Some(ImportDefinition::new(path, import_type, raw))
            })
            .collect();

        debug!("Resolved {} of {} imports in {}", imports.len(), raw_imports.len(), module.path());
        module.finalize(imports);
    }

    /// Extension and barrel inference: keep a supported extension, else the first
    /// existing `path + ext`, else the first existing `path/index + ext`.
    fn infer_file(&self, candidate: &GlobalPath) -> Option<GlobalPath> {
        let extension = candidate.extension();
        if self.options.extensions.iter().any(|e| *e == extension) {
            return Some(candidate.clone());
        }

        self.first_existing(|ext| candidate.concat([ext]))
            .or_else(|| self.first_existing(|ext| candidate.join([format!("{}{}", BARREL_STEM, ext)])))
    }

    fn first_existing(&self, make: impl Fn(&str) -> GlobalPath) -> Option<GlobalPath> {
        self.options
            .extensions
            .iter()
            .map(|ext| make(ext))
            .find(|path| self.fs.is_file(path.as_path()))
    }

    fn track_parse(&self) -> Result<usize> {
        let count = self.parsed.fetch_add(1, Ordering::Relaxed) + 1;
        if count > self.options.fail_threshold {
            return Err(Error::RunawayRecursion { limit: self.options.fail_threshold });
        }
        if count > self.options.warn_threshold && !self.warned.swap(true, Ordering::Relaxed) {
            warn!(
                "Traversal has parsed {} modules (warning threshold {}), check for runaway resolution",
                count, self.options.warn_threshold
            );
        }
        Ok(count)
    }

    /// `<package name>/<path below the package directory>`, `None` if the file has
    /// no enclosing named package.
    fn module_name(&self, path: &GlobalPath) -> Option<LibraryPath> {
        let manifest = self.nearest_manifest(&path.parent()?)?;
        let Some(package_name) = manifest.package.name.as_deref() else {
            debug!("{} has no name, leaving {} unnamed", manifest.path, path);
            return None;
        };
        let relative = path.relative_to(&manifest.dir()?)?;
        Some(LibraryPath::new(package_name).ok()?.join([&relative]))
    }

    fn nearest_manifest(&self, dir: &GlobalPath) -> Option<Arc<PackageJsonFile>> {
        if let Some(hit) = self.manifests.get(dir) {
            return hit.value().clone();
        }
        let found = match find_nearest_package_json(dir) {
            Ok(manifest) => Some(Arc::new(manifest)),
            Err(e) => {
                warn!("Cannot name modules under {}: {}", dir, e);
                None
            }
        };
        self.manifests.insert(dir.clone(), found.clone());
        found
    }
}

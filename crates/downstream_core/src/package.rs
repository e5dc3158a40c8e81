//! `package.json` discovery and the workspace package index.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use path_clean::clean;
use serde::Deserialize;

use crate::{
    constants::PACKAGE_JSON,
    error::{Error, Result},
    path::GlobalPath,
};

/// The subset of `package.json` the resolver cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workspaces: Option<Workspaces>,
}

/// `workspaces` is either a list of globs or yarn's `{ "packages": [...] }` form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Globs(Vec<String>),
    Config {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    pub fn patterns(&self) -> &[String] {
        match self {
            Workspaces::Globs(globs) => globs,
            Workspaces::Config { packages } => packages,
        }
    }
}

/// A parsed `package.json` and where it was found.
#[derive(Debug, Clone)]
pub struct PackageJsonFile {
    pub path: GlobalPath,
    pub package: PackageJson,
}

impl PackageJsonFile {
    /// Directory containing the manifest.
    pub fn dir(&self) -> Option<GlobalPath> {
        self.path.parent()
    }
}

pub fn read_package_json(path: &Path) -> Result<PackageJson> {
    let contents = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    serde_json::from_str(&contents)
        .map_err(|source| Error::PackageJson { path: path.to_path_buf(), source })
}

/// Walks upward from `path` to the first `package.json`.
pub fn find_nearest_package_json(path: &GlobalPath) -> Result<PackageJsonFile> {
    trace!("Searching for nearest package.json from {}", path);
    for dir in path.as_path().ancestors() {
        let candidate = dir.join(PACKAGE_JSON);
        if candidate.is_file() {
            trace!("Found package.json at {:?}", candidate);
            let package = read_package_json(&candidate)?;
            return Ok(PackageJsonFile { path: GlobalPath::from_path(&candidate)?, package });
        }
    }
    Err(Error::PackageJsonNotFound { start: path.to_path_buf() })
}

/// A workspace package matched by an import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMatch {
    pub package: String,
    /// `<package root>/<rest of the specifier>`, before extension inference
    pub path: GlobalPath,
}

/// Package name to package root directory for one monorepo.
///
/// Built once per traversal and read-only afterwards. When two packages share a
/// name the first one discovered wins (patterns in declared order, matches of one
/// pattern in sorted order).
#[derive(Debug, Clone, Default)]
pub struct WorkspacePackageMap {
    root: Option<GlobalPath>,
    packages: HashMap<String, GlobalPath>,
}

impl WorkspacePackageMap {
    /// A map with no packages, for traversals outside any workspace.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = (S, GlobalPath)>,
        S: Into<String>,
    {
        let mut map = Self::empty();
        for (name, dir) in packages {
            map.insert(name.into(), dir);
        }
        map
    }

    /// Finds the nearest `package.json` above `start` declaring `workspaces` and
    /// indexes every package its patterns match.
    pub fn build(start: &GlobalPath) -> Result<Self> {
        debug!("Searching for workspace root from {}", start);
        for dir in start.as_path().ancestors() {
            let candidate = dir.join(PACKAGE_JSON);
            if !candidate.is_file() {
                continue;
            }
            match read_package_json(&candidate) {
                Ok(PackageJson { workspaces: Some(workspaces), .. }) => {
                    debug!("Found workspace root at {:?}", dir);
                    return Self::from_workspace(dir, workspaces.patterns());
                }
                Ok(_) => trace!("{:?} declares no workspaces", candidate),
                Err(e) => warn!("Skipping unreadable manifest: {}", e),
            }
        }
        Err(Error::NoWorkspaceFound { start: start.to_path_buf() })
    }

    fn from_workspace(root: &Path, patterns: &[String]) -> Result<Self> {
        let root = GlobalPath::from_path(root)?;
        let mut map = Self { root: Some(root.clone()), packages: HashMap::new() };

        let (excludes, includes): (Vec<&String>, Vec<&String>) =
            patterns.iter().partition(|p| p.starts_with('!'));

        let mut excluded: HashSet<PathBuf> = HashSet::new();
        for pattern in excludes {
            excluded.extend(expand_glob(&root, pattern.trim_start_matches('!')));
        }

        for pattern in includes {
            let manifest_pattern = format!("{}/{}", pattern.trim_end_matches('/'), PACKAGE_JSON);
            for manifest in expand_glob(&root, &manifest_pattern) {
                if manifest.components().any(|c| c.as_os_str() == "node_modules") {
                    continue;
                }
                let Some(dir) = manifest.parent() else { continue };
                if excluded.contains(dir) {
                    trace!("Excluded workspace package at {:?}", dir);
                    continue;
                }
                let package = match read_package_json(&manifest) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Skipping workspace package: {}", e);
                        continue;
                    }
                };
                let Some(name) = package.name else {
                    warn!("Workspace package at {:?} has no name, skipping", dir);
                    continue;
                };
                map.insert(name, GlobalPath::from_path(dir)?);
            }
        }

        debug!("Indexed {} workspace packages under {}", map.len(), root);
        Ok(map)
    }

    fn insert(&mut self, name: String, dir: GlobalPath) {
        if let Some(existing) = self.packages.get(&name) {
            warn!(
                "Duplicate workspace package name '{}': keeping {}, ignoring {}",
                name, existing, dir
            );
            return;
        }
        trace!("Workspace package '{}' -> {}", name, dir);
        self.packages.insert(name, dir);
    }

    /// Directory of the workspace root, when built from disk.
    pub fn root(&self) -> Option<&GlobalPath> {
        self.root.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&GlobalPath> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GlobalPath)> {
        self.packages.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Maps a bare specifier onto a workspace package: the first path segment is
    /// tried as an unscoped name, then the first two as `@scope/name`. A subpath
    /// that climbs out of the package directory matches nothing.
    pub fn lookup(&self, specifier: &str) -> Option<WorkspaceMatch> {
        let segments: Vec<&str> = specifier.split('/').collect();

        if let Some(root) = self.packages.get(segments[0]) {
            return Self::within(root, &segments[1..])
                .map(|path| WorkspaceMatch { package: segments[0].to_string(), path });
        }

        if segments.len() >= 2 {
            let scoped = segments[..2].join("/");
            if let Some(root) = self.packages.get(&scoped) {
                return Self::within(root, &segments[2..])
                    .map(|path| WorkspaceMatch { package: scoped, path });
            }
        }

        None
    }

    fn within(root: &GlobalPath, rest: &[&str]) -> Option<GlobalPath> {
        let path = root.join(rest);
        if !path.as_path().starts_with(root.as_path()) {
            warn!("Specifier subpath escapes package root {}: {}", root, rest.join("/"));
            return None;
        }
        Some(path)
    }
}

/// Expands `pattern` under `root`, returning matches in sorted order.
fn expand_glob(root: &GlobalPath, pattern: &str) -> Vec<PathBuf> {
    let pattern = pattern.trim_start_matches("./");
    let full = format!("{}/{}", glob::Pattern::escape(root.as_str()), pattern);
    let paths = match glob::glob(&full) {
        Ok(paths) => paths,
        Err(source) => {
            warn!("{}", Error::WorkspaceGlob { pattern: pattern.to_string(), source });
            return Vec::new();
        }
    };
    let mut matches: Vec<PathBuf> = paths.flatten().map(clean).collect();
    matches.sort();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn global(path: &Path) -> GlobalPath {
        GlobalPath::from_path(path).unwrap()
    }

    #[test]
    fn test_build_indexes_workspace_packages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", r#"{ "name": "repo", "workspaces": ["packages/*"] }"#);
        create_test_file(root, "packages/shared/package.json", r#"{ "name": "@scope/shared" }"#);
        create_test_file(root, "packages/ui/package.json", r#"{ "name": "ui" }"#);
        let start = create_test_file(root, "packages/ui/src/index.ts", "");

        let map = WorkspacePackageMap::build(&global(&start)).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.root(), Some(&global(root)));
        assert_eq!(map.get("@scope/shared"), Some(&global(&root.join("packages/shared"))));
        assert_eq!(map.get("ui"), Some(&global(&root.join("packages/ui"))));
        assert!(!map.contains("Ui"));
    }

    #[test]
    fn test_build_skips_manifests_without_workspaces() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", r#"{ "workspaces": { "packages": ["libs/*"] } }"#);
        create_test_file(root, "libs/a/package.json", r#"{ "name": "a" }"#);
        // nearer manifest without workspaces must be walked past
        let start = create_test_file(root, "libs/a/src/x.ts", "");

        let map = WorkspacePackageMap::build(&global(&start)).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains("a"));
    }

    #[test]
    fn test_build_without_workspace_fails() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", r#"{ "name": "solo" }"#);
        let start = create_test_file(root, "src/index.ts", "");

        let err = WorkspacePackageMap::build(&global(&start)).unwrap_err();
        assert!(matches!(err, Error::NoWorkspaceFound { .. }));
    }

    #[test]
    fn test_negated_patterns_and_unnamed_packages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "package.json",
            r#"{ "workspaces": ["packages/*", "!packages/legacy"] }"#,
        );
        create_test_file(root, "packages/core/package.json", r#"{ "name": "core" }"#);
        create_test_file(root, "packages/legacy/package.json", r#"{ "name": "legacy" }"#);
        create_test_file(root, "packages/nameless/package.json", r#"{ "private": true }"#);

        let map = WorkspacePackageMap::build(&global(root)).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains("core"));
        assert!(!map.contains("legacy"));
    }

    #[test]
    fn test_duplicate_names_first_match_wins() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", r#"{ "workspaces": ["apps/*", "packages/*"] }"#);
        create_test_file(root, "apps/dup/package.json", r#"{ "name": "dup" }"#);
        create_test_file(root, "packages/dup/package.json", r#"{ "name": "dup" }"#);

        let map = WorkspacePackageMap::build(&global(root)).unwrap();
        assert_eq!(map.get("dup"), Some(&global(&root.join("apps/dup"))));
    }

    #[test]
    fn test_node_modules_are_not_indexed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", r#"{ "workspaces": ["packages/**"] }"#);
        create_test_file(root, "packages/a/package.json", r#"{ "name": "a" }"#);
        create_test_file(root, "packages/a/node_modules/dep/package.json", r#"{ "name": "dep" }"#);

        let map = WorkspacePackageMap::build(&global(root)).unwrap();
        assert!(map.contains("a"));
        assert!(!map.contains("dep"));
    }

    #[test]
    fn test_lookup_unscoped_and_scoped() {
        let map = WorkspacePackageMap::from_packages([
            ("utils", GlobalPath::new("/repo/packages/utils").unwrap()),
            ("@scope/pkg", GlobalPath::new("/repo/packages/pkg").unwrap()),
        ]);

        let unscoped = map.lookup("utils/lib/strings").unwrap();
        assert_eq!(unscoped.package, "utils");
        assert_eq!(unscoped.path.as_str(), "/repo/packages/utils/lib/strings");

        let scoped = map.lookup("@scope/pkg/lib/x").unwrap();
        assert_eq!(scoped.package, "@scope/pkg");
        assert_eq!(scoped.path.as_str(), "/repo/packages/pkg/lib/x");

        let bare = map.lookup("@scope/pkg").unwrap();
        assert_eq!(bare.path.as_str(), "/repo/packages/pkg");

        let dotted = map.lookup("utils/lib/../strings").unwrap();
        assert_eq!(dotted.path.as_str(), "/repo/packages/utils/strings");

        assert!(map.lookup("react").is_none());
        assert!(map.lookup("@scope/other").is_none());
    }

    #[test]
    fn test_find_nearest_package_json() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", r#"{ "name": "outer" }"#);
        create_test_file(root, "packages/inner/package.json", r#"{ "name": "inner" }"#);
        let file = create_test_file(root, "packages/inner/src/deep/file.ts", "");

        let found = find_nearest_package_json(&global(&file)).unwrap();
        assert_eq!(found.package.name.as_deref(), Some("inner"));
        assert_eq!(found.dir(), Some(global(&root.join("packages/inner"))));
    }

    #[test]
    fn test_find_nearest_package_json_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "package.json", "{ not json");
        let file = create_test_file(root, "src/a.ts", "");

        let err = find_nearest_package_json(&global(&file)).unwrap_err();
        assert!(matches!(err, Error::PackageJson { .. }));
    }

    #[test]
    fn test_lookup_rejects_subpaths_outside_package() {
        let map = WorkspacePackageMap::from_packages([
            ("utils", GlobalPath::new("/repo/packages/utils").unwrap()),
            ("@scope/pkg", GlobalPath::new("/repo/packages/pkg").unwrap()),
        ]);

        assert!(map.lookup("utils/../../outside").is_none());
        assert!(map.lookup("@scope/pkg/../pkg-evil/x").is_none());
        assert!(map.lookup("utils/..").is_none());
    }
}

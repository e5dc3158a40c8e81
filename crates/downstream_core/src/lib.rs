//! Import resolution and dependency graph engine for JavaScript/TypeScript monorepos.
//!
//! This crate provides:
//! - Provenance-tagged paths ([`GlobalPath`], [`RelativePath`], [`LibraryPath`])
//! - The workspace package index built from `package.json` `workspaces` globs
//! - Parsing import statements from JS/TS files
//! - A concurrent, cycle-safe resolver filling a shared [`ModuleCache`]
//! - Graph queries and entry file collection

mod cache;
mod collector;
mod config;
mod constants;
mod error;
mod fs;
mod graph;
mod package;
mod parser;
mod path;
mod resolver;
mod types;

pub use cache::{ModuleCache, Registration};
pub use collector::collect_entries;
pub use config::find_git_root;
pub use constants::{
    BARREL_STEM, DEFAULT_FAIL_THRESHOLD, DEFAULT_WARN_THRESHOLD, JS_TS_EXTENSIONS, PACKAGE_JSON,
    RESOLVE_EXTENSIONS,
};
pub use error::{Error, Result};
pub use fs::{FileSystem, OsFileSystem};
pub use graph::{children_of, importers_of, reachable_from};
pub use package::{
    PackageJson, PackageJsonFile, WorkspaceMatch, WorkspacePackageMap, Workspaces,
    find_nearest_package_json, read_package_json,
};
pub use parser::parse_imports;
pub use path::{
    Global, GlobalPath, Kind, Library, LibraryPath, PathKind, Relative, RelativePath, TypedPath,
};
pub use resolver::{Depth, ImportResolver, ResolverOptions};
pub use types::{
    ImportDefinition, ImportKind, ImportType, ModuleDefinition, ModuleState, NamedBinding,
    RawImport,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{debug, info};
use std::{env, path::PathBuf};

use downstream_core::{
    Depth, Error, GlobalPath, RESOLVE_EXTENSIONS, ResolverOptions, WorkspacePackageMap,
    find_git_root,
};

fn default_extensions() -> Vec<String> {
    RESOLVE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

#[derive(Debug, Clone, Parser)]
#[command(name = "tree")]
#[command(about = "Print the resolved import tree of JavaScript/TypeScript entry files")]
pub struct Config {
    /// Entry files (defaults to files collected under the root)
    pub entries: Vec<PathBuf>,

    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Substring filter for collected entry files
    #[arg(long)]
    pub entry_glob: Option<String>,

    /// Levels of imports to parse below each entry (unlimited when omitted)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Print the module graph as JSON
    #[arg(long)]
    pub json: bool,

    /// Extensions tried, in order, for imports that omit one
    #[arg(long, value_delimiter = ',', default_values_t = default_extensions())]
    pub extensions: Vec<String>,

    #[clap(skip)]
    pub workspace: WorkspacePackageMap,
}

impl Config {
    /// Resolves the root directory and entry paths, and loads the workspace package map
    pub fn initialize(&mut self) -> Result<()> {
        let cwd = env::current_dir()?;
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root(&cwd)?
        };
        info!("Using root directory: {}", root.display());

        self.entries = self
            .entries
            .drain(..)
            .map(|e| {
                let absolute = cwd.join(&e);
                absolute.canonicalize().unwrap_or(absolute)
            })
            .collect();

        for ext in &mut self.extensions {
            if !ext.starts_with('.') {
                ext.insert(0, '.');
            }
        }
        debug!("Extension order: {:?}", self.extensions);

        let start = GlobalPath::from_path(&root)?;
        self.workspace = match WorkspacePackageMap::build(&start) {
            Ok(map) => map,
            Err(Error::NoWorkspaceFound { .. }) => {
                info!(
                    "No workspace found above {}, resolving relative imports only",
                    root.display()
                );
                WorkspacePackageMap::empty()
            }
            Err(e) => return Err(e).context("Failed to load workspace packages"),
        };
        debug!("Found {} workspace packages", self.workspace.len());

        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    pub fn resolution_depth(&self) -> Depth {
        self.depth.map_or(Depth::Unlimited, Depth::Levels)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions { extensions: self.extensions.clone(), ..ResolverOptions::default() }
    }
}

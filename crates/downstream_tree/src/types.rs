use std::path::PathBuf;

use downstream_core::{GlobalPath, ModuleCache};

/// An entry file whose own resolution failed.
#[derive(Debug, Clone)]
pub struct EntryFailure {
    pub path: GlobalPath,
    pub error: String,
}

#[derive(Debug)]
pub struct TreeReport {
    pub root: PathBuf,
    /// Entries that resolved, in input order
    pub entries: Vec<GlobalPath>,
    pub failures: Vec<EntryFailure>,
    pub cache: ModuleCache,
    pub modules_parsed: usize,
}

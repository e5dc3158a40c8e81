use log::{debug, trace};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Nearest ancestor of `start` (inclusive) containing a `.git` entry.
pub fn find_git_root(start: &Path) -> Result<PathBuf> {
    debug!("Searching for git root from {:?}", start);

    for dir in start.ancestors() {
        let git_dir = dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", dir);
            return Ok(dir.to_path_buf());
        }
    }

    debug!("Could not find .git directory in any parent folder");
    Err(Error::GitRootNotFound { start: start.to_path_buf() })
}

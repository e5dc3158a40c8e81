use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::path::PathKind;

/// Errors produced while building the module graph.
#[derive(Debug, Error)]
pub enum Error {
    /// A typed path was constructed from an empty string
    #[error("{kind} path cannot be empty")]
    InvalidPath { kind: PathKind },

    /// No `package.json` with a `workspaces` field exists above the start path
    #[error("no package.json declaring workspaces found above {}", .start.display())]
    NoWorkspaceFound { start: PathBuf },

    /// No `package.json` exists above the start path
    #[error("no package.json found above {}", .start.display())]
    PackageJsonNotFound { start: PathBuf },

    #[error("failed to parse {}", .path.display())]
    PackageJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid workspace pattern '{pattern}'")]
    WorkspaceGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Any I/O failure other than a missing file
    #[error("failed to read {}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The traversal parsed more modules than the configured hard limit
    #[error("traversal parsed more than {limit} modules, aborting")]
    RunawayRecursion { limit: usize },

    #[error("could not find a .git directory above {}", .start.display())]
    GitRootNotFound { start: PathBuf },

    #[error(transparent)]
    Walk(#[from] ignore::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Classifies a read failure, keeping "not found" distinct from other I/O errors.
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Error::FileNotFound { path: path.to_path_buf() }
        } else {
            Error::FileRead { path: path.to_path_buf(), source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_not_found_is_distinct() {
        let err = Error::read(Path::new("/missing.ts"), io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "file not found: /missing.ts");
    }

    #[test]
    fn test_read_error_other_io_failure() {
        let err = Error::read(
            Path::new("/locked.ts"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_not_found());
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_invalid_path_message_names_kind() {
        let err = Error::InvalidPath { kind: PathKind::Library };
        assert_eq!(err.to_string(), "library path cannot be empty");
    }
}

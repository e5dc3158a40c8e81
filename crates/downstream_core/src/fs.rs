use std::{fs, io, path::Path};

/// Filesystem access used by the import resolver.
///
/// A missing file must be reported as [`io::ErrorKind::NotFound`].
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn is_file(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    /// Invalid UTF-8 is replaced with U+FFFD rather than failing the read.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        Ok(match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::Path;

use crate::{constants::JS_TS_EXTENSIONS, error::Result, path::GlobalPath};

/// Walks `root` (gitignore aware) for JS/TS entry files, sorted by path.
///
/// With `entry_glob`, files whose path relative to `root` contains it are kept.
/// Without it, anything under a `src/` directory is an entry. Test files
/// (`*.test.*`, `*.spec.*`) are always skipped.
pub fn collect_entries(root: &Path, entry_glob: Option<&str>) -> Result<Vec<GlobalPath>> {
    debug!("Walking directory tree from root: {}", root.display());
    let mut files: Vec<GlobalPath> = Vec::new();
    let walker = WalkBuilder::new(root).hidden(false).ignore(true).git_ignore(true).build();

    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        let path_str = p.to_string_lossy();
        if path_str.contains(".test.") || path_str.contains(".spec.") {
            trace!("Skipping test file: {}", path_str);
            continue;
        }

        let Some(ext) = p.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !JS_TS_EXTENSIONS.contains(&ext) {
            continue;
        }

        let Ok(rel_path) = p.strip_prefix(root) else {
            continue;
        };
        let rel_str = rel_path.to_string_lossy().replace('\\', "/");
        let matched = match entry_glob {
            Some(gl) => rel_str.contains(gl),
            None => rel_str.starts_with("src/") || rel_str.contains("/src/"),
        };
        if matched {
            trace!("Found entry file: {}", rel_str);
            files.push(GlobalPath::from_path(p)?);
        }
    }

    files.sort();
    debug!("Collected {} entry files", files.len());
    Ok(files)
}

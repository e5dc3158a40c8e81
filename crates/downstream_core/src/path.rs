//! Strings tagged with where they came from.
//!
//! A [`GlobalPath`] is an absolute filesystem path, a [`RelativePath`] is an import
//! specifier relative to some file, and a [`LibraryPath`] is a package-qualified
//! logical name such as `@scope/pkg/src/index.ts`. The tag is a marker type, so a
//! library name can never be handed to something expecting a filesystem path.
//!
//! Every combining operation (`join`, `resolve`, `concat`) keeps the tag of the
//! value it is called on.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use path_clean::clean;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Runtime view of a path's provenance tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Global,
    Relative,
    Library,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathKind::Global => "global",
            PathKind::Relative => "relative",
            PathKind::Library => "library",
        };
        f.write_str(s)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Marker trait implemented by the three provenance tags.
pub trait Kind: sealed::Sealed + Send + Sync + 'static {
    const KIND: PathKind;
}

/// Absolute filesystem path
#[derive(Debug, Clone, Copy)]
pub struct Global;

/// Raw relative import specifier
#[derive(Debug, Clone, Copy)]
pub struct Relative;

/// Package-qualified logical name
#[derive(Debug, Clone, Copy)]
pub struct Library;

impl sealed::Sealed for Global {}
impl sealed::Sealed for Relative {}
impl sealed::Sealed for Library {}

impl Kind for Global {
    const KIND: PathKind = PathKind::Global;
}
impl Kind for Relative {
    const KIND: PathKind = PathKind::Relative;
}
impl Kind for Library {
    const KIND: PathKind = PathKind::Library;
}

pub type GlobalPath = TypedPath<Global>;
pub type RelativePath = TypedPath<Relative>;
pub type LibraryPath = TypedPath<Library>;

/// An immutable path string carrying a provenance tag `K`.
pub struct TypedPath<K: Kind> {
    raw: String,
    kind: PhantomData<K>,
}

impl<K: Kind> TypedPath<K> {
    /// Creates a tagged path, normalizing separators to `/`. Global paths are also
    /// cleaned lexically (`.`/`..` collapsed), so one file has one spelling.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(Error::InvalidPath { kind: K::KIND });
        }
        let raw = match K::KIND {
            PathKind::Global => normalize(&raw),
            PathKind::Relative | PathKind::Library => unix_separators(&raw),
        };
        Ok(Self::from_raw(raw))
    }

    pub fn from_option(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(raw) => Self::new(raw),
            None => Err(Error::InvalidPath { kind: K::KIND }),
        }
    }

    fn from_raw(raw: String) -> Self {
        Self { raw, kind: PhantomData }
    }

    pub fn kind(&self) -> PathKind {
        K::KIND
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }

    /// Joins segments onto this path and normalizes the result (`.`/`..` collapsed,
    /// duplicate separators removed). Absolute segments are appended, not substituted.
    pub fn join<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = self.raw.clone();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            joined.push('/');
            joined.push_str(segment);
        }
        Self::from_raw(normalize(&joined))
    }

    /// Resolves `segment` against this path. An absolute segment replaces the base.
    pub fn resolve(&self, segment: impl AsRef<str>) -> Self {
        let segment = unix_separators(segment.as_ref());
        if segment.starts_with('/') || Path::new(&segment).is_absolute() {
            return Self::from_raw(normalize(&segment));
        }
        Self::from_raw(normalize(&format!("{}/{}", self.raw, segment)))
    }

    /// Appends raw strings without any normalization.
    pub fn concat<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut raw = self.raw.clone();
        for segment in segments {
            raw.push_str(segment.as_ref());
        }
        Self::from_raw(unix_separators(&raw))
    }

    /// Extension including the leading dot, or an empty string.
    pub fn extension(&self) -> String {
        Path::new(&self.raw)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Self> {
        Path::new(&self.raw)
            .parent()
            .map(|p| p.to_string_lossy())
            .filter(|p| !p.is_empty())
            .map(|p| Self::from_raw(unix_separators(&p)))
    }
}

impl TypedPath<Global> {
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(path.to_string_lossy().into_owned())
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.raw)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.raw)
    }

    /// The path of `self` below `base`, or `None` when `self` is not inside `base`.
    pub fn relative_to(&self, base: &GlobalPath) -> Option<RelativePath> {
        let rel = self.as_path().strip_prefix(base.as_path()).ok()?;
        RelativePath::new(rel.to_string_lossy().into_owned()).ok()
    }
}

fn unix_separators(raw: &str) -> String {
    raw.replace('\\', "/")
}

fn normalize(raw: &str) -> String {
    let cleaned = PathBuf::from(clean(unix_separators(raw).as_str()));
    unix_separators(&cleaned.to_string_lossy())
}

impl<K: Kind> Clone for TypedPath<K> {
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<K: Kind> PartialEq for TypedPath<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K: Kind> Eq for TypedPath<K> {}

impl<K: Kind> Hash for TypedPath<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: Kind> PartialOrd for TypedPath<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Kind> Ord for TypedPath<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K: Kind> fmt::Debug for TypedPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", K::KIND, self.raw)
    }
}

impl<K: Kind> fmt::Display for TypedPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<K: Kind> AsRef<str> for TypedPath<K> {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl AsRef<Path> for TypedPath<Global> {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl<K: Kind> Serialize for TypedPath<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_rejected() {
        let err = GlobalPath::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidPath { kind: PathKind::Global }));
        assert!(RelativePath::from_option(None).is_err());
        assert!(LibraryPath::new(String::new()).is_err());
    }

    #[test]
    fn test_separators_normalized_on_construction() {
        let p = GlobalPath::new(r"C:\repo\src\index.ts").unwrap();
        assert_eq!(p.as_str(), "C:/repo/src/index.ts");
        assert_eq!(p, GlobalPath::new("C:/repo/src/index.ts").unwrap());
    }

    #[test]
    fn test_global_paths_are_cleaned_on_construction() {
        let p = GlobalPath::new("/repo/src/../src/./a.ts").unwrap();
        assert_eq!(p.as_str(), "/repo/src/a.ts");
        assert_eq!(p, GlobalPath::from_path(Path::new("/repo//src/a.ts")).unwrap());
        // specifiers keep their leading `./`
        assert_eq!(RelativePath::new("./a/../b").unwrap().as_str(), "./a/../b");
    }

    #[test]
    fn test_kind_is_reported() {
        assert_eq!(GlobalPath::new("/a").unwrap().kind(), PathKind::Global);
        assert_eq!(RelativePath::new("./a").unwrap().kind(), PathKind::Relative);
        assert_eq!(LibraryPath::new("pkg").unwrap().kind(), PathKind::Library);
    }

    #[test]
    fn test_join_normalizes() {
        let base = GlobalPath::new("/repo/src").unwrap();
        let joined = base.join(["../lib", "./util.ts"]);
        assert_eq!(joined.as_str(), "/repo/lib/util.ts");
        assert_eq!(joined.kind(), PathKind::Global);
    }

    #[test]
    fn test_join_keeps_library_kind() {
        let name = LibraryPath::new("@scope/shared").unwrap();
        let rel = RelativePath::new("src/index.ts").unwrap();
        let joined = name.join([&rel]);
        assert_eq!(joined.as_str(), "@scope/shared/src/index.ts");
        assert_eq!(joined.kind(), PathKind::Library);
    }

    #[test]
    fn test_join_appends_absolute_segments() {
        let base = GlobalPath::new("/repo").unwrap();
        assert_eq!(base.join(["/packages/*", "package.json"]).as_str(), "/repo/packages/*/package.json");
    }

    #[test]
    fn test_resolve_relative_segment() {
        let dir = GlobalPath::new("/repo/src/components").unwrap();
        assert_eq!(dir.resolve("../util").as_str(), "/repo/src/util");
        assert_eq!(dir.resolve("./button").as_str(), "/repo/src/components/button");
    }

    #[test]
    fn test_resolve_absolute_segment_replaces_base() {
        let dir = GlobalPath::new("/repo/src").unwrap();
        assert_eq!(dir.resolve("/other/x").as_str(), "/other/x");
    }

    #[test]
    fn test_resolve_empty_segment_is_base() {
        let dir = GlobalPath::new("/repo/packages/shared").unwrap();
        assert_eq!(dir.resolve("").as_str(), "/repo/packages/shared");
    }

    #[test]
    fn test_concat_is_raw() {
        let p = GlobalPath::new("/repo/src/foo").unwrap();
        assert_eq!(p.concat([".ts"]).as_str(), "/repo/src/foo.ts");
        assert_eq!(p.concat(["/./", "x"]).as_str(), "/repo/src/foo/./x");
    }

    #[test]
    fn test_extension() {
        assert_eq!(GlobalPath::new("/a/b.tsx").unwrap().extension(), ".tsx");
        assert_eq!(GlobalPath::new("/a/b").unwrap().extension(), "");
        assert_eq!(GlobalPath::new("/a/b.test.ts").unwrap().extension(), ".ts");
    }

    #[test]
    fn test_parent_and_relative_to() {
        let file = GlobalPath::new("/repo/packages/shared/src/index.ts").unwrap();
        let pkg = GlobalPath::new("/repo/packages/shared").unwrap();
        assert_eq!(file.parent().unwrap().as_str(), "/repo/packages/shared/src");
        assert_eq!(file.relative_to(&pkg).unwrap().as_str(), "src/index.ts");
        assert!(pkg.relative_to(&file).is_none());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let p = GlobalPath::new("/repo/a.ts").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"/repo/a.ts\"");
    }
}

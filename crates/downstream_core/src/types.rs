use std::sync::OnceLock;

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::path::{GlobalPath, LibraryPath};

/// How an import edge was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    /// Relative specifier (`./util`)
    Local,
    /// Workspace package (`@scope/shared/lib`)
    Library,
}

/// Syntactic form of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import ... from`, `require(...)`
    Static,
    /// `import(...)`
    Dynamic,
    /// `export ... from`
    ReExport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBinding {
    pub specifier: String,
    pub alias: Option<String>,
}

impl NamedBinding {
    /// The local name the binding introduces.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.specifier)
    }
}

/// One import statement as written in a source file, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    pub request: String,
    pub kind: ImportKind,
    pub default_alias: Option<String>,
    pub namespace_alias: Option<String>,
    pub named: Vec<NamedBinding>,
}

impl RawImport {
    pub fn bare(request: impl Into<String>, kind: ImportKind) -> Self {
        Self {
            request: request.into(),
            kind,
            default_alias: None,
            namespace_alias: None,
            named: Vec::new(),
        }
    }
}

/// A resolved import edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDefinition {
    pub path: GlobalPath,
    #[serde(rename = "type")]
    pub import_type: ImportType,
    pub request: String,
    pub kind: ImportKind,
    pub specifiers: Vec<String>,
    pub default_alias: Option<String>,
    pub namespace_alias: Option<String>,
}

impl ImportDefinition {
    pub fn new(path: GlobalPath, import_type: ImportType, raw: &RawImport) -> Self {
        Self {
            path,
            import_type,
            request: raw.request.clone(),
            kind: raw.kind,
            specifiers: raw.named.iter().map(|b| b.bound_name().to_string()).collect(),
            default_alias: raw.default_alias.clone(),
            namespace_alias: raw.namespace_alias.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Registered in the cache, imports not known yet
    Pending,
    /// Imports finalized
    Resolved,
}

/// The cached record for one source file.
///
/// A record is registered as [`ModuleState::Pending`] before its imports are
/// resolved and finalized exactly once. While pending, [`imports`](Self::imports)
/// is empty and means "unknown", not "no imports".
#[derive(Debug)]
pub struct ModuleDefinition {
    path: GlobalPath,
    name: Option<LibraryPath>,
    contents: String,
    extension: String,
    imports: OnceLock<Vec<ImportDefinition>>,
}

impl ModuleDefinition {
    pub fn pending(path: GlobalPath, name: Option<LibraryPath>, contents: String) -> Self {
        let extension = path.extension();
        Self { path, name, contents, extension, imports: OnceLock::new() }
    }

    pub fn resolved(
        path: GlobalPath,
        name: Option<LibraryPath>,
        contents: String,
        imports: Vec<ImportDefinition>,
    ) -> Self {
        let module = Self::pending(path, name, contents);
        module.finalize(imports);
        module
    }

    pub fn path(&self) -> &GlobalPath {
        &self.path
    }

    /// Package-qualified name, `None` when no named `package.json` encloses the file.
    pub fn name(&self) -> Option<&LibraryPath> {
        self.name.as_ref()
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn imports(&self) -> &[ImportDefinition] {
        self.imports.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn state(&self) -> ModuleState {
        if self.imports.get().is_some() { ModuleState::Resolved } else { ModuleState::Pending }
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == ModuleState::Resolved
    }

    /// Sets the imports of a pending record. Returns `false` if it was already resolved.
    pub(crate) fn finalize(&self, imports: Vec<ImportDefinition>) -> bool {
        self.imports.set(imports).is_ok()
    }
}

impl Serialize for ModuleDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ModuleDefinition", 5)?;
        s.serialize_field("path", &self.path)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("extension", &self.extension)?;
        s.serialize_field("state", &self.state())?;
        s.serialize_field("imports", self.imports())?;
        s.end()
    }
}

use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::path::Path;

use crate::types::{ImportKind, NamedBinding, RawImport};

/// Extracts every import-like statement from `src`, in source order.
///
/// Covers import declarations (including side-effect and type-only imports),
/// `export ... from` re-exports, TypeScript `import x = require()`, and top-level
/// `require()` and `import()` with string literal arguments. Syntax errors are
/// tolerated: whatever the parser recovered is used.
pub fn parse_imports(file: &Path, src: &str) -> Vec<RawImport> {
    trace!("Parsing file for imports: {}", file.display());
    let st = source_type_for(file);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, .. } = OxcParser::new(&allocator, src, st).parse();
    if !errors.is_empty() {
        debug!("{} syntax errors in {}, using recovered AST", errors.len(), file.display());
    }

    let mut imports: Vec<RawImport> = Vec::new();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let mut raw = RawImport::bare(decl.source.value.to_string(), ImportKind::Static);
                if let Some(specifiers) = &decl.specifiers {
                    for spec in specifiers {
                        match spec {
                            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                raw.named.push(binding(s.imported.name().as_str(), s.local.name.as_str()));
                            }
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                raw.default_alias = Some(s.local.name.to_string());
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                                raw.namespace_alias = Some(s.local.name.to_string());
                            }
                        }
                    }
                }
                trace!("Found import: '{}' in {}", raw.request, file.display());
                imports.push(raw);
            }
            Statement::ExportNamedDeclaration(decl) => {
                // export { a, b as c } from './x'
                if let Some(source) = &decl.source {
                    let mut raw = RawImport::bare(source.value.to_string(), ImportKind::ReExport);
                    for spec in &decl.specifiers {
                        let (local, exported) = (spec.local.name(), spec.exported.name());
                        raw.named.push(binding(local.as_str(), exported.as_str()));
                    }
                    trace!("Found re-export: '{}' in {}", raw.request, file.display());
                    imports.push(raw);
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                // export * from './x', export * as ns from './x'
                let mut raw = RawImport::bare(decl.source.value.to_string(), ImportKind::ReExport);
                raw.namespace_alias = decl.exported.as_ref().map(|e| e.name().to_string());
                trace!("Found re-export: '{}' in {}", raw.request, file.display());
                imports.push(raw);
            }
            Statement::TSImportEqualsDeclaration(decl) => {
                // import x = require('./x')
                if let TSModuleReference::ExternalModuleReference(ext) = &decl.module_reference {
                    let mut raw =
                        RawImport::bare(ext.expression.value.to_string(), ImportKind::Static);
                    raw.default_alias = Some(decl.id.name.to_string());
                    trace!("Found import-equals: '{}' in {}", raw.request, file.display());
                    imports.push(raw);
                }
            }
            Statement::ExpressionStatement(es) => {
                extract_require_from_expression(&es.expression, &mut imports);
            }
            Statement::VariableDeclaration(vd) => {
                // const x = require('...') or const x = someFunc(require('...'))
                for decl in &vd.declarations {
                    if let Some(init) = &decl.init {
                        extract_require_from_expression(init, &mut imports);
                    }
                }
            }
            _ => {}
        }
    }

    debug!("Found {} imports in {}", imports.len(), file.display());
    imports
}

fn binding(imported: &str, local: &str) -> NamedBinding {
    NamedBinding {
        specifier: imported.to_string(),
        alias: (imported != local).then(|| local.to_string()),
    }
}

fn extract_require_from_expression(expr: &Expression, imports: &mut Vec<RawImport>) {
    match expr {
        Expression::CallExpression(ce) => {
            if let Expression::Identifier(callee_ident) = &ce.callee
                && callee_ident.name.as_str() == "require"
                && !ce.arguments.is_empty()
                && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
            {
                trace!("Found require() call: '{}'", sl.value);
                imports.push(RawImport::bare(sl.value.to_string(), ImportKind::Static));
            }
            for arg in &ce.arguments {
                if let Some(arg_expr) = arg.as_expression() {
                    extract_require_from_expression(arg_expr, imports);
                }
            }
            extract_require_from_expression(&ce.callee, imports);
        }
        Expression::ImportExpression(ie) => {
            if let Expression::StringLiteral(sl) = &ie.source {
                trace!("Found dynamic import(): '{}'", sl.value);
                imports.push(RawImport::bare(sl.value.to_string(), ImportKind::Dynamic));
            }
        }
        Expression::AwaitExpression(ae) => {
            extract_require_from_expression(&ae.argument, imports);
        }
        Expression::StaticMemberExpression(me) => {
            // require('./x').named
            extract_require_from_expression(&me.object, imports);
        }
        Expression::ArrayExpression(ae) => {
            for elem in &ae.elements {
                if let Some(expr) = elem.as_expression() {
                    extract_require_from_expression(expr, imports);
                }
            }
        }
        Expression::ObjectExpression(oe) => {
            for prop in &oe.properties {
                if let Some(expr) = prop.as_property() {
                    extract_require_from_expression(&expr.value, imports);
                }
            }
        }
        Expression::ConditionalExpression(ce) => {
            extract_require_from_expression(&ce.test, imports);
            extract_require_from_expression(&ce.consequent, imports);
            extract_require_from_expression(&ce.alternate, imports);
        }
        Expression::AssignmentExpression(ae) => {
            extract_require_from_expression(&ae.right, imports);
        }
        Expression::ParenthesizedExpression(pe) => {
            extract_require_from_expression(&pe.expression, imports);
        }
        _ => {}
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    if matches!(ext, Some("mjs") | Some("mts")) {
        st = st.with_module(true);
    }

    st
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, src: &str) -> Vec<RawImport> {
        parse_imports(Path::new(name), src)
    }

    #[test]
    fn test_default_named_and_namespace_bindings() {
        let imports = parse(
            "test.ts",
            "import React, { useState, useEffect as effect } from 'react';\nimport * as utils from './utils';",
        );
        assert_eq!(imports.len(), 2);

        assert_eq!(imports[0].request, "react");
        assert_eq!(imports[0].default_alias.as_deref(), Some("React"));
        assert_eq!(imports[0].named.len(), 2);
        assert_eq!(imports[0].named[0].bound_name(), "useState");
        assert_eq!(imports[0].named[1].specifier, "useEffect");
        assert_eq!(imports[0].named[1].bound_name(), "effect");

        assert_eq!(imports[1].request, "./utils");
        assert_eq!(imports[1].namespace_alias.as_deref(), Some("utils"));
        assert!(matches!(imports[1].kind, ImportKind::Static));
    }

    #[test]
    fn test_side_effect_import() {
        let imports = parse("test.js", "import './polyfills';");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].request, "./polyfills");
        assert!(imports[0].named.is_empty());
        assert!(imports[0].default_alias.is_none());
    }

    #[test]
    fn test_type_only_import_is_kept() {
        let imports = parse("test.ts", "import type { Foo } from './types';");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].request, "./types");
        assert_eq!(imports[0].named[0].bound_name(), "Foo");
    }

    #[test]
    fn test_source_order_preserved() {
        let imports = parse("test.ts", "import './b';\nimport { x } from './a';\nimport c from './c';");
        let requests: Vec<&str> = imports.iter().map(|i| i.request.as_str()).collect();
        assert_eq!(requests, vec!["./b", "./a", "./c"]);
    }

    #[test]
    fn test_re_exports() {
        let imports = parse(
            "index.ts",
            "export { a, b as c } from './ab';\nexport * from './all';\nexport * as ns from './ns';\nexport const local = 1;",
        );
        assert_eq!(imports.len(), 3);
        assert!(imports.iter().all(|i| matches!(i.kind, ImportKind::ReExport)));
        assert_eq!(imports[0].named[1].specifier, "b");
        assert_eq!(imports[0].named[1].bound_name(), "c");
        assert_eq!(imports[1].request, "./all");
        assert_eq!(imports[2].namespace_alias.as_deref(), Some("ns"));
    }

    #[test]
    fn test_require_and_dynamic_import() {
        let imports = parse(
            "test.js",
            "const fs = require('fs');\nconst cfg = load(require('./config'));\nimport('./lazy');",
        );
        let requests: Vec<&str> = imports.iter().map(|i| i.request.as_str()).collect();
        assert_eq!(requests, vec!["fs", "./config", "./lazy"]);
        assert!(matches!(imports[2].kind, ImportKind::Dynamic));
    }

    #[test]
    fn test_import_equals_require() {
        let imports = parse(
            "legacy.ts",
            "import fs = require('fs');\nimport Ns = Other.Inner;\nimport util = require('./util');",
        );
        let requests: Vec<&str> = imports.iter().map(|i| i.request.as_str()).collect();
        assert_eq!(requests, vec!["fs", "./util"]);
        assert_eq!(imports[1].default_alias.as_deref(), Some("util"));
        assert!(matches!(imports[1].kind, ImportKind::Static));
    }

    #[test]
    fn test_require_in_conditional_and_object() {
        let imports = parse(
            "test.js",
            "const mod = cond ? require('./a') : require('./b');\nconst o = { db: require('./db') };",
        );
        assert_eq!(imports.len(), 3);
    }

    #[test]
    fn test_awaited_dynamic_import() {
        let imports = parse("test.ts", "const m = await import('./heavy');");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].request, "./heavy");
    }

    #[test]
    fn test_malformed_source_does_not_panic() {
        let imports = parse("broken.ts", "import { a } from './a';\nconst = ;");
        assert!(imports.len() <= 1);
    }

    #[test]
    fn test_jsx_file() {
        let imports = parse("App.jsx", "import React from 'react';\nexport const App = () => <div />;");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].request, "react");
    }

    #[test]
    fn test_no_imports() {
        assert!(parse("test.js", "const x = 42;").is_empty());
    }
}

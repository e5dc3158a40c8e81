//! Constants for file extensions and resolution strategies.
//!
//! ## Supported Extensions
//!
//! - **Parsing / entry collection**: every JS/TS flavour in [`JS_TS_EXTENSIONS`]
//! - **Import inference**: only [`RESOLVE_EXTENSIONS`], tried in declaration order

/// File extensions for JavaScript/TypeScript files that can be parsed
pub const JS_TS_EXTENSIONS: &[&str] = &[
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "js",  // JavaScript
    "jsx", // JavaScript with JSX
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
];

/// Extensions appended, in priority order, to an import that omits one
pub const RESOLVE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// File stem of a directory's barrel file (`index.ts`, `index.js`, ...)
pub const BARREL_STEM: &str = "index";

pub const PACKAGE_JSON: &str = "package.json";

/// Parsed-module count after which a traversal logs a runaway warning
pub const DEFAULT_WARN_THRESHOLD: usize = 10_000;

/// Parsed-module count after which a traversal is aborted
pub const DEFAULT_FAIL_THRESHOLD: usize = 1_000_000;

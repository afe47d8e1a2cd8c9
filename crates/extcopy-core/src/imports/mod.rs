//! Import discovery for JavaScript/TypeScript files.
//!
//! A lightweight scanner that finds import and require specifiers without
//! parsing.

mod scan;

pub use scan::{scan_imports, ImportKind, ImportSpec};

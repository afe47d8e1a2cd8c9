//! Module resolver for the dependency walk.
//!
//! Resolves relative, absolute and bare specifiers against a base directory,
//! reporting every `package.json` it reads through a [`PackageJsonHook`].

mod builtins;
mod node;
mod pkg_json_cache;

pub use builtins::{is_builtin, NODE_BUILTINS};
pub use node::{
    NoHook, PackageJsonHook, ResolveReasonCode, ResolveRequest, ResolveResult,
    ResolveStatus, Resolver, ResolverConfig, DEFAULT_EXTENSIONS,
};
pub(crate) use node::parse_bare_specifier;
pub use pkg_json_cache::{
    CachedPkgJson, MemoryPkgJsonCache, NoPkgJsonCache, PkgJsonCache, PkgJsonStamp,
};

//! Node-style module resolution.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`
//! - Absolute filesystem specifiers
//! - Bare specifiers with `node_modules` lookup (scoped names included)
//! - Extension probing
//! - Directory resolution (the package's own `package.json`, else `index.*`)
//! - A read hook that sees every `package.json` consulted
//!
//! All filesystem access goes through `tokio::fs`, so a resolution suspends
//! on each stat/read instead of blocking sibling resolutions.

use super::pkg_json_cache::{NoPkgJsonCache, PkgJsonCache};
use crate::error::Error;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Default extensions for probing (Node's CommonJS order plus ESM variants).
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".json", ".node", ".mjs", ".cjs"];

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 20;

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Extensions to probe (in order).
    pub extensions: &'static [&'static str],
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS,
        }
    }
}

/// "Resolve this specifier as if imported from this directory."
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub specifier: &'a str,
    pub base_dir: &'a Path,
}

impl<'a> ResolveRequest<'a> {
    #[must_use]
    pub fn new(specifier: &'a str, base_dir: &'a Path) -> Self {
        Self {
            specifier,
            base_dir,
        }
    }
}

/// Called with every `package.json` the resolver reads, before it is used.
///
/// The hook may modify the parsed value; the cached copy stays untouched.
pub trait PackageJsonHook: Send + Sync {
    fn on_package_json(&self, path: &Path, pkg: &mut Value);
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl PackageJsonHook for NoHook {
    fn on_package_json(&self, _path: &Path, _pkg: &mut Value) {}
}

/// Resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Resolved,
    Unresolved,
}

/// Reason codes for unresolved specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReasonCode {
    SpecifierInvalid,
    UnsupportedScheme,
    NotFound,
    NodeModulesNotFound,
}

impl ResolveReasonCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecifierInvalid => "SPECIFIER_INVALID",
            Self::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            Self::NotFound => "NOT_FOUND",
            Self::NodeModulesNotFound => "NODE_MODULES_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ResolveReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution result.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    /// Resolved absolute, canonical path (if successful).
    pub resolved: Option<PathBuf>,
    /// The `package.json` whose package supplied the entry, if any.
    pub package_json: Option<PathBuf>,
    /// Status.
    pub status: ResolveStatus,
    /// Reason code if unresolved.
    pub reason: Option<ResolveReasonCode>,
    /// Candidate paths tried (capped).
    pub tried: Vec<PathBuf>,
}

impl ResolveResult {
    fn resolved(path: PathBuf, package_json: Option<PathBuf>, tried: Vec<PathBuf>) -> Self {
        Self {
            resolved: Some(path),
            package_json,
            status: ResolveStatus::Resolved,
            reason: None,
            tried,
        }
    }

    fn unresolved(reason: ResolveReasonCode, tried: Vec<PathBuf>) -> Self {
        Self {
            resolved: None,
            package_json: None,
            status: ResolveStatus::Unresolved,
            reason: Some(reason),
            tried,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }
}

/// Module resolver.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
    pkg_json_cache: Arc<dyn PkgJsonCache>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            pkg_json_cache: Arc::new(NoPkgJsonCache),
        }
    }

    /// Use a shared package.json cache.
    #[must_use]
    pub fn with_pkg_json_cache(mut self, cache: Arc<dyn PkgJsonCache>) -> Self {
        self.pkg_json_cache = cache;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a specifier from a base directory.
    ///
    /// "Not found" outcomes come back as an unresolved [`ResolveResult`].
    ///
    /// # Errors
    /// Returns an error when a `package.json` on the resolution path cannot be
    /// read or is not valid JSON.
    pub async fn resolve(
        &self,
        request: &ResolveRequest<'_>,
        hook: &dyn PackageJsonHook,
    ) -> Result<ResolveResult, Error> {
        let spec = request.specifier;
        let mut tried = Vec::new();

        if spec.is_empty() {
            return Ok(ResolveResult::unresolved(
                ResolveReasonCode::SpecifierInvalid,
                tried,
            ));
        }

        if spec.contains("://") || spec.starts_with("node:") || spec.starts_with("data:") {
            return Ok(ResolveResult::unresolved(
                ResolveReasonCode::UnsupportedScheme,
                tried,
            ));
        }

        if spec.starts_with("./") || spec.starts_with("../") || spec == "." || spec == ".." {
            let base = request.base_dir.join(spec);
            return self.resolve_path(&base, hook, &mut tried).await;
        }

        if Path::new(spec).is_absolute() {
            return self.resolve_path(Path::new(spec), hook, &mut tried).await;
        }

        self.resolve_bare(request, hook, &mut tried).await
    }

    /// Resolve a path (exact file, extension probing, then directory).
    async fn resolve_path(
        &self,
        base: &Path,
        hook: &dyn PackageJsonHook,
        tried: &mut Vec<PathBuf>,
    ) -> Result<ResolveResult, Error> {
        if let Some(found) = self.probe_file(base, tried).await {
            return Ok(ResolveResult::resolved(found, None, tried.clone()));
        }

        if is_dir(base).await {
            return self.resolve_directory(base, hook, tried).await;
        }

        Ok(ResolveResult::unresolved(
            ResolveReasonCode::NotFound,
            tried.clone(),
        ))
    }

    /// Resolve a directory to its `package.json`, or to `index.*` when it has
    /// none. A package directory always resolves to its description file, so
    /// the entry's parent is the package root.
    async fn resolve_directory(
        &self,
        dir: &Path,
        hook: &dyn PackageJsonHook,
        tried: &mut Vec<PathBuf>,
    ) -> Result<ResolveResult, Error> {
        let pkg_json_path = dir.join("package.json");

        if is_file(&pkg_json_path).await {
            add_tried(tried, &pkg_json_path);

            let mut pkg_json = self.read_package_json(&pkg_json_path).await?;
            hook.on_package_json(&pkg_json_path, &mut pkg_json);

            let canonical = canonical(&pkg_json_path).await;
            return Ok(ResolveResult::resolved(
                canonical,
                Some(pkg_json_path),
                tried.clone(),
            ));
        }

        if let Some(found) = self.probe_index(dir, tried).await {
            return Ok(ResolveResult::resolved(found, None, tried.clone()));
        }

        Ok(ResolveResult::unresolved(
            ResolveReasonCode::NotFound,
            tried.clone(),
        ))
    }

    /// Resolve a bare specifier via `node_modules`, walking up from the base dir.
    async fn resolve_bare(
        &self,
        request: &ResolveRequest<'_>,
        hook: &dyn PackageJsonHook,
        tried: &mut Vec<PathBuf>,
    ) -> Result<ResolveResult, Error> {
        // e.g., "lodash/fp" -> "lodash", "@scope/pkg/sub" -> "@scope/pkg"
        let (pkg_name, subpath) = parse_bare_specifier(request.specifier);

        let mut found_node_modules = false;
        let mut current = Some(request.base_dir);

        while let Some(dir) = current {
            current = dir.parent();

            // `<x>/node_modules/node_modules` is never a lookup location
            if dir.file_name().is_some_and(|n| n == "node_modules") {
                continue;
            }

            let node_modules = dir.join("node_modules");
            if !is_dir(&node_modules).await {
                continue;
            }
            found_node_modules = true;

            let pkg_dir = node_modules.join(pkg_name);
            add_tried(tried, &pkg_dir);
            trace!(dir = %pkg_dir.display(), "probing package directory");

            if !is_dir(&pkg_dir).await {
                continue;
            }

            let target = match subpath {
                Some(sub) => pkg_dir.join(sub),
                None => pkg_dir,
            };
            let result = self.resolve_path(&target, hook, tried).await?;
            if result.is_resolved() {
                return Ok(result);
            }
        }

        let reason = if found_node_modules {
            ResolveReasonCode::NotFound
        } else {
            ResolveReasonCode::NodeModulesNotFound
        };
        Ok(ResolveResult::unresolved(reason, tried.clone()))
    }

    /// Try `path` exactly, then with each configured extension appended.
    async fn probe_file(&self, path: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        add_tried(tried, path);
        if is_file(path).await {
            return Some(canonical(path).await);
        }

        for ext in self.config.extensions {
            let with_ext = append_extension(path, ext);
            add_tried(tried, &with_ext);
            if is_file(&with_ext).await {
                return Some(canonical(&with_ext).await);
            }
        }

        None
    }

    async fn probe_index(&self, dir: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        for ext in self.config.extensions {
            let index = dir.join(format!("index{ext}"));
            add_tried(tried, &index);
            if is_file(&index).await {
                return Some(canonical(&index).await);
            }
        }
        None
    }

    /// Read and parse package.json, using the cache if it holds a fresh copy.
    async fn read_package_json(&self, path: &Path) -> Result<Value, Error> {
        if let Some(value) = self.pkg_json_cache.get(path) {
            return Ok(value);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::PackageJsonRead {
                path: path.to_path_buf(),
                source,
            })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|source| Error::PackageJsonParse {
                path: path.to_path_buf(),
                source,
            })?;

        self.pkg_json_cache.set(path, value.clone());
        Ok(value)
    }
}

/// Parse a bare specifier into package name and optional subpath.
pub(crate) fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    let split_at = if spec.starts_with('@') {
        // Scoped package: the name spans up to the second slash
        spec.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        spec.find('/')
    };

    match split_at {
        Some(i) => (&spec[..i], Some(&spec[i + 1..])),
        None => (spec, None),
    }
}

/// `foo.min` + `.js` -> `foo.min.js` (unlike `with_extension`).
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(ext);
    PathBuf::from(s)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn canonical(path: &Path) -> PathBuf {
    match tokio::fs::canonicalize(path).await {
        Ok(p) => dunce::simplified(&p).to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// Add a path to tried list (with cap).
fn add_tried(tried: &mut Vec<PathBuf>, path: &Path) {
    if tried.len() < MAX_TRIED_PATHS {
        tried.push(path.to_path_buf());
    }
}

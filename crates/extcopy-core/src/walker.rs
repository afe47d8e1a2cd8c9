//! Resolution walker.
//!
//! Resolves an external module and, transitively, its declared runtime
//! dependencies, copying each package root into the output exactly once per
//! walk.
//!
//! A walk is a tree of futures joined on the caller's task. Sibling
//! dependencies are resolved concurrently; the only shared state is the
//! [`WalkSession`], which is owned by one walk and never reused.

use crate::copier::{CopyMapping, DependencyCopier};
use crate::error::Error;
use crate::resolver::{
    is_builtin, parse_bare_specifier, PackageJsonHook, ResolveReasonCode, ResolveRequest, Resolver,
};
use extcopy_util::CopyStats;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Module names already handled in one walk.
#[derive(Debug, Default)]
pub struct SeenSet {
    names: Mutex<HashSet<String>>,
}

impl SeenSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.names.lock().await.contains(name)
    }

    /// Insert `name`, returning `false` if it was already present.
    pub async fn claim(&self, name: &str) -> bool {
        self.names.lock().await.insert(name.to_string())
    }

    pub async fn len(&self) -> usize {
        self.names.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.names.lock().await.is_empty()
    }

    /// Claimed names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.lock().await.iter().cloned().collect();
        names.sort();
        names
    }
}

/// A package the walk copied (or would have, in dry-run mode).
#[derive(Debug, Clone)]
pub struct CopiedPackage {
    pub mapping: CopyMapping,
    pub stats: CopyStats,
}

/// A branch of the walk that failed.
#[derive(Debug)]
pub struct WalkFailure {
    /// Module name the branch was resolving.
    pub name: String,
    pub error: Error,
}

/// Outcome of one walk.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Packages copied, in completion order.
    pub copied: Vec<CopiedPackage>,
    /// Names skipped because they resolved inside their base directory.
    pub skipped_local: Vec<String>,
    pub failures: Vec<WalkFailure>,
}

impl WalkReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of copied packages, sorted.
    #[must_use]
    pub fn copied_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.copied.iter().map(|c| c.mapping.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// State of one walk: the seen set plus the report being collected.
#[derive(Debug, Default)]
pub struct WalkSession {
    seen: SeenSet,
    report: Mutex<WalkReport>,
}

impl WalkSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    #[must_use]
    pub fn into_report(self) -> WalkReport {
        self.report.into_inner()
    }

    async fn record_copy(&self, mapping: CopyMapping, stats: CopyStats) {
        self.report
            .lock()
            .await
            .copied
            .push(CopiedPackage { mapping, stats });
    }

    async fn record_local(&self, name: &str) {
        self.report.lock().await.skipped_local.push(name.to_string());
    }

    async fn record_failure(&self, name: &str, error: Error) {
        warn!(module = name, code = error.code(), "{error}");
        self.report.lock().await.failures.push(WalkFailure {
            name: name.to_string(),
            error,
        });
    }
}

/// Collects the `dependencies` names of every `package.json` read during one
/// resolution.
#[derive(Debug, Default)]
struct DependencyCollector {
    packages: StdMutex<Vec<(PathBuf, Vec<String>)>>,
}

impl DependencyCollector {
    fn take(&self, pkg_json: &Path) -> Vec<String> {
        let Ok(mut packages) = self.packages.lock() else {
            return Vec::new();
        };
        packages
            .iter()
            .position(|(path, _)| path == pkg_json)
            .map(|i| packages.swap_remove(i).1)
            .unwrap_or_default()
    }
}

impl PackageJsonHook for DependencyCollector {
    fn on_package_json(&self, path: &Path, pkg: &mut Value) {
        let deps: Vec<String> = pkg
            .get("dependencies")
            .and_then(Value::as_object)
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default();

        if let Ok(mut packages) = self.packages.lock() {
            packages.push((path.to_path_buf(), deps));
        }
    }
}

/// Whether a `dependencies` key names a package rather than a path.
fn is_package_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains('\\') {
        return false;
    }
    if name.starts_with('@') && !name.contains('/') {
        return false;
    }
    let (pkg, subpath) = parse_bare_specifier(name);
    subpath.is_none() && !pkg.is_empty() && !Path::new(pkg).is_absolute()
}

/// Recursive resolve-and-copy over a module's dependency graph.
#[derive(Debug, Clone)]
pub struct Walker {
    resolver: Resolver,
    copier: DependencyCopier,
}

impl Walker {
    /// Package directories resolve to their own `package.json`, so every
    /// resolved package root is the parent of the resolved path.
    #[must_use]
    pub fn new(resolver: Resolver, copier: DependencyCopier) -> Self {
        Self { resolver, copier }
    }

    #[must_use]
    pub fn copier(&self) -> &DependencyCopier {
        &self.copier
    }

    /// Run a fresh walk for `name` from `base_dir`.
    pub async fn walk(&self, name: &str, base_dir: &Path) -> WalkReport {
        let session = WalkSession::new();
        self.resolve_recursively(name, base_dir, &session).await;
        session.into_report()
    }

    /// Resolve `name` from `base_dir`, copy its package root and recurse into
    /// its dependencies.
    ///
    /// Returns the resolved path, or `None` when the node was skipped
    /// (runtime built-in, already seen, unresolvable, or local to `base_dir`). Failures are
    /// recorded in `session` and never propagate to the parent.
    pub fn resolve_recursively<'a>(
        &'a self,
        name: &'a str,
        base_dir: &'a Path,
        session: &'a WalkSession,
    ) -> BoxFuture<'a, Option<PathBuf>> {
        async move {
            if is_builtin(name) {
                debug!(module = name, "runtime built-in, not a filesystem package");
                return None;
            }

            if session.seen.contains(name).await {
                debug!(module = name, "already handled in this walk");
                return None;
            }

            let collector = DependencyCollector::default();
            let request = ResolveRequest::new(name, base_dir);
            let result = match self.resolver.resolve(&request, &collector).await {
                Ok(result) => result,
                Err(e) => {
                    session.record_failure(name, e).await;
                    return None;
                }
            };

            let Some(resolved) = result.resolved else {
                let error = Error::Resolve {
                    specifier: name.to_string(),
                    base_dir: base_dir.to_path_buf(),
                    reason: result.reason.unwrap_or(ResolveReasonCode::NotFound),
                };
                session.record_failure(name, error).await;
                return None;
            };

            let base = canonical_dir(base_dir).await;
            if resolved.starts_with(&base) {
                debug!(
                    module = name,
                    resolved = %resolved.display(),
                    base = %base.display(),
                    "resolved inside base directory, not copying"
                );
                session.record_local(name).await;
                return None;
            }

            if !session.seen.claim(name).await {
                debug!(module = name, "claimed by a sibling branch");
                return None;
            }

            let root = resolved
                .parent()
                .map_or_else(|| resolved.clone(), Path::to_path_buf);
            let deps = result
                .package_json
                .as_deref()
                .map(|pkg_json| collector.take(pkg_json))
                .unwrap_or_default();

            debug!(
                module = name,
                root = %root.display(),
                dependencies = deps.len(),
                "resolved"
            );

            let mapping = self.copier.mapping(name, &root);
            let copy = async {
                match self.copier.copy(&mapping).await {
                    Ok(stats) => {
                        info!(
                            module = name,
                            to = %mapping.to.display(),
                            files = stats.files,
                            "copied"
                        );
                        session.record_copy(mapping.clone(), stats).await;
                    }
                    Err(e) => session.record_failure(name, e).await,
                }
            };

            let declared_in = result.package_json.clone().unwrap_or_else(|| root.clone());
            let children = join_all(deps.iter().map(|dep| {
                let root = &root;
                let declared_in = &declared_in;
                async move {
                    if is_package_name(dep) {
                        self.resolve_recursively(dep, root, session).await;
                    } else {
                        let error = Error::DependencyNameInvalid {
                            name: dep.clone(),
                            declared_in: declared_in.clone(),
                        };
                        session.record_failure(dep, error).await;
                    }
                }
            }));

            futures::join!(copy, children);

            Some(resolved)
        }
        .boxed()
    }
}

/// Canonical form of a base directory, or the path itself if it cannot be
/// canonicalized.
async fn canonical_dir(path: &Path) -> PathBuf {
    match tokio::fs::canonicalize(path).await {
        Ok(p) => dunce::simplified(&p).to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

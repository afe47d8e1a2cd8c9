//! Dependency copier.
//!
//! Materializes a resolved package root under `<outdir>/node_modules/<name>`.

use crate::error::Error;
use extcopy_util::{copy_tree, CopyOptions, CopyStats};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One package root to copy and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyMapping {
    /// Module name exactly as it was resolved.
    pub name: String,
    /// Package root directory.
    pub from: PathBuf,
    /// `<node_modules_dir>/<name>`.
    pub to: PathBuf,
}

/// Copies package roots into an output-local `node_modules` directory.
#[derive(Debug, Clone)]
pub struct DependencyCopier {
    node_modules_dir: PathBuf,
    options: CopyOptions,
    dry_run: bool,
}

impl DependencyCopier {
    #[must_use]
    pub fn new(node_modules_dir: impl Into<PathBuf>, options: CopyOptions) -> Self {
        Self {
            node_modules_dir: node_modules_dir.into(),
            options,
            dry_run: false,
        }
    }

    /// Record mappings without writing anything.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn node_modules_dir(&self) -> &Path {
        &self.node_modules_dir
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Mapping for `name` rooted at `from`.
    ///
    /// The name is joined verbatim, so `@scope/pkg` becomes two segments.
    #[must_use]
    pub fn mapping(&self, name: &str, from: &Path) -> CopyMapping {
        CopyMapping {
            name: name.to_string(),
            from: from.to_path_buf(),
            to: self.node_modules_dir.join(name),
        }
    }

    /// Copy one package root.
    ///
    /// The tree walk runs on the blocking pool so sibling resolutions keep
    /// making progress.
    ///
    /// # Errors
    /// Returns [`Error::Copy`] if the source is missing or any write fails.
    pub async fn copy(&self, mapping: &CopyMapping) -> Result<CopyStats, Error> {
        if self.dry_run {
            debug!(name = %mapping.name, to = %mapping.to.display(), "dry run, skipping copy");
            return Ok(CopyStats::default());
        }

        let from = mapping.from.clone();
        let to = mapping.to.clone();
        let options = self.options;

        let result = tokio::task::spawn_blocking(move || copy_tree(&from, &to, &options))
            .await
            .map_err(|e| Error::other(format!("copy task for '{}' failed: {e}", mapping.name)))?;

        result.map_err(|source| Error::Copy {
            name: mapping.name.clone(),
            from: mapping.from.clone(),
            to: mapping.to.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_copy_package_root() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src/left-pad");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("package.json"), r#"{"name":"left-pad"}"#).unwrap();
        fs::write(src.join("lib/index.js"), "module.exports = 1").unwrap();

        let copier = DependencyCopier::new(dir.path().join("out/node_modules"), CopyOptions::default());
        let mapping = copier.mapping("left-pad", &src);
        let stats = copier.copy(&mapping).await.unwrap();

        assert_eq!(stats.files, 2);
        let dst = dir.path().join("out/node_modules/left-pad");
        assert_eq!(mapping.to, dst);
        assert_eq!(
            fs::read_to_string(dst.join("lib/index.js")).unwrap(),
            "module.exports = 1"
        );
    }

    #[test]
    fn test_scoped_name_is_two_segments() {
        let copier = DependencyCopier::new("/out/node_modules", CopyOptions::default());
        let mapping = copier.mapping("@scope/pkg", Path::new("/src/pkg"));

        assert_eq!(mapping.to, PathBuf::from("/out/node_modules/@scope/pkg"));
        assert_eq!(mapping.name, "@scope/pkg");
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("pkg");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.js"), "").unwrap();

        let copier = DependencyCopier::new(dir.path().join("out/node_modules"), CopyOptions::default())
            .with_dry_run(true);
        let stats = copier.copy(&copier.mapping("pkg", &src)).await.unwrap();

        assert_eq!(stats, CopyStats::default());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_copy_error() {
        let dir = tempdir().unwrap();
        let copier = DependencyCopier::new(dir.path().join("out"), CopyOptions::default());

        let err = copier
            .copy(&copier.mapping("ghost", &dir.path().join("nope")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Copy { ref name, .. } if name == "ghost"));
        assert_eq!(err.code(), "COPY_FAILED");
    }
}

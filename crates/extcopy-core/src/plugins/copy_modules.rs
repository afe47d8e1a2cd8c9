//! Copy external modules next to a server bundle.
//!
//! When a bundled Node build marks a module external, the bundle expects to
//! find it in a `node_modules` directory at runtime. This plugin intercepts
//! imports of the configured external names, copies each one (with its
//! runtime dependencies) into `<outdir>/node_modules`, and marks the import
//! external.

use crate::config::CopyConfig;
use crate::copier::DependencyCopier;
use crate::gate::{EligibilityContext, ExternalModules};
use crate::plugin::{
    HookResult, OnResolveArgs, OnResolveHandler, OnResolveOptions, OnResolveResult, Plugin,
    PluginBuild, PluginError,
};
use crate::resolver::{MemoryPkgJsonCache, Resolver};
use crate::walker::{WalkReport, Walker};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub const PLUGIN_NAME: &str = "copy-modules-on-bundle";

/// Walk outcome for one intercepted import.
#[derive(Debug)]
pub struct ImportReport {
    pub specifier: String,
    pub resolve_dir: PathBuf,
    pub report: WalkReport,
}

/// Shared sink the plugin's handler appends import reports to.
#[derive(Debug, Clone, Default)]
pub struct ReportLog {
    entries: Arc<Mutex<Vec<ImportReport>>>,
}

impl ReportLog {
    fn push(&self, entry: ImportReport) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    /// Drain every report collected so far.
    #[must_use]
    pub fn take(&self) -> Vec<ImportReport> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Plugin copying external modules into the bundle's output directory.
#[derive(Debug)]
pub struct CopyModulesPlugin {
    externals: ExternalModules,
    config: CopyConfig,
    log: ReportLog,
    pkg_json_cache: Arc<MemoryPkgJsonCache>,
}

impl CopyModulesPlugin {
    #[must_use]
    pub fn new(externals: ExternalModules, config: CopyConfig) -> Self {
        Self {
            externals,
            config,
            log: ReportLog::default(),
            pkg_json_cache: Arc::new(MemoryPkgJsonCache::new()),
        }
    }

    /// Handle to the reports of every import this plugin handles.
    #[must_use]
    pub fn report_log(&self) -> ReportLog {
        self.log.clone()
    }
}

impl Plugin for CopyModulesPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn setup(&self, build: &mut PluginBuild) -> HookResult<()> {
        let settings = build.initial_options();
        let Some(ctx) = EligibilityContext::from_settings(settings, &self.config.output_base)
        else {
            debug!(
                bundle = settings.bundle,
                platform = %settings.platform,
                "not a bundled server build, copy disabled"
            );
            return Ok(());
        };

        let filter = self
            .externals
            .filter()
            .map_err(|e| PluginError::new(PLUGIN_NAME, "setup", e.to_string()))?;
        let Some(filter) = filter else {
            debug!("no external modules configured");
            return Ok(());
        };

        let resolver = Resolver::default().with_pkg_json_cache(self.pkg_json_cache.clone());
        let copier = DependencyCopier::new(ctx.node_modules_dir(), self.config.copy_options)
            .with_dry_run(self.config.dry_run);

        debug!(
            out_dir = %ctx.out_dir().display(),
            externals = ?self.externals.names(),
            "copy enabled"
        );

        build.on_resolve(
            OnResolveOptions { filter },
            Arc::new(CopyOnResolve {
                walker: Walker::new(resolver, copier),
                log: self.log.clone(),
            }),
        );
        Ok(())
    }
}

struct CopyOnResolve {
    walker: Walker,
    log: ReportLog,
}

impl OnResolveHandler for CopyOnResolve {
    fn call<'a>(
        &'a self,
        args: &'a OnResolveArgs,
    ) -> BoxFuture<'a, HookResult<Option<OnResolveResult>>> {
        async move {
            let report = self.walker.walk(&args.path, &args.resolve_dir).await;

            info!(
                module = %args.path,
                copied = report.copied.len(),
                local = report.skipped_local.len(),
                failed = report.failures.len(),
                "external module handled"
            );

            self.log.push(ImportReport {
                specifier: args.path.clone(),
                resolve_dir: args.resolve_dir.clone(),
                report,
            });

            // External whether or not the copy worked
            Ok(Some(OnResolveResult::external(args.path.clone())))
        }
        .boxed()
    }
}

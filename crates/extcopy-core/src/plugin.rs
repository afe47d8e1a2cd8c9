//! Plugin host.
//!
//! An esbuild-shaped plugin interface: each plugin's `setup` runs once per
//! build, inspects the initial build options and registers `on_resolve`
//! rules. Imports are then offered to the first rule whose filter matches.
//!
//! ## Example
//!
//! ```ignore
//! use extcopy_core::plugin::{HookResult, Plugin, PluginBuild};
//!
//! struct Noop;
//!
//! impl Plugin for Noop {
//!     fn name(&self) -> &str { "noop" }
//!
//!     fn setup(&self, build: &mut PluginBuild) -> HookResult<()> {
//!         if !build.initial_options().bundle {
//!             return Ok(());
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::settings::BuildSettings;
use futures::future::BoxFuture;
use regex_lite::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// An import the bundler asks plugins about.
#[derive(Debug, Clone)]
pub struct OnResolveArgs {
    /// Import specifier as written.
    pub path: String,
    /// File containing the import.
    pub importer: Option<PathBuf>,
    /// Directory resolution starts from (usually the importer's directory).
    pub resolve_dir: PathBuf,
}

/// Answer of an `on_resolve` handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnResolveResult {
    pub path: String,
    /// Leave the import to the runtime instead of bundling it.
    pub external: bool,
}

impl OnResolveResult {
    /// Mark `path` external, unchanged.
    pub fn external(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            external: true,
        }
    }
}

/// Registration options for an `on_resolve` rule.
#[derive(Debug, Clone)]
pub struct OnResolveOptions {
    /// Matched against the import specifier.
    pub filter: Regex,
}

/// Handler of an `on_resolve` rule.
///
/// Returning `Ok(None)` passes the import on to the next matching rule.
pub trait OnResolveHandler: Send + Sync {
    fn call<'a>(&'a self, args: &'a OnResolveArgs)
        -> BoxFuture<'a, HookResult<Option<OnResolveResult>>>;
}

/// A build plugin.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Called once per build, before any import is resolved.
    fn setup(&self, build: &mut PluginBuild) -> HookResult<()>;
}

struct ResolveRule {
    plugin: String,
    filter: Regex,
    handler: Arc<dyn OnResolveHandler>,
}

/// Registration surface handed to [`Plugin::setup`].
pub struct PluginBuild {
    initial_options: BuildSettings,
    current_plugin: String,
    rules: Vec<ResolveRule>,
}

impl PluginBuild {
    fn new(initial_options: BuildSettings) -> Self {
        Self {
            initial_options,
            current_plugin: String::new(),
            rules: Vec::new(),
        }
    }

    /// Build settings as the user passed them.
    #[must_use]
    pub fn initial_options(&self) -> &BuildSettings {
        &self.initial_options
    }

    /// Register a handler for imports whose specifier matches `options.filter`.
    pub fn on_resolve(&mut self, options: OnResolveOptions, handler: Arc<dyn OnResolveHandler>) {
        trace!(
            plugin = %self.current_plugin,
            filter = options.filter.as_str(),
            "on_resolve registered"
        );
        self.rules.push(ResolveRule {
            plugin: self.current_plugin.clone(),
            filter: options.filter,
            handler,
        });
    }
}

/// Runs plugin setup and dispatches imports to registered rules.
pub struct PluginHost {
    settings: BuildSettings,
    plugins: Vec<Box<dyn Plugin>>,
    rules: Vec<ResolveRule>,
}

impl PluginHost {
    /// Run every plugin's `setup` once, in order.
    ///
    /// # Errors
    /// Returns the first setup error.
    pub fn new(settings: BuildSettings, plugins: Vec<Box<dyn Plugin>>) -> HookResult<Self> {
        let mut build = PluginBuild::new(settings.clone());
        for plugin in &plugins {
            build.current_plugin = plugin.name().to_string();
            plugin.setup(&mut build)?;
        }

        Ok(Self {
            settings,
            plugins,
            rules: build.rules,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Number of registered `on_resolve` rules.
    #[must_use]
    pub fn on_resolve_count(&self) -> usize {
        self.rules.len()
    }

    /// Offer an import to the matching rules in registration order.
    ///
    /// `Ok(None)` means no plugin claimed it and the import is bundled
    /// normally.
    ///
    /// # Errors
    /// Returns the first handler error.
    pub async fn resolve(&self, args: &OnResolveArgs) -> HookResult<Option<OnResolveResult>> {
        for rule in &self.rules {
            if !rule.filter.is_match(&args.path) {
                continue;
            }
            trace!(plugin = %rule.plugin, path = %args.path, "on_resolve");
            if let Some(result) = rule.handler.call(args).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("settings", &self.settings)
            .field("plugins", &self.plugin_names())
            .field("on_resolve", &self.rules.len())
            .finish()
    }
}

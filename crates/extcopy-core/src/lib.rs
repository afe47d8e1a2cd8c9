#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod copier;
pub mod error;
pub mod gate;
pub mod imports;
pub mod plugin;
pub mod plugins;
pub mod resolver;
pub mod settings;
pub mod version;
pub mod walker;

pub use config::{Config, CopyConfig};
pub use copier::{CopyMapping, DependencyCopier};
pub use error::Error;
pub use gate::{EligibilityContext, ExternalModules};
pub use imports::{scan_imports, ImportKind, ImportSpec};
pub use plugin::{
    HookResult, OnResolveArgs, OnResolveHandler, OnResolveOptions, OnResolveResult, Plugin,
    PluginBuild, PluginError, PluginHost,
};
pub use plugins::{CopyModulesPlugin, ImportReport, ReportLog};
pub use settings::{BuildSettings, Platform};
pub use version::{SCHEMA_VERSION, VERSION};
pub use walker::{WalkReport, WalkSession, Walker};

//! Built-in plugins.

mod copy_modules;

pub use copy_modules::{CopyModulesPlugin, ImportReport, ReportLog, PLUGIN_NAME};

use extcopy_util::CopyOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for the extcopy CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

/// Configuration of the copy-on-bundle plugin.
///
/// The output base is explicit: relative output directories from the build
/// settings are joined onto it, nothing is derived from process arguments.
#[derive(Debug, Clone)]
pub struct CopyConfig {
    /// Directory relative output locations are resolved against.
    pub output_base: PathBuf,
    /// Record copy mappings without touching the filesystem.
    pub dry_run: bool,
    /// Options for each package tree copy.
    pub copy_options: CopyOptions,
}

impl CopyConfig {
    #[must_use]
    pub fn new(output_base: impl Into<PathBuf>) -> Self {
        Self {
            output_base: output_base.into(),
            dry_run: false,
            copy_options: CopyOptions::default(),
        }
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

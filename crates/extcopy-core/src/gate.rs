//! Bundle-stage gate.
//!
//! Decides once per invocation whether external modules get copied at all,
//! and turns the configured external names into the import filter.

use crate::settings::{BuildSettings, Platform};
use regex_lite::Regex;
use std::path::{Path, PathBuf};

/// Settings that made an invocation eligible for copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityContext {
    out_dir: PathBuf,
    platform: Platform,
}

impl EligibilityContext {
    /// Inspect invocation settings.
    ///
    /// Returns `None` unless the build bundles, has a non-empty output file
    /// or directory, and targets a server platform. The effective output
    /// directory is the output file's parent, else the output directory;
    /// relative paths are taken against `output_base`.
    #[must_use]
    pub fn from_settings(settings: &BuildSettings, output_base: &Path) -> Option<Self> {
        if !settings.bundle || !settings.platform.is_server() {
            return None;
        }

        let outfile = settings.outfile.as_ref().filter(|p| !p.as_os_str().is_empty());
        let outdir = settings.outdir.as_ref().filter(|p| !p.as_os_str().is_empty());

        let dir = match (outfile, outdir) {
            (Some(outfile), _) => outfile.parent().map(Path::to_path_buf).unwrap_or_default(),
            (None, Some(outdir)) => outdir.clone(),
            (None, None) => return None,
        };

        Some(Self {
            out_dir: output_base.join(dir),
            platform: settings.platform,
        })
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// `<out_dir>/node_modules`.
    #[must_use]
    pub fn node_modules_dir(&self) -> PathBuf {
        self.out_dir.join("node_modules")
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }
}

/// Ordered list of module names treated as external.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalModules {
    names: Vec<String>,
}

impl ExternalModules {
    /// Empty names are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .filter(|n: &String| !n.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// One anchored alternation matching any configured name exactly.
    ///
    /// Returns `Ok(None)` when there is nothing to match.
    ///
    /// # Errors
    /// Returns an error if the pattern exceeds the regex size limit.
    pub fn filter(&self) -> Result<Option<Regex>, regex_lite::Error> {
        if self.names.is_empty() {
            return Ok(None);
        }

        let alternation = self
            .names
            .iter()
            .map(String::as_str)
            .map(regex_lite::escape)
            .collect::<Vec<_>>()
            .join("|");

        Regex::new(&format!("^(?:{alternation})$")).map(Some)
    }
}
